//! Endpoint asset operations under `/api/v2/assets`.
//!
//! Each operation builds its path, performs one typed JSON call through [`Client`], and returns
//! the client's error unchanged so the [`Error`] sentinels stay identifiable.

// self
use crate::{
	_prelude::*,
	client::{Client, NO_PAYLOAD, ReqOptions},
	error::ConfigError,
	http::HttpTransport,
	models::{ListWithCount, PageOpts, SuccessIdResponse, null_as_default},
};

const ASSETS_PATH: &str = "/api/v2/assets";
// Only used to borrow `Url`'s path-segment encoding.
const SEGMENT_BASE: &str = "http://localhost/api/v2/assets";

/// Endpoint agent registered with the platform.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Asset {
	/// Asset identifier.
	#[serde(deserialize_with = "null_as_default")]
	pub id: String,
	/// Owning organization, when reported.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub org_id: Option<u64>,
	/// Owning organization name, when reported.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub org_name: Option<String>,
	/// Whether the agent can accept new work.
	pub available: bool,
	/// Whether the agent currently holds a connection.
	pub connected: bool,
	/// Whether the asset was disabled by an operator.
	pub disabled: bool,
	/// Whether the agent runs with elevated privileges.
	pub elevated: bool,
	/// Agent version.
	#[serde(deserialize_with = "null_as_default")]
	pub version: String,
	/// Operator-defined labels.
	#[serde(deserialize_with = "null_as_default")]
	pub tags: BTreeMap<String, String>,
	/// Users observed on the host.
	#[serde(deserialize_with = "null_as_default")]
	pub users: Vec<AssetUser>,
	/// Detection products observed on the host.
	#[serde(deserialize_with = "null_as_default")]
	pub edr: Vec<AssetEdr>,
	/// Host inventory, kept loosely typed.
	#[serde(rename = "systeminfo", skip_serializing_if = "Option::is_none")]
	pub system_info: Option<serde_json::Value>,
	/// Registration time.
	#[serde(with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")]
	pub created_at: Option<OffsetDateTime>,
	/// Last update time.
	#[serde(with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")]
	pub updated_at: Option<OffsetDateTime>,
}

/// User account associated with an asset.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetUser {
	/// Account name.
	#[serde(deserialize_with = "null_as_default")]
	pub name: String,
	/// Account kind as reported by the agent.
	#[serde(rename = "type", deserialize_with = "null_as_default")]
	pub kind: String,
}

/// Detection product installed on an asset.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetEdr {
	/// Product identifier.
	#[serde(deserialize_with = "null_as_default")]
	pub edr_type: String,
}

/// Tag set sent to and returned by the tagging endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetTags {
	/// Replacement labels.
	#[serde(default, deserialize_with = "null_as_default")]
	pub tags: BTreeMap<String, String>,
}

/// Result of [`Client::set_asset_tags`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetSetTagsResponse {
	/// Whether the server applied the tags.
	pub success: bool,
	/// Tags now attached to the asset.
	#[serde(deserialize_with = "null_as_default")]
	pub tags: AssetTags,
}

/// Client-side filter for [`Client::filtered_assets`]; unset flags match every asset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AssetFilter {
	/// Keep only connected assets.
	pub connected: bool,
	/// Keep only available assets.
	pub available: bool,
}
impl AssetFilter {
	/// Returns `true` when `asset` passes every enabled flag.
	pub fn matches(&self, asset: &Asset) -> bool {
		(!self.connected || asset.connected) && (!self.available || asset.available)
	}
}

impl<T> Client<T>
where
	T: ?Sized + HttpTransport,
{
	/// Lists every asset visible to the API key.
	pub async fn list_assets(&self) -> Result<Vec<Asset>> {
		self.get_json(ASSETS_PATH, None).await
	}

	/// Fetches one asset.
	pub async fn get_asset(&self, asset_id: &str) -> Result<Asset> {
		self.get_json(&asset_path(asset_id, None)?, None).await
	}

	/// Re-enables a disabled asset.
	pub async fn enable_asset(&self, asset_id: &str) -> Result<SuccessIdResponse> {
		self.post_json(&asset_path(asset_id, Some("enable"))?, NO_PAYLOAD, None).await
	}

	/// Disables an asset so it receives no further work.
	pub async fn disable_asset(&self, asset_id: &str) -> Result<SuccessIdResponse> {
		self.post_json(&asset_path(asset_id, Some("disable"))?, NO_PAYLOAD, None).await
	}

	/// Removes an asset.
	pub async fn delete_asset(&self, asset_id: &str) -> Result<SuccessIdResponse> {
		self.delete_json(&asset_path(asset_id, None)?, NO_PAYLOAD, None).await
	}

	/// Replaces the asset's tags.
	pub async fn set_asset_tags(
		&self,
		asset_id: &str,
		tags: BTreeMap<String, String>,
	) -> Result<AssetSetTagsResponse> {
		let payload = AssetTags { tags };

		self.post_json(&asset_path(asset_id, Some("tags"))?, Some(&payload), None).await
	}

	/// One page of the attacks executed on an asset.
	pub async fn asset_attacks(&self, asset_id: &str, page: &PageOpts) -> Result<ListWithCount> {
		let options = ReqOptions { params: page.params(), ..ReqOptions::default() };

		self.get_json(&asset_path(asset_id, Some("attacks"))?, Some(&options)).await
	}

	/// Lists assets and keeps those matching `filter`.
	pub async fn filtered_assets(&self, filter: AssetFilter) -> Result<Vec<Asset>> {
		let mut assets = self.list_assets().await?;

		assets.retain(|asset| filter.matches(asset));

		Ok(assets)
	}
}

/// `/api/v2/assets/<id>[/<action>]` with `asset_id` encoded as a single path segment.
fn asset_path(asset_id: &str, action: Option<&str>) -> Result<String> {
	let invalid = || ConfigError::InvalidPath { path: asset_id.to_owned(), source: None };

	if matches!(asset_id, "" | "." | "..") {
		return Err(invalid().into());
	}

	let mut url = Url::parse(SEGMENT_BASE)
		.map_err(|source| ConfigError::InvalidPath { path: asset_id.to_owned(), source: Some(source) })?;

	{
		let mut segments = url.path_segments_mut().map_err(|_| invalid())?;

		segments.push(asset_id);

		if let Some(action) = action {
			segments.push(action);
		}
	}

	Ok(url.path().to_owned())
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;

	#[test]
	fn asset_ids_are_single_segments() {
		assert_eq!(asset_path("a-1", None).expect("Plain id is valid."), "/api/v2/assets/a-1");
		assert_eq!(
			asset_path("a-1", Some("enable")).expect("Plain id is valid."),
			"/api/v2/assets/a-1/enable"
		);
		assert_eq!(
			asset_path("../../admin?x=1", Some("tags")).expect("Separators are encoded."),
			"/api/v2/assets/..%2F..%2Fadmin%3Fx=1/tags"
		);

		for id in ["", ".", ".."] {
			let err = asset_path(id, None).expect_err("Degenerate ids are rejected.");

			assert!(matches!(err, Error::Config(ConfigError::InvalidPath { source: None, .. })));
		}
	}

	#[test]
	fn asset_decodes_partial_documents() {
		let asset: Asset = serde_json::from_str(
			r#"{
				"id": "a-1",
				"connected": true,
				"tags": {"env": "lab"},
				"users": [{"name": "svc", "type": "local"}],
				"edr": [{"edr_type": "defender"}],
				"created_at": "2024-05-01T10:00:00Z",
				"systeminfo": {"hostname": "lab-01", "cpu": 4}
			}"#,
		)
		.expect("Partial asset should decode.");

		assert_eq!(asset.id, "a-1");
		assert!(asset.connected && !asset.available);
		assert_eq!(asset.tags.get("env").map(String::as_str), Some("lab"));
		assert_eq!(asset.users[0].kind, "local");
		assert_eq!(asset.edr[0].edr_type, "defender");
		assert_eq!(asset.created_at, Some(datetime!(2024-05-01 10:00:00 UTC)));
		assert_eq!(asset.updated_at, None);
		assert_eq!(
			asset.system_info.as_ref().and_then(|info| info.get("cpu")),
			Some(&serde_json::json!(4))
		);
	}

	#[test]
	fn null_collections_decode_as_empty() {
		let asset: Asset = crate::response::decode_response(
			200,
			br#"{"id":"a-1","version":null,"tags":null,"users":null,"edr":[{"edr_type":null}]}"#,
		)
		.expect("Null collections should decode as empty.");

		assert_eq!(asset.id, "a-1");
		assert!(asset.version.is_empty());
		assert!(asset.tags.is_empty());
		assert!(asset.users.is_empty());
		assert_eq!(asset.edr, [AssetEdr::default()]);

		let user: AssetUser = serde_json::from_str(r#"{"name":null,"type":null}"#)
			.expect("Null user fields should decode as empty.");

		assert_eq!(user, AssetUser::default());

		let tagged: AssetSetTagsResponse = serde_json::from_str(r#"{"success":true,"tags":null}"#)
			.expect("Null tag document should decode as empty.");
		let nested: AssetSetTagsResponse =
			serde_json::from_str(r#"{"success":true,"tags":{"tags":null}}"#)
				.expect("Null tag map should decode as empty.");

		assert!(tagged.success && tagged.tags.tags.is_empty());
		assert!(nested.tags.tags.is_empty());
	}

	#[test]
	fn filter_requires_every_enabled_flag() {
		let online = Asset { connected: true, available: true, ..Asset::default() };
		let busy = Asset { connected: true, ..Asset::default() };
		let offline = Asset::default();

		assert!(AssetFilter::default().matches(&offline));
		assert!(AssetFilter { connected: true, available: false }.matches(&busy));
		assert!(!AssetFilter { connected: true, available: true }.matches(&busy));
		assert!(AssetFilter { connected: true, available: true }.matches(&online));
		assert!(!AssetFilter { connected: false, available: true }.matches(&offline));
	}
}
