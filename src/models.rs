//! Response envelopes shared across endpoint families.

// crates.io
use serde::Deserializer;
// self
use crate::_prelude::*;

/// Reads JSON `null` as `T::default()`; the server emits `null` for empty maps and slices.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: Default + Deserialize<'de>,
{
	Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Acknowledgement returned by mutating endpoints.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SuccessIdResponse {
	/// Whether the server applied the change.
	#[serde(default)]
	pub success: bool,
	/// Identifier of the affected resource; numeric or string depending on the endpoint.
	#[serde(default)]
	pub id: serde_json::Value,
}
impl SuccessIdResponse {
	/// Identifier rendered as text, whichever JSON type the server used.
	pub fn id_string(&self) -> Option<String> {
		match &self.id {
			serde_json::Value::String(id) => Some(id.clone()),
			serde_json::Value::Number(id) => Some(id.to_string()),
			_ => None,
		}
	}
}

/// Page of loosely typed records plus the total row count.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ListWithCount {
	/// Total number of rows matching the query, across all pages.
	#[serde(default, deserialize_with = "null_as_default")]
	pub count: u64,
	/// Rows on this page.
	#[serde(default, deserialize_with = "null_as_default")]
	pub data: Vec<serde_json::Value>,
}

/// Paging parameters for list endpoints.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageOpts {
	/// Page size.
	pub size: u32,
	/// Number of rows to skip.
	pub offset: u32,
	/// Sort expression understood by the server, e.g. `created_at desc`.
	pub order: String,
	/// Optional name filter; empty sends no `name` parameter.
	pub name: String,
}
impl PageOpts {
	/// First page of `size` rows, server-default ordering.
	pub fn first(size: u32) -> Self {
		Self { size, ..Self::default() }
	}

	/// Query parameters for this page.
	pub fn params(&self) -> BTreeMap<String, String> {
		let mut params = BTreeMap::from([
			("size".to_owned(), self.size.to_string()),
			("offset".to_owned(), self.offset.to_string()),
			("order".to_owned(), self.order.clone()),
		]);

		if !self.name.is_empty() {
			params.insert("name".to_owned(), self.name.clone());
		}

		params
	}
}
impl Default for PageOpts {
	fn default() -> Self {
		Self { size: 10, offset: 0, order: String::new(), name: String::new() }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn success_id_accepts_numeric_and_string_ids() {
		let numeric: SuccessIdResponse =
			serde_json::from_str(r#"{"success":true,"id":42}"#).expect("Numeric id should decode.");
		let text: SuccessIdResponse =
			serde_json::from_str(r#"{"success":true,"id":"a-1"}"#).expect("String id should decode.");
		let bare: SuccessIdResponse = serde_json::from_str("{}").expect("Missing fields default.");

		assert_eq!(numeric.id_string().as_deref(), Some("42"));
		assert_eq!(text.id_string().as_deref(), Some("a-1"));
		assert!(!bare.success);
		assert_eq!(bare.id_string(), None);
	}

	#[test]
	fn empty_page_with_null_rows_decodes() {
		let page: ListWithCount = serde_json::from_str(r#"{"count":null,"data":null}"#)
			.expect("Null count and rows should decode as an empty page.");

		assert_eq!(page, ListWithCount::default());
	}

	#[test]
	fn page_params_omit_empty_name() {
		let params = PageOpts::first(25).params();

		assert_eq!(params.get("size").map(String::as_str), Some("25"));
		assert_eq!(params.get("offset").map(String::as_str), Some("0"));
		assert_eq!(params.get("order").map(String::as_str), Some(""));
		assert!(!params.contains_key("name"));

		let named = PageOpts { name: "mimikatz".into(), ..PageOpts::first(5) }.params();

		assert_eq!(named.get("name").map(String::as_str), Some("mimikatz"));
	}
}
