//! Status-code dispatch for API responses.
//!
//! [`decode_response`] turns a raw `(status, body)` pair into either the caller's destination
//! type or a classified [`Error`]. Only 200 and 201 decode as success; every other status
//! becomes an error, never a partially populated value.

// self
use crate::{_prelude::*, error::ServerError, models::null_as_default};

/// Field name reported when an error document carries no items.
const UNKNOWN_FIELD: &str = "Unknown";

/// Structured error document returned by the API for non-success statuses.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiError {
	/// Application error code.
	#[serde(deserialize_with = "null_as_default")]
	pub code: i64,
	/// Human-readable detail.
	#[serde(deserialize_with = "null_as_default")]
	pub detail: String,
	/// Short human-readable title.
	#[serde(deserialize_with = "null_as_default")]
	pub title: String,
	/// HTTP status echoed by the server.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub status: Option<u16>,
	/// Field-level error items, most relevant first.
	#[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "null_as_default")]
	pub errors: Vec<ErrorItem>,
}
impl ApiError {
	/// Returns the first error item, which is the canonical summary of the document.
	pub fn first_error(&self) -> Option<&ErrorItem> {
		self.errors.first()
	}

	/// Formats the document as `"<field>: <reason>"` of its first item.
	pub fn summary(&self) -> String {
		match self.first_error() {
			Some(item) => format!("{}: {}", item.name, item.reason),
			None => format!("{UNKNOWN_FIELD}: "),
		}
	}
}

/// One field-level entry of an [`ApiError`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorItem {
	/// Name of the offending parameter or field.
	#[serde(default, deserialize_with = "null_as_default")]
	pub name: String,
	/// Human-readable reason.
	#[serde(default, deserialize_with = "null_as_default")]
	pub reason: String,
	/// Additional server-provided context.
	#[serde(
		default,
		skip_serializing_if = "BTreeMap::is_empty",
		deserialize_with = "null_as_default"
	)]
	pub more: BTreeMap<String, serde_json::Value>,
}
impl ErrorItem {
	/// Creates an item without extra context.
	pub fn new(name: impl Into<String>, reason: impl Into<String>) -> Self {
		Self { name: name.into(), reason: reason.into(), more: BTreeMap::new() }
	}
}

/// Maps `(status, body)` to the decoded destination value or a classified error.
///
/// | status        | decode failure                 |
/// |---------------|--------------------------------|
/// | 200, 201      | [`Error::Decode`]              |
/// | 400           | [`Error::Decode`]              |
/// | 401           | [`Error::InvalidCredential`]   |
/// | 404           | [`Error::NotFound`]            |
/// | 429           | [`Error::RateLimited`]         |
/// | anything else | [`Error::InvalidResponse`]     |
///
/// Non-success statuses whose body is a valid error document yield [`Error::Server`]; a `null`
/// body counts as an empty document.
pub fn decode_response<T>(status: u16, body: &[u8]) -> Result<T>
where
	T: DeserializeOwned,
{
	match status {
		200 | 201 => decode_json(status, body),
		_ => {
			let document =
				decode_json::<Option<ApiError>>(status, body).map(Option::unwrap_or_default);

			Err(match (status, document) {
				(_, Ok(document)) => ServerError::new(status, document).into(),
				(400, Err(e)) => e,
				(401, Err(_)) => Error::InvalidCredential,
				(404, Err(_)) => Error::NotFound,
				(429, Err(_)) => Error::RateLimited { retry_after: None },
				(_, Err(_)) => Error::InvalidResponse { status },
			})
		},
	}
}

fn decode_json<T>(status: u16, body: &[u8]) -> Result<T>
where
	T: DeserializeOwned,
{
	let mut de = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut de).map_err(|source| Error::Decode { source, status })
}
