//! Static bearer credential wrapper that redacts sensitive material.

// self
use crate::_prelude::*;

/// API key sent as `Authorization: Bearer <key>` on every request.
///
/// Formatting never reveals the key; use [`ApiKey::expose`] only when building headers.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);
impl ApiKey {
	/// Wraps a new key.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner key value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Returns `true` when no key has been configured.
	pub fn is_empty(&self) -> bool {
		self.0.trim().is_empty()
	}

	/// Formats the `Authorization` header value.
	pub(crate) fn bearer(&self) -> String {
		format!("Bearer {}", self.0)
	}
}
impl From<&str> for ApiKey {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}
impl From<String> for ApiKey {
	fn from(value: String) -> Self {
		Self(value)
	}
}
impl Debug for ApiKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("ApiKey").field(&"<redacted>").finish()
	}
}
impl Display for ApiKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}
