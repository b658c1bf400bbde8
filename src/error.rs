//! Client-level error types shared by the executor, the decoder, and the endpoint wrappers.

// self
use crate::{_prelude::*, response::ApiError};

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
///
/// The first three variants are the sentinels callers branch on; match on the variant (or use
/// the `is_*` helpers) instead of inspecting the rendered message.
///
/// The sentinel messages are lowercase without a trailing period so they read the same as the
/// platform's other SDKs; every other variant uses sentence case.
#[derive(Debug, ThisError)]
pub enum Error {
	/// The server rejected the API key (HTTP 401 without a structured body).
	#[error("invalid api key")]
	InvalidCredential,
	/// The requested resource does not exist (HTTP 404 without a structured body).
	#[error("resource not found")]
	NotFound,
	/// The request was throttled, either locally before sending or by the server (HTTP 429).
	#[error("rate limit exceeded")]
	RateLimited {
		/// Delay after which a retry is expected to be admitted, when known.
		retry_after: Option<Duration>,
	},
	/// The server answered with a structured error body.
	#[error(transparent)]
	Server(#[from] ServerError),
	/// The server answered with an unexpected status and a body that is not an error document.
	#[error("resource not found: invalid response content (HTTP {status})")]
	InvalidResponse {
		/// HTTP status code of the response.
		status: u16,
	},
	/// Response body could not be decoded into the expected shape.
	#[error("Response body (HTTP {status}) is not valid JSON for the expected type.")]
	Decode {
		/// Structured decoding failure, including the JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the response.
		status: u16,
	},
	/// Request payload could not be encoded as JSON; nothing was sent.
	#[error("Request payload could not be encoded as JSON.")]
	Encode(#[source] serde_json::Error),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// The caller cancelled the request.
	#[error("Request was cancelled.")]
	Cancelled,
}
impl Error {
	/// Returns `true` for the invalid-credential sentinel.
	pub fn is_invalid_credential(&self) -> bool {
		matches!(self, Self::InvalidCredential)
	}

	/// Returns `true` for the not-found sentinel.
	pub fn is_not_found(&self) -> bool {
		matches!(self, Self::NotFound)
	}

	/// Returns `true` for the rate-limited sentinel, whether local or server-side.
	pub fn is_rate_limited(&self) -> bool {
		matches!(self, Self::RateLimited { .. })
	}

	/// Retry hint carried by [`Error::RateLimited`], if any.
	pub fn retry_after(&self) -> Option<Duration> {
		match self {
			Self::RateLimited { retry_after } => *retry_after,
			_ => None,
		}
	}
}

/// Structured error document returned by the server for a non-success status.
#[derive(Clone, Debug, ThisError)]
#[error("{summary}")]
pub struct ServerError {
	/// HTTP status code of the response.
	pub status: u16,
	/// Decoded error body.
	pub body: ApiError,
	summary: String,
}
impl ServerError {
	/// Wraps a decoded error body; the display form is `"<field>: <reason>"` of its first item.
	pub fn new(status: u16, body: ApiError) -> Self {
		let summary = body.summary();

		Self { status, body, summary }
	}
}

/// Configuration and validation failures raised by the client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Base URL cannot be parsed.
	#[error("Base URL `{value}` is invalid.")]
	InvalidBaseUrl {
		/// Rejected input.
		value: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Request path cannot be resolved against the base URL.
	#[error("Request path `{path}` cannot be resolved against the base URL.")]
	InvalidPath {
		/// Rejected path.
		path: String,
		/// Underlying parsing failure; absent when the path resolved to a different origin.
		#[source]
		source: Option<url::ParseError>,
	},
	/// Caller-supplied header name or value is not valid HTTP.
	#[error("Header `{name}` is not a valid HTTP header.")]
	InvalidHeader {
		/// Offending header name.
		name: String,
	},
	/// Requests-per-minute budget must be positive.
	#[error("Rate limit must be a positive number of requests per minute.")]
	InvalidRateLimit,
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Configuration file could not be read or written.
	#[error("Configuration file `{}` could not be accessed.", path.display())]
	File {
		/// File path involved.
		path: PathBuf,
		/// Underlying IO failure.
		#[source]
		source: std::io::Error,
	},
	/// Configuration file contents are not valid JSON.
	#[error("Configuration file `{}` could not be parsed.", path.display())]
	Parse {
		/// File path involved.
		path: PathBuf,
		/// Underlying parsing failure.
		#[source]
		source: serde_json::Error,
	},
	/// Configuration could not be encoded as JSON.
	#[error("Configuration could not be encoded as JSON.")]
	Encode {
		/// Underlying encoding failure.
		#[source]
		source: serde_json::Error,
	},
	/// Home directory could not be determined.
	#[error("Home directory could not be determined.")]
	MissingHome,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the API.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::response::ErrorItem;

	#[test]
	fn sentinels_are_identified_by_variant() {
		assert!(Error::InvalidCredential.is_invalid_credential());
		assert!(Error::NotFound.is_not_found());
		assert!(!Error::NotFound.is_rate_limited());

		let throttled = Error::RateLimited { retry_after: Some(Duration::from_secs(7)) };

		assert!(throttled.is_rate_limited());
		assert_eq!(throttled.retry_after(), Some(Duration::from_secs(7)));
		assert_eq!(Error::Cancelled.retry_after(), None);
	}

	#[test]
	fn sentinel_messages_keep_their_wire_form() {
		assert_eq!(Error::InvalidCredential.to_string(), "invalid api key");
		assert_eq!(Error::NotFound.to_string(), "resource not found");
		assert_eq!(Error::RateLimited { retry_after: None }.to_string(), "rate limit exceeded");
		assert_eq!(Error::Cancelled.to_string(), "Request was cancelled.");
	}

	#[test]
	fn server_error_displays_first_item() {
		let body = ApiError {
			errors: vec![ErrorItem::new("asset_id", "missing"), ErrorItem::new("tags", "empty")],
			..ApiError::default()
		};
		let err = Error::from(ServerError::new(400, body));

		assert_eq!(err.to_string(), "asset_id: missing");
	}
}
