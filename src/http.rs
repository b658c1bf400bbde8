//! Transport primitives for API calls.
//!
//! [`HttpTransport`] is the client's only dependency on an HTTP stack. The default
//! [`ReqwestTransport`] applies the fixed 60 second timeout; tests and embedders can supply their
//! own implementation. [`RateInfo`] captures the quota headers the server attaches to every
//! response so the executor can fold them back into the local limiter.

// crates.io
use reqwest::header::{CONTENT_TYPE, HeaderMap};
// self
use crate::{
	_prelude::*,
	error::{ConfigError, TransportError},
};

/// Boxed future returned by [`HttpTransport::send`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<TransportResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of performing one request/response round trip.
///
/// Implementations must be shareable across tasks; the client keeps a single instance behind an
/// [`Arc`] for its whole lifetime and never retries on its own.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends the request and buffers the full response body.
	fn send(&self, request: TransportRequest) -> TransportFuture<'_>;
}

/// Fully resolved request handed to an [`HttpTransport`].
#[derive(Clone, Debug)]
pub struct TransportRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute URL including query parameters.
	pub url: Url,
	/// Request headers, authentication included.
	pub headers: HeaderMap,
	/// Encoded request body, if any.
	pub body: Option<Vec<u8>>,
}

/// Buffered response returned by an [`HttpTransport`].
#[derive(Clone, Debug, Default)]
pub struct TransportResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response headers.
	pub headers: HeaderMap,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl TransportResponse {
	/// Value of the `Content-Type` header, if present and valid UTF-8.
	pub fn content_type(&self) -> Option<&str> {
		self.headers.get(CONTENT_TYPE)?.to_str().ok()
	}
}

/// Default transport backed by a shared [`ReqwestClient`].
#[derive(Clone, Debug)]
pub struct ReqwestTransport(pub ReqwestClient);
impl ReqwestTransport {
	/// Timeout applied to every request, connect through body.
	pub const TIMEOUT: Duration = Duration::from_secs(60);

	/// Builds a reqwest client with [`Self::TIMEOUT`].
	pub fn new() -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder()
			.timeout(Self::TIMEOUT)
			.build()
			.map_err(ConfigError::http_client_build)?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
impl HttpTransport for ReqwestTransport {
	fn send(&self, request: TransportRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			let TransportRequest { method, url, headers, body } = request;
			let mut builder = self.0.request(method, url).headers(headers);

			if let Some(body) = body {
				builder = builder.body(body);
			}

			let response = builder.send().await?;
			let status = response.status().as_u16();
			let headers = response.headers().to_owned();
			let body = response.bytes().await?.to_vec();

			Ok(TransportResponse { status, headers, body })
		})
	}
}

/// Quota snapshot parsed from one response's `x-ratelimit-*` headers.
///
/// Absent or malformed headers read as zero (empty for `resource`); parsing never fails.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RateInfo {
	/// `x-ratelimit-limit`: requests allowed per window.
	pub limit: u32,
	/// `x-ratelimit-remaining`: requests left in the current window.
	pub remaining: u32,
	/// `x-ratelimit-used`: requests consumed in the current window.
	pub used: u32,
	/// `x-ratelimit-reset`: Unix timestamp at which the window resets.
	pub reset: i64,
	/// `x-ratelimit-retry-after`: seconds to wait before retrying.
	pub retry_after: u64,
	/// `x-ratelimit-resource`: name of the throttled resource.
	pub resource: String,
}
impl RateInfo {
	const LIMIT: &'static str = "x-ratelimit-limit";
	const REMAINING: &'static str = "x-ratelimit-remaining";
	const RESET: &'static str = "x-ratelimit-reset";
	const RESOURCE: &'static str = "x-ratelimit-resource";
	const RETRY_AFTER: &'static str = "x-ratelimit-retry-after";
	const USED: &'static str = "x-ratelimit-used";

	/// Parses the quota headers from `headers`.
	pub fn from_headers(headers: &HeaderMap) -> Self {
		Self {
			limit: parse_header(headers, Self::LIMIT),
			remaining: parse_header(headers, Self::REMAINING),
			used: parse_header(headers, Self::USED),
			reset: parse_header(headers, Self::RESET),
			retry_after: parse_header(headers, Self::RETRY_AFTER),
			resource: header_str(headers, Self::RESOURCE).unwrap_or_default().to_owned(),
		}
	}

	/// Server-advertised retry delay, when one was supplied.
	pub fn retry_after(&self) -> Option<Duration> {
		(self.retry_after > 0).then(|| Duration::from_secs(self.retry_after))
	}

	/// Instant the server's window resets, when advertised.
	pub fn reset_at(&self) -> Option<OffsetDateTime> {
		if self.reset <= 0 {
			return None;
		}

		OffsetDateTime::from_unix_timestamp(self.reset).ok()
	}
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
	headers.get(name)?.to_str().ok().map(str::trim).filter(|value| !value.is_empty())
}

fn parse_header<T>(headers: &HeaderMap, name: &str) -> T
where
	T: Default + FromStr,
{
	header_str(headers, name).and_then(|value| value.parse().ok()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
	// crates.io
	use reqwest::header::HeaderValue;
	// self
	use super::*;

	fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
		let mut map = HeaderMap::new();

		for (name, value) in pairs {
			map.insert(*name, HeaderValue::from_static(value));
		}

		map
	}

	#[test]
	fn rate_info_reads_all_quota_headers() {
		let info = RateInfo::from_headers(&headers(&[
			("x-ratelimit-limit", "50"),
			("x-ratelimit-remaining", "0"),
			("x-ratelimit-used", "50"),
			("x-ratelimit-reset", "1700000000"),
			("x-ratelimit-retry-after", "12"),
			("x-ratelimit-resource", "assets"),
		]));

		assert_eq!(info, RateInfo {
			limit: 50,
			remaining: 0,
			used: 50,
			reset: 1_700_000_000,
			retry_after: 12,
			resource: "assets".into(),
		});
		assert_eq!(info.retry_after(), Some(Duration::from_secs(12)));
		assert_eq!(
			info.reset_at().map(OffsetDateTime::unix_timestamp),
			Some(1_700_000_000)
		);
	}

	#[test]
	fn rate_info_defaults_missing_and_malformed_headers() {
		let info = RateInfo::from_headers(&headers(&[
			("x-ratelimit-limit", "-5"),
			("x-ratelimit-remaining", "lots"),
			("x-ratelimit-retry-after", ""),
		]));

		assert_eq!(info, RateInfo::default());
		assert_eq!(info.retry_after(), None);
		assert_eq!(info.reset_at(), None);
	}

	#[test]
	fn content_type_is_exposed() {
		let response = TransportResponse {
			status: 200,
			headers: headers(&[("content-type", "application/json")]),
			body: Vec::new(),
		};

		assert_eq!(response.content_type(), Some("application/json"));
		assert_eq!(TransportResponse::default().content_type(), None);
	}
}
