//! Rate-governed request execution.
//!
//! [`Client`] owns the base URL, the API key, the transport, and the single [`RateLimiter`]
//! shared by every call made through it. [`Client::execute`] performs exactly one round trip:
//! local admission, request construction, send, quota-header parsing, and 429 handling. The
//! typed JSON helpers in this module's `json` submodule layer decoding on top.

mod json;

// crates.io
use reqwest::header::{
	ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue,
};
// self
use crate::{
	_prelude::*,
	auth::ApiKey,
	config::ClientConfig,
	error::ConfigError,
	http::{HttpTransport, RateInfo, ReqwestTransport, TransportRequest},
	obs::{self, RequestOutcome, RequestSpan},
	rate_limit::{AdmissionError, RateLimitDecision, RateLimiter},
};

/// Typed "no request body" marker for the JSON helpers.
pub const NO_PAYLOAD: Option<&()> = None;

const APPLICATION_JSON: &str = "application/json";

/// Per-call options: extra query parameters, extra headers, and an optional cancellation token.
#[derive(Clone, Debug, Default)]
pub struct ReqOptions {
	/// Query parameters appended to the resolved URL.
	pub params: BTreeMap<String, String>,
	/// Headers applied after the defaults; they override `Accept` and `Authorization`.
	pub headers: BTreeMap<String, String>,
	/// Token that aborts both the admission wait and the in-flight send.
	pub cancel: Option<CancellationToken>,
}
impl ReqOptions {
	/// Creates empty options.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a query parameter.
	pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.params.insert(name.into(), value.into());

		self
	}

	/// Adds a request header.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.insert(name.into(), value.into());

		self
	}

	/// Attaches a cancellation token.
	pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
		self.cancel = Some(token);

		self
	}
}

/// Undecoded response handed back by [`Client::execute`].
#[derive(Clone, Debug)]
pub struct RawResponse {
	/// Raw response body.
	pub body: Vec<u8>,
	/// HTTP status code.
	pub status: u16,
	/// `Content-Type` header, if present.
	pub content_type: Option<String>,
	/// Quota snapshot parsed from the response headers.
	pub rate: RateInfo,
}

/// Authenticated, rate-governed API client.
///
/// Construct one per process or session and share it; every clone shares the same transport
/// and limiter.
pub struct Client<T = ReqwestTransport>
where
	T: ?Sized + HttpTransport,
{
	base_url: Url,
	api_key: ApiKey,
	transport: Arc<T>,
	limiter: Arc<RateLimiter>,
}
impl Client<ReqwestTransport> {
	/// Creates a client backed by the default reqwest transport and a 100 rpm budget.
	pub fn new(base_url: &str, api_key: impl Into<ApiKey>) -> Result<Self> {
		Self::with_transport(base_url, api_key, ReqwestTransport::new()?)
	}

	/// Creates a client from a loaded configuration file.
	pub fn from_config(config: &ClientConfig) -> Result<Self> {
		Self::new(config.effective_base_url(), config.api_key.clone())
	}
}
impl<T> Client<T>
where
	T: ?Sized + HttpTransport,
{
	/// Local admission waits never exceed this bound.
	pub const MAX_ADMISSION_WAIT: Duration = Duration::from_secs(5);

	/// Creates a client that sends every request through `transport`.
	pub fn with_transport(
		base_url: &str,
		api_key: impl Into<ApiKey>,
		transport: impl Into<Arc<T>>,
	) -> Result<Self> {
		let base_url = Url::parse(base_url)
			.map_err(|source| ConfigError::InvalidBaseUrl { value: base_url.into(), source })?;

		Ok(Self {
			base_url,
			api_key: api_key.into(),
			transport: transport.into(),
			limiter: Arc::new(RateLimiter::default()),
		})
	}

	/// Replaces the local budget with `requests_per_minute`.
	pub fn with_rate_limit(mut self, requests_per_minute: u32) -> Result<Self> {
		self.limiter = Arc::new(RateLimiter::new(requests_per_minute)?);

		Ok(self)
	}

	/// Base URL every request path is resolved against.
	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	/// Limiter shared by every call made through this client.
	pub fn rate_limiter(&self) -> &RateLimiter {
		&self.limiter
	}

	/// Performs one rate-governed HTTP round trip and returns the undecoded response.
	///
	/// HTTP 429 never reaches the caller as a response: the limiter is resized to the advertised
	/// quota when it differs, and [`Error::RateLimited`] is returned with the server's retry hint.
	/// Transport failures propagate unchanged; nothing is retried.
	pub async fn execute(
		&self,
		method: Method,
		path: &str,
		body: Option<Vec<u8>>,
		expect_json: bool,
		options: Option<&ReqOptions>,
	) -> Result<RawResponse> {
		let span = RequestSpan::new(&method, path);

		obs::record_request_outcome(RequestOutcome::Attempt);

		let result = span
			.instrument(async {
				let cancel = options.and_then(|options| options.cancel.as_ref());
				let request = self.build_request(method, path, body, expect_json, options)?;

				if cancel.is_some_and(CancellationToken::is_cancelled) {
					return Err(Error::Cancelled);
				}

				self.admit(cancel).await?;

				let response = match cancel {
					Some(token) => tokio::select! {
						biased;
						_ = token.cancelled() => return Err(Error::Cancelled),
						response = self.transport.send(request) => response?,
					},
					None => self.transport.send(request).await?,
				};
				let rate = RateInfo::from_headers(&response.headers);

				if response.status == 429 {
					if rate.limit > 0 && rate.limit != self.limiter.capacity() {
						self.limiter.reconfigure(rate.limit);
					}

					return Err(Error::RateLimited { retry_after: rate.retry_after() });
				}

				let content_type = response.content_type().map(ToOwned::to_owned);

				Ok::<_, Error>(RawResponse {
					body: response.body,
					status: response.status,
					content_type,
					rate,
				})
			})
			.await;

		obs::record_request_outcome(RequestOutcome::of(&result));

		result
	}

	async fn admit(&self, cancel: Option<&CancellationToken>) -> Result<()> {
		let wait = match self.limiter.try_admit() {
			RateLimitDecision::Allow => return Ok(()),
			RateLimitDecision::Delay(wait) => wait,
		};
		let outcome = self.limiter.await_admission(cancel, Self::MAX_ADMISSION_WAIT).await;

		obs::trace_local_throttle(wait, outcome.is_ok());

		match outcome {
			Ok(()) => Ok(()),
			Err(AdmissionError::Cancelled) => Err(Error::Cancelled),
			Err(AdmissionError::DeadlineExceeded { .. }) =>
				Err(Error::RateLimited { retry_after: Some(wait) }),
		}
	}

	fn build_request(
		&self,
		method: Method,
		path: &str,
		body: Option<Vec<u8>>,
		expect_json: bool,
		options: Option<&ReqOptions>,
	) -> Result<TransportRequest> {
		let mut url = self.resolve(path)?;
		let mut headers = HeaderMap::new();
		let mut auth = HeaderValue::from_str(&self.api_key.bearer())
			.map_err(|_| ConfigError::InvalidHeader { name: AUTHORIZATION.to_string() })?;

		auth.set_sensitive(true);
		headers.insert(AUTHORIZATION, auth);

		if expect_json {
			headers.insert(ACCEPT, HeaderValue::from_static(APPLICATION_JSON));

			if body.is_some() {
				headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
			}
		}
		if let Some(options) = options {
			for (name, value) in &options.headers {
				let invalid = || ConfigError::InvalidHeader { name: name.clone() };
				let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
				let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;

				headers.insert(header_name, header_value);
			}

			if !options.params.is_empty() {
				url.query_pairs_mut().extend_pairs(&options.params);
			}
		}

		Ok(TransportRequest { method, url, headers, body })
	}

	/// Resolves `path` against the base URL; the result must stay on the base URL's origin.
	fn resolve(&self, path: &str) -> Result<Url> {
		let url = self
			.base_url
			.join(path)
			.map_err(|source| ConfigError::InvalidPath { path: path.into(), source: Some(source) })?;

		if url.origin() != self.base_url.origin() {
			return Err(ConfigError::InvalidPath { path: path.into(), source: None }.into());
		}

		Ok(url)
	}
}
impl<T> Clone for Client<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			base_url: self.base_url.clone(),
			api_key: self.api_key.clone(),
			transport: Arc::clone(&self.transport),
			limiter: Arc::clone(&self.limiter),
		}
	}
}
impl<T> Debug for Client<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Client")
			.field("base_url", &self.base_url.as_str())
			.field("api_key", &self.api_key)
			.field("limiter", &self.limiter)
			.finish()
	}
}
