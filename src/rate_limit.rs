//! Local admission control for outbound API calls.
//!
//! [`RateLimiter`] is a refilling token bucket sized in requests per minute: the bucket starts
//! full (the whole budget may burst up front) and refills at `requests_per_minute / 60` tokens
//! per second. Every check is O(1). When the server advertises a different budget the limiter
//! swaps in a freshly built bucket instead of mutating the live one, so concurrent callers only
//! ever observe a complete configuration.

// crates.io
use tokio::time::{self, Instant};
// self
use crate::{_prelude::*, error::ConfigError, obs};

/// Window the requests-per-minute budget applies to.
pub const WINDOW: Duration = Duration::from_secs(60);

/// Result of a non-blocking admission probe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateLimitDecision {
	/// One unit of capacity was reserved; the request may proceed immediately.
	Allow,
	/// No capacity is available; nothing was reserved.
	Delay(Duration),
}
impl RateLimitDecision {
	/// Returns `true` when the probe reserved capacity.
	pub fn is_allowed(self) -> bool {
		matches!(self, Self::Allow)
	}

	/// Estimated time until one unit of capacity becomes available (zero when allowed).
	pub fn wait_hint(self) -> Duration {
		match self {
			Self::Allow => Duration::ZERO,
			Self::Delay(wait) => wait,
		}
	}
}

/// Failure modes of [`RateLimiter::await_admission`]. Neither consumes capacity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ThisError)]
pub enum AdmissionError {
	/// Capacity would not become available before the caller's deadline.
	#[error("Rate limiter admission would exceed the deadline (estimated wait {wait:?}).")]
	DeadlineExceeded {
		/// Last estimated wait observed before giving up.
		wait: Duration,
	},
	/// The caller cancelled while waiting.
	#[error("Rate limiter admission was cancelled.")]
	Cancelled,
}

/// Thread-safe token-bucket limiter shared by every call made through one client.
#[derive(Debug)]
pub struct RateLimiter {
	bucket: RwLock<Arc<TokenBucket>>,
}
impl RateLimiter {
	/// Budget applied when the caller does not supply one.
	pub const DEFAULT_REQUESTS_PER_MINUTE: u32 = 100;

	/// Creates a full bucket admitting `requests_per_minute` calls per [`WINDOW`].
	pub fn new(requests_per_minute: u32) -> Result<Self, ConfigError> {
		let bucket = TokenBucket::new(requests_per_minute)?;

		Ok(Self { bucket: RwLock::new(Arc::new(bucket)) })
	}

	/// Current requests-per-minute capacity.
	pub fn capacity(&self) -> u32 {
		self.current().capacity
	}

	/// Whole tokens currently available for immediate admission.
	pub fn available(&self) -> u32 {
		self.current().available(Instant::now())
	}

	/// Reserves one unit of capacity if available, without blocking.
	///
	/// A [`RateLimitDecision::Delay`] never consumes capacity, so repeated probes against an
	/// exhausted bucket leave it untouched.
	pub fn try_admit(&self) -> RateLimitDecision {
		self.current().try_take(Instant::now())
	}

	/// Waits until one unit of capacity is reserved, `max_wait` elapses, or `cancel` fires.
	///
	/// Fails fast with [`AdmissionError::DeadlineExceeded`] once the projected wait would overrun
	/// the deadline. `Ok(())` is only returned after a token has actually been consumed.
	pub async fn await_admission(
		&self,
		cancel: Option<&CancellationToken>,
		max_wait: Duration,
	) -> Result<(), AdmissionError> {
		let deadline = Instant::now() + max_wait;

		loop {
			if cancel.is_some_and(CancellationToken::is_cancelled) {
				return Err(AdmissionError::Cancelled);
			}

			let wait = match self.try_admit() {
				RateLimitDecision::Allow => return Ok(()),
				RateLimitDecision::Delay(wait) => wait,
			};

			if Instant::now() + wait > deadline {
				return Err(AdmissionError::DeadlineExceeded { wait });
			}

			match cancel {
				Some(token) => tokio::select! {
					biased;
					_ = token.cancelled() => return Err(AdmissionError::Cancelled),
					_ = time::sleep(wait) => {},
				},
				None => time::sleep(wait).await,
			}
		}
	}

	/// Replaces the bucket with a full one sized for `requests_per_minute`.
	///
	/// Zero or an unchanged budget is ignored. Returns `true` when a swap happened.
	pub fn reconfigure(&self, requests_per_minute: u32) -> bool {
		if requests_per_minute == 0 {
			return false;
		}

		let mut guard = self.bucket.write();
		let previous = guard.capacity;

		if previous == requests_per_minute {
			return false;
		}

		match TokenBucket::new(requests_per_minute) {
			Ok(bucket) => *guard = Arc::new(bucket),
			Err(_) => return false,
		}

		drop(guard);
		obs::record_limiter_swap(previous, requests_per_minute);

		true
	}

	fn current(&self) -> Arc<TokenBucket> {
		Arc::clone(&self.bucket.read())
	}
}
impl Default for RateLimiter {
	fn default() -> Self {
		let bucket = TokenBucket::full(Self::DEFAULT_REQUESTS_PER_MINUTE);

		Self { bucket: RwLock::new(Arc::new(bucket)) }
	}
}

#[derive(Debug)]
struct TokenBucket {
	capacity: u32,
	// Seconds needed to refill one token.
	refill_interval: f64,
	state: Mutex<BucketState>,
}
impl TokenBucket {
	fn new(requests_per_minute: u32) -> Result<Self, ConfigError> {
		if requests_per_minute == 0 {
			return Err(ConfigError::InvalidRateLimit);
		}

		Ok(Self::full(requests_per_minute))
	}

	fn full(capacity: u32) -> Self {
		Self {
			capacity,
			refill_interval: WINDOW.as_secs_f64() / f64::from(capacity),
			state: Mutex::new(BucketState { tokens: f64::from(capacity), refreshed_at: Instant::now() }),
		}
	}

	fn try_take(&self, now: Instant) -> RateLimitDecision {
		let mut state = self.state.lock();

		state.refill(now, self.capacity, self.refill_interval);

		if state.tokens >= 1. {
			state.tokens -= 1.;

			return RateLimitDecision::Allow;
		}

		let wait = Duration::from_secs_f64((1. - state.tokens) * self.refill_interval);

		RateLimitDecision::Delay(wait.max(Duration::from_nanos(1)))
	}

	fn available(&self, now: Instant) -> u32 {
		let mut state = self.state.lock();

		state.refill(now, self.capacity, self.refill_interval);

		state.tokens.floor() as u32
	}
}

#[derive(Debug)]
struct BucketState {
	tokens: f64,
	refreshed_at: Instant,
}
impl BucketState {
	fn refill(&mut self, now: Instant, capacity: u32, refill_interval: f64) {
		// Concurrent callers may sample `now` before another caller refreshed the bucket.
		let Some(elapsed) = now.checked_duration_since(self.refreshed_at) else { return };

		self.tokens =
			(self.tokens + elapsed.as_secs_f64() / refill_interval).min(f64::from(capacity));
		self.refreshed_at = now;
	}
}
