//! Optional observability helpers for API calls.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to run every call inside a span named `attack_sdk.request` with `method`
//!   and `path` fields, and to emit events when the local limiter throttles or is reconfigured.
//! - Enable `metrics` to increment the `attack_sdk_request_total` counter (labeled by
//!   `outcome`) for every call and `attack_sdk_limiter_swap_total` for every limiter swap.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Outcome labels recorded for each call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestOutcome {
	/// Entry to the executor.
	Attempt,
	/// The server answered and the response was handed back for decoding.
	Success,
	/// The call was rejected by the local limiter or by an HTTP 429.
	Throttled,
	/// Any other failure propagated back to the caller.
	Failure,
}
impl RequestOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RequestOutcome::Attempt => "attempt",
			RequestOutcome::Success => "success",
			RequestOutcome::Throttled => "throttled",
			RequestOutcome::Failure => "failure",
		}
	}

	/// Classifies a finished call.
	pub fn of<T>(result: &Result<T>) -> Self {
		match result {
			Ok(_) => RequestOutcome::Success,
			Err(e) if e.is_rate_limited() => RequestOutcome::Throttled,
			Err(_) => RequestOutcome::Failure,
		}
	}
}
impl Display for RequestOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
