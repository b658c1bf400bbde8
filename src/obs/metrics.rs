// self
use crate::obs::RequestOutcome;

/// Records a call outcome via the global metrics recorder (when enabled).
pub fn record_request_outcome(outcome: RequestOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("attack_sdk_request_total", "outcome" => outcome.as_str()).increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}

/// Records a limiter reconfiguration from `previous` to `current` requests per minute.
pub fn record_limiter_swap(previous: u32, current: u32) {
	#[cfg(feature = "tracing")]
	tracing::info!(previous, current, "rate limiter reconfigured from server quota");

	#[cfg(feature = "metrics")]
	metrics::counter!("attack_sdk_limiter_swap_total").increment(1);

	#[cfg(not(any(feature = "tracing", feature = "metrics")))]
	{
		let _ = (previous, current);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recorders_noop_without_features() {
		record_request_outcome(RequestOutcome::Throttled);
		record_limiter_swap(100, 50);
	}
}
