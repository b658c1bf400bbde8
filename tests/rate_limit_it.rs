// std
use std::{collections::BTreeMap, sync::Arc, time::Duration};
// crates.io
use tokio::{task::JoinSet, time::Instant};
// self
use attack_sdk::{
	CancellationToken,
	rate_limit::{AdmissionError, RateLimitDecision, RateLimiter},
};

#[tokio::test(start_paused = true)]
async fn concurrent_probes_never_exceed_capacity() {
	let limiter = Arc::new(RateLimiter::new(2).expect("Positive budget should build."));
	let mut probes = JoinSet::new();

	for _ in 0..3 {
		let limiter = Arc::clone(&limiter);

		probes.spawn(async move { limiter.try_admit() });
	}

	let decisions = probes.join_all().await;
	let allowed = decisions.iter().filter(|decision| decision.is_allowed()).count();

	assert_eq!(allowed, 2);
	assert!(decisions.contains(&RateLimitDecision::Delay(Duration::from_secs(30))));
}

#[tokio::test(start_paused = true)]
async fn waiters_are_released_one_refill_interval_apart() {
	let limiter = Arc::new(RateLimiter::new(3).expect("Positive budget should build."));
	let started = Instant::now();
	let mut waiters = JoinSet::new();

	for _ in 0..6 {
		let limiter = Arc::clone(&limiter);

		waiters.spawn(async move {
			limiter
				.await_admission(None, Duration::from_secs(60))
				.await
				.expect("Every waiter fits inside the deadline.");

			started.elapsed()
		});
	}

	let mut released = waiters.join_all().await;

	released.sort();

	assert_eq!(released, [0, 0, 0, 20, 40, 60].map(Duration::from_secs));
	assert_eq!(limiter.available(), 0);
}

#[tokio::test(start_paused = true)]
async fn sustained_load_stays_within_refilled_budget() {
	const BUDGET: u32 = 6;
	const HORIZON: Duration = Duration::from_secs(150);

	let limiter = Arc::new(RateLimiter::new(BUDGET).expect("Positive budget should build."));
	let started = Instant::now();
	let mut callers = JoinSet::new();

	for caller in 0..24 {
		let limiter = Arc::clone(&limiter);

		callers.spawn(async move {
			let mut admitted = Vec::new();

			loop {
				if caller % 2 == 0 {
					let remaining = HORIZON.saturating_sub(started.elapsed());

					match limiter.await_admission(None, remaining).await {
						Ok(()) => admitted.push(started.elapsed()),
						Err(AdmissionError::DeadlineExceeded { .. }) => break,
						Err(AdmissionError::Cancelled) => unreachable!("No token was supplied."),
					}
				} else {
					match limiter.try_admit() {
						RateLimitDecision::Allow => admitted.push(started.elapsed()),
						RateLimitDecision::Delay(wait) if started.elapsed() + wait <= HORIZON =>
							tokio::time::sleep(wait).await,
						RateLimitDecision::Delay(_) => break,
					}
				}
			}

			admitted
		});
	}

	let mut per_instant = BTreeMap::<Duration, u32>::new();

	for at in callers.join_all().await.into_iter().flatten() {
		*per_instant.entry(at).or_default() += 1;
	}

	let mut total = 0;

	for (at, count) in &per_instant {
		// Six per minute refills one token every ten seconds.
		let refilled = at.as_secs() as u32 * BUDGET / 60;

		total += count;

		assert!(*count <= BUDGET, "{count} admissions at {at:?} exceed the burst budget.");
		assert!(total <= BUDGET + refilled, "{total} admissions by {at:?} exceed the refilled budget.");
	}

	// The initial burst plus one refill every ten seconds through the horizon.
	assert_eq!(total, BUDGET + 15);
	assert!(per_instant.keys().all(|at| *at <= HORIZON));
}

#[tokio::test(start_paused = true)]
async fn cancelled_waiter_leaves_capacity_for_others() {
	let limiter = Arc::new(RateLimiter::new(6).expect("Positive budget should build."));

	for _ in 0..6 {
		limiter.try_admit();
	}

	let token = CancellationToken::new();
	let waiter = {
		let limiter = Arc::clone(&limiter);
		let token = token.clone();

		tokio::spawn(async move { limiter.await_admission(Some(&token), Duration::from_secs(60)).await })
	};

	tokio::time::sleep(Duration::from_secs(3)).await;
	token.cancel();

	let outcome = waiter.await.expect("Waiter task should not panic.");

	assert_eq!(outcome, Err(AdmissionError::Cancelled));

	tokio::time::sleep(Duration::from_secs(7)).await;

	// Ten seconds at six per minute refills exactly one token.
	assert_eq!(limiter.available(), 1);
	assert!(limiter.try_admit().is_allowed());
}

#[test]
fn reconfigure_ignores_zero_and_unchanged_budgets() {
	let limiter = RateLimiter::default();

	assert!(!limiter.reconfigure(0));
	assert!(!limiter.reconfigure(RateLimiter::DEFAULT_REQUESTS_PER_MINUTE));
	assert!(limiter.reconfigure(50));
	assert_eq!(limiter.capacity(), 50);
	assert_eq!(limiter.available(), 50);
}
