// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Exponential backoff schedule for sink initialization.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct BackoffPolicy {
	/// Total number of `initialize` calls before giving up.
	pub max_attempts: u32,
	pub base_delay: Duration,
	pub backoff_factor: f64,
	/// Upper bound on a single delay.
	pub max_delay: Duration,
	pub jitter: bool,
}

impl Default for BackoffPolicy {
	fn default() -> Self {
		Self {
			max_attempts: 3,
			base_delay: Duration::from_millis(1000),
			backoff_factor: 2.0,
			max_delay: Duration::from_secs(60),
			jitter: false,
		}
	}
}

impl BackoffPolicy {
	/// Delay to wait after `retry_count` failed attempts.
	///
	/// `retry_count` starts at 1 for the first retry, so the default policy
	/// waits 2s and then 4s.
	pub fn delay_for(&self, retry_count: u32) -> Duration {
		let exponential = self.base_delay.as_secs_f64() * self.backoff_factor.powi(retry_count as i32);
		let capped = exponential.min(self.max_delay.as_secs_f64());

		let delay = if self.jitter {
			capped * (0.5 + fastrand::f64())
		} else {
			capped
		};

		// NaN (a zero base times an infinite factor) and negatives fall back
		// to the cap.
		Duration::try_from_secs_f64(delay).unwrap_or(self.max_delay)
	}

	/// Whether another attempt is allowed after `retry_count` failures.
	pub fn should_retry(&self, retry_count: u32) -> bool {
		retry_count < self.max_attempts
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn test_default_schedule() {
		let policy = BackoffPolicy::default();
		assert_eq!(policy.delay_for(1), Duration::from_secs(2));
		assert_eq!(policy.delay_for(2), Duration::from_secs(4));
		assert!(policy.should_retry(1));
		assert!(policy.should_retry(2));
		assert!(!policy.should_retry(3));
	}

	#[test]
	fn test_max_delay_caps_growth() {
		let policy = BackoffPolicy {
			max_delay: Duration::from_secs(5),
			..Default::default()
		};
		assert_eq!(policy.delay_for(10), Duration::from_secs(5));
	}

	#[test]
	fn test_zero_base_never_panics_at_high_retry_counts() {
		let policy = BackoffPolicy {
			base_delay: Duration::ZERO,
			..Default::default()
		};
		assert_eq!(policy.delay_for(1), Duration::ZERO);
		assert!(policy.delay_for(1024) <= policy.max_delay);
		assert!(policy.delay_for(u32::MAX) <= policy.max_delay);
	}

	proptest! {
		#[test]
		fn delay_is_bounded_for_any_retry_count_and_base(
			retry in any::<u32>(),
			base_ms in prop_oneof![Just(0u64), 0u64..10_000, Just(u64::MAX / 1_000)],
			factor in prop_oneof![Just(2.0f64), 0.0f64..10.0, Just(f64::MAX)],
			jitter in any::<bool>(),
		) {
			let policy = BackoffPolicy {
				base_delay: Duration::from_millis(base_ms),
				backoff_factor: factor,
				jitter,
				..Default::default()
			};
			prop_assert!(policy.delay_for(retry) <= policy.max_delay.mul_f64(1.5));
		}

		#[test]
		fn delays_never_shrink_without_jitter(retry in 0u32..20) {
			let policy = BackoffPolicy::default();
			prop_assert!(policy.delay_for(retry + 1) >= policy.delay_for(retry));
		}

		#[test]
		fn jitter_stays_within_half_to_one_and_a_half(retry in 1u32..6) {
			let policy = BackoffPolicy { jitter: true, ..Default::default() };
			let base = BackoffPolicy::default().delay_for(retry).as_secs_f64();
			let jittered = policy.delay_for(retry).as_secs_f64();
			prop_assert!(jittered >= base * 0.5 - 1e-9);
			prop_assert!(jittered <= base * 1.5 + 1e-9);
		}
	}
}
