//! Property tests for health counting and admission policy.
//!
//! Uses proptest to verify:
//! 1. Window totals: any mix of outcomes inside the window is counted exactly
//! 2. Expiry: outcomes older than the window never contribute
//! 3. Policy: the circuit opens only above both volume and error thresholds

use leaky_breaker::{HealthCounter, HealthSummary, MockClock, Options, State};
use proptest::prelude::*;
use std::time::Duration;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_outcomes() -> impl Strategy<Value = Vec<bool>> {
    prop::collection::vec(any::<bool>(), 0..60)
}

fn arb_window() -> impl Strategy<Value = i32> {
    1..=60_i32
}

fn summary_of(successes: u64, failures: u64) -> HealthSummary {
    let total = successes + failures;
    HealthSummary {
        successes,
        failures,
        total,
        error_percentage: if total > 0 {
            failures as f64 / total as f64 * 100.0
        } else {
            0.0
        },
        ..HealthSummary::default()
    }
}

// ── 1. Window totals ─────────────────────────────────────────────────

proptest! {
    /// N successes and M failures within the window give total N+M and
    /// an error percentage of 100*M/(N+M).
    #[test]
    fn totals_match_recorded_outcomes(outcomes in arb_outcomes(), window in arb_window()) {
        let clock = MockClock::new();
        let counter = HealthCounter::with_clock(window, clock.clone()).unwrap();

        for &failed in &outcomes {
            if failed {
                counter.record_failure().unwrap();
            } else {
                counter.record_success().unwrap();
            }
        }

        let failures = outcomes.iter().filter(|&&f| f).count() as u64;
        let successes = outcomes.len() as u64 - failures;
        let sum = counter.summary().unwrap();

        prop_assert_eq!(sum.total, successes + failures);
        prop_assert_eq!(sum.failures, failures);
        prop_assert_eq!(sum.successes, successes);
        prop_assert_eq!(sum.error_percentage, summary_of(successes, failures).error_percentage);
        prop_assert!((0.0..=100.0).contains(&sum.error_percentage));
    }
}

// ── 2. Expiry ────────────────────────────────────────────────────────

proptest! {
    /// Once every bucket is older than the window nothing is counted, and
    /// the next write starts from one.
    #[test]
    fn expired_outcomes_are_forgotten(outcomes in arb_outcomes(), window in arb_window()) {
        let clock = MockClock::new();
        let counter = HealthCounter::with_clock(window, clock.clone()).unwrap();

        for (i, &failed) in outcomes.iter().enumerate() {
            if i % 3 == 0 {
                // writes are stamped by the loop, drain them before moving time
                counter.summary().unwrap();
                clock.advance(Duration::from_millis(700));
            }
            if failed {
                counter.record_failure().unwrap();
            } else {
                counter.record_success().unwrap();
            }
        }

        counter.summary().unwrap();
        clock.advance(Duration::from_secs(window as u64) + Duration::from_millis(1));
        let sum = counter.summary().unwrap();
        prop_assert_eq!(sum.total, 0);
        prop_assert_eq!(sum.error_percentage, 0.0);

        counter.record_failure().unwrap();
        let sum = counter.summary().unwrap();
        prop_assert_eq!(sum.total, 1);
        prop_assert_eq!(sum.failures, 1);
    }
}

// ── 3. Policy ────────────────────────────────────────────────────────

proptest! {
    /// Open iff total >= minimum and error% >= threshold.
    #[test]
    fn opens_only_above_both_thresholds(
        successes in 0..100_u64,
        failures in 0..100_u64,
        minimum in 0..50_u64,
        threshold in 0.0..=100.0_f64,
    ) {
        let options = Options {
            errors_percentage: threshold,
            minimum_number_of_requests: minimum,
            number_of_seconds_to_store: 10,
        };
        let summary = summary_of(successes, failures);

        let expected = if summary.total >= minimum && summary.error_percentage >= threshold {
            State::Open
        } else {
            State::Closed
        };
        prop_assert_eq!(options.target_state(&summary), expected);
    }
}
