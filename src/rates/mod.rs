//! Rate computation over cumulative snapshots.
//!
//! [`SysRateState`] turns counter snapshots into per-second rates and derived
//! ratios; [`WaitRateState`] does the same for keyed wait-event totals and
//! ranks the result. Both keep the previous snapshot and replace it only after
//! the new rates have been computed from it.

pub mod sysstat;
pub mod waits;

pub use sysstat::{RateMapping, SysRateState, labels, metrics_from_rates};
pub use waits::WaitRateState;

use std::time::Instant;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Samples closer together than this are considered a burst.
pub const MIN_ELAPSED_SECS: f64 = 0.5;

/// Elapsed time substituted by the counter engine for bursty samples.
pub const BURST_ELAPSED_SECS: f64 = 1.0;

// ---------------------------------------------------------------------------
// Delta helpers
// ---------------------------------------------------------------------------

/// Compute i64 delta, returning `None` on counter regression (stats reset).
pub fn di64(curr: i64, prev: i64) -> Option<i64> {
    (curr >= prev).then_some(curr - prev)
}

/// Compute i64 delta, clamping a regression to zero.
pub fn clamped_delta(curr: i64, prev: i64) -> i64 {
    di64(curr, prev).unwrap_or(0)
}

/// Seconds between two instants; zero when `now` precedes `prev`.
pub fn elapsed_secs(prev: Instant, now: Instant) -> f64 {
    now.saturating_duration_since(prev).as_secs_f64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn regression_clamps_to_zero() {
        for (prev, cur) in [(10, 5), (i64::MAX, 0), (1, -1)] {
            assert_eq!(clamped_delta(cur, prev), 0);
            assert_eq!(di64(cur, prev), None);
        }
        assert_eq!(clamped_delta(250, 100), 150);
    }

    #[test]
    fn elapsed_never_negative() {
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_millis(1500);
        assert!((elapsed_secs(t0, t1) - 1.5).abs() < 1e-9);
        assert_eq!(elapsed_secs(t1, t0), 0.0);
    }
}
