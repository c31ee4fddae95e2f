//! Wait-event delta tracker.
//!
//! Keyed twin of the counter engine: events appear and disappear between
//! snapshots, and only events with activity in the interval are reported.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::time::Instant;

use super::{MIN_ELAPSED_SECS, elapsed_secs};
use crate::collector::traits::WaitTotal;
use crate::storage::model::WaitRow;

/// Default number of ranked rows.
pub const DEFAULT_TOP_WAITS: usize = 12;

#[derive(Debug, Clone, Copy)]
struct WaitSample {
    time_us: i64,
    waits: i64,
}

/// Rate tracking state for wait events, keyed by event name.
#[derive(Debug)]
pub struct WaitRateState {
    prev_sample: HashMap<String, WaitSample>,
    prev_ts: Option<Instant>,
    top: usize,
}

impl Default for WaitRateState {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_WAITS)
    }
}

impl WaitRateState {
    /// Creates a tracker returning at most `top` rows.
    pub fn new(top: usize) -> Self {
        Self {
            prev_sample: HashMap::new(),
            prev_ts: None,
            top,
        }
    }

    /// Ranks wait activity since the previous snapshot.
    ///
    /// The first call stores a baseline and returns nothing. A call less than
    /// half a second after the baseline returns nothing and keeps the old
    /// baseline. Events with no added wait time are omitted. Rows are ordered
    /// by wait seconds per second descending, then event name ascending.
    pub fn compute_at(&mut self, totals: &[WaitTotal], now: Instant) -> Vec<WaitRow> {
        let Some(prev_ts) = self.prev_ts else {
            self.store(totals, now);
            return Vec::new();
        };

        let elapsed = elapsed_secs(prev_ts, now);
        if elapsed < MIN_ELAPSED_SECS {
            return Vec::new();
        }

        let mut rows: Vec<WaitRow> = totals
            .iter()
            .filter_map(|cur| {
                let prev = self.prev_sample.get(&cur.event).copied().unwrap_or(WaitSample {
                    time_us: 0,
                    waits: 0,
                });
                let d_time = cur.time_waited_us.saturating_sub(prev.time_us);
                let d_waits = cur.total_waits.saturating_sub(prev.waits);
                if d_time <= 0 || d_waits < 0 {
                    return None;
                }
                let d_time_ms = d_time as f64 / 1000.0;
                Some(WaitRow {
                    wait_class: cur.wait_class.clone(),
                    event: cur.event.clone(),
                    wait_sec_per_sec: d_time as f64 / 1_000_000.0 / elapsed,
                    waits_per_sec: d_waits as f64 / elapsed,
                    avg_wait_ms: if d_waits > 0 {
                        d_time_ms / d_waits as f64
                    } else {
                        0.0
                    },
                })
            })
            .collect();

        rows.sort_by(|a, b| {
            b.wait_sec_per_sec
                .partial_cmp(&a.wait_sec_per_sec)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.event.cmp(&b.event))
        });
        rows.truncate(self.top);

        self.store(totals, now);
        rows
    }

    fn store(&mut self, totals: &[WaitTotal], now: Instant) {
        self.prev_sample.clear();
        for t in totals {
            self.prev_sample.insert(
                t.event.clone(),
                WaitSample {
                    time_us: t.time_waited_us,
                    waits: t.total_waits,
                },
            );
        }
        self.prev_ts = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn first_call_is_empty() {
        let mut st = WaitRateState::default();
        let rows = st.compute_at(
            &[WaitTotal::new("User I/O", "X", 1_000_000, 10)],
            Instant::now(),
        );
        assert!(rows.is_empty());
    }

    #[test]
    fn per_second_intensity_and_average() {
        let mut st = WaitRateState::default();
        let t0 = Instant::now();
        st.compute_at(&[WaitTotal::new("User I/O", "X", 1_000_000, 10)], t0);
        let rows = st.compute_at(
            &[WaitTotal::new("User I/O", "X", 1_500_000, 12)],
            t0 + Duration::from_secs(1),
        );
        assert_eq!(rows.len(), 1);
        assert!(approx(rows[0].wait_sec_per_sec, 0.5));
        assert!(approx(rows[0].waits_per_sec, 2.0));
        assert!(approx(rows[0].avg_wait_ms, 250.0));
    }

    #[test]
    fn burst_returns_empty_and_keeps_baseline() {
        let mut st = WaitRateState::default();
        let t0 = Instant::now();
        st.compute_at(&[WaitTotal::new("c", "X", 0, 0)], t0);
        let burst = st.compute_at(
            &[WaitTotal::new("c", "X", 400_000, 4)],
            t0 + Duration::from_millis(300),
        );
        assert!(burst.is_empty());

        let rows = st.compute_at(
            &[WaitTotal::new("c", "X", 1_000_000, 10)],
            t0 + Duration::from_secs(2),
        );
        // Measured against the t0 baseline, not the burst sample.
        assert!(approx(rows[0].wait_sec_per_sec, 0.5));
    }

    #[test]
    fn inactive_and_regressed_events_are_omitted() {
        let mut st = WaitRateState::default();
        let t0 = Instant::now();
        st.compute_at(
            &[
                WaitTotal::new("c", "idle-ish", 500, 5),
                WaitTotal::new("c", "reset", 9_000, 90),
            ],
            t0,
        );
        let rows = st.compute_at(
            &[
                WaitTotal::new("c", "idle-ish", 500, 5),
                WaitTotal::new("c", "reset", 100, 1),
                WaitTotal::new("c", "fresh", 2_000, 0),
            ],
            t0 + Duration::from_secs(1),
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].event, "fresh");
        assert_eq!(rows[0].avg_wait_ms, 0.0);
    }

    #[test]
    fn ranked_capped_and_ties_by_name() {
        let mut st = WaitRateState::new(3);
        let t0 = Instant::now();
        st.compute_at(&[], t0);
        let totals = vec![
            WaitTotal::new("c", "b", 1_000, 1),
            WaitTotal::new("c", "a", 1_000, 1),
            WaitTotal::new("c", "top", 9_000, 1),
            WaitTotal::new("c", "low", 10, 1),
        ];
        let rows = st.compute_at(&totals, t0 + Duration::from_secs(1));
        let names: Vec<&str> = rows.iter().map(|r| r.event.as_str()).collect();
        assert_eq!(names, vec!["top", "a", "b"]);
    }

    #[test]
    fn vanished_events_do_not_linger() {
        let mut st = WaitRateState::default();
        let t0 = Instant::now();
        st.compute_at(&[WaitTotal::new("c", "gone", 1_000, 1)], t0);
        st.compute_at(&[], t0 + Duration::from_secs(1));
        // Reappearing event is measured from zero again.
        let rows = st.compute_at(
            &[WaitTotal::new("c", "gone", 1_000, 1)],
            t0 + Duration::from_secs(2),
        );
        assert_eq!(rows.len(), 1);
        assert!(approx(rows[0].wait_sec_per_sec, 0.001));
    }
}
