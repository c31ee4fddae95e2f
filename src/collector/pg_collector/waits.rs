//! Sampled wait-event totals for PostgreSQL.
//!
//! PostgreSQL keeps no cumulative wait counters, so each fetch samples
//! `pg_stat_activity` and adds `sessions × elapsed` to a running total per
//! event. The totals behave like the cumulative views of other vendors and
//! feed the same wait tracker.

use std::collections::HashMap;
use std::time::Instant;

use crate::collector::traits::WaitTotal;
use crate::collector::vendor::is_idle_wait_class;

/// Running totals built from periodic activity samples.
#[derive(Debug, Default)]
pub(crate) struct WaitSampler {
    /// (wait_class, event) -> (time µs, waits)
    totals: HashMap<(String, String), (i64, i64)>,
    last_sample: Option<Instant>,
}

impl WaitSampler {
    /// Folds one sample of `(wait_class, event, waiting sessions)` rows into
    /// the running totals and returns them.
    pub(crate) fn sample<I>(&mut self, rows: I, now: Instant) -> Vec<WaitTotal>
    where
        I: IntoIterator<Item = (String, String, i64)>,
    {
        let dt_us = self
            .last_sample
            .map_or(0, |t| now.saturating_duration_since(t).as_micros() as i64);
        self.last_sample = Some(now);

        for (class, event, sessions) in rows {
            if is_idle_wait_class(&class) || sessions <= 0 {
                continue;
            }
            let entry = self.totals.entry((class, event)).or_insert((0, 0));
            entry.0 = entry.0.saturating_add(sessions.saturating_mul(dt_us));
            entry.1 = entry.1.saturating_add(sessions);
        }

        self.totals
            .iter()
            .map(|((class, event), &(time_us, waits))| WaitTotal::new(class, event, time_us, waits))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn row(class: &str, event: &str, n: i64) -> (String, String, i64) {
        (class.to_string(), event.to_string(), n)
    }

    #[test]
    fn first_sample_accrues_no_time() {
        let mut s = WaitSampler::default();
        let totals = s.sample(vec![row("IO", "DataFileRead", 3)], Instant::now());
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].time_waited_us, 0);
        assert_eq!(totals[0].total_waits, 3);
    }

    #[test]
    fn time_scales_with_sessions_and_interval() {
        let mut s = WaitSampler::default();
        let t0 = Instant::now();
        s.sample(vec![row("Lock", "transactionid", 1)], t0);
        let totals = s.sample(
            vec![row("Lock", "transactionid", 2)],
            t0 + Duration::from_secs(2),
        );
        assert_eq!(totals[0].time_waited_us, 4_000_000);
        assert_eq!(totals[0].total_waits, 3);
    }

    #[test]
    fn idle_classes_are_ignored() {
        let mut s = WaitSampler::default();
        let totals = s.sample(vec![row("Activity", "WalWriterMain", 1)], Instant::now());
        assert!(totals.is_empty());
    }
}
