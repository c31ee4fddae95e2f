//! Pre-built mock workloads.
//!
//! A [`Workload`] produces a deterministic, gently oscillating stream of
//! cumulative counters, wait totals, sessions and top SQL, used by `--demo`
//! and by tests that need a realistic multi-cycle run.

use super::{MockSource, MockStep};
use crate::collector::traits::WaitTotal;
use crate::collector::vendor::{Counters, Gauges, Vendor, gauge_keys, keys};
use crate::storage::model::{HotspotRow, SessionRow};

/// Assumed seconds between generated steps.
const STEP_SECS: f64 = 6.0;

/// Per-second base rate of each counter.
const COUNTER_RATES: &[(&str, f64)] = &[
    (keys::EXECUTE_COUNT, 850.0),
    (keys::LOGICAL_READS, 42_000.0),
    (keys::PHYSICAL_READS, 1_200.0),
    (keys::PHYSICAL_WRITES, 310.0),
    (keys::REDO_BYTES, 1_500_000.0),
    (keys::COMMITS, 120.0),
    (keys::ROLLBACKS, 2.0),
    (keys::PARSE_TOTAL, 400.0),
    (keys::PARSE_HARD, 3.0),
    (keys::PHYSICAL_READ_BYTES, 1_200.0 * 8192.0),
    (keys::PHYSICAL_WRITE_BYTES, 310.0 * 8192.0),
    (keys::DB_TIME_US, 2_400_000.0),
    (keys::DB_CPU_US, 1_100_000.0),
];

/// `(wait_class, event, µs per second, waits per second)`.
const WAIT_RATES: &[(&str, &str, f64, f64)] = &[
    ("User I/O", "db file sequential read", 520_000.0, 900.0),
    ("User I/O", "db file scattered read", 140_000.0, 60.0),
    ("Commit", "log file sync", 180_000.0, 120.0),
    ("Concurrency", "latch: cache buffers chains", 45_000.0, 30.0),
    ("System I/O", "log file parallel write", 90_000.0, 110.0),
    ("Application", "enq: TX - row lock contention", 60_000.0, 1.0),
    ("Network", "SQL*Net more data from client", 8_000.0, 40.0),
];

const STATEMENTS: &[(&str, i64, &str)] = &[
    ("9babjv8yq8ru3", 3_036_571_524, "SELECT * FROM orders WHERE customer_id = :1"),
    ("4ztz048yfq32s", 1_388_734_953, "UPDATE stock SET qty = qty - :1 WHERE item_id = :2"),
    ("a5ks9fhw2v9s1", 2_971_124_088, "INSERT INTO order_lines VALUES (:1, :2, :3, :4)"),
    ("0w2qpuc6u2zsp", 4_112_009_771, "SELECT SUM(amount) FROM payments WHERE ts > :1"),
    ("7hys3h7ysgf9m", 905_114_240, "DELETE FROM sessions_tmp WHERE expires < SYSDATE"),
];

/// Deterministic synthetic workload.
#[derive(Debug, Clone)]
pub struct Workload {
    vendor: Vendor,
}

impl Workload {
    pub fn new(vendor: Vendor) -> Self {
        Self { vendor }
    }

    /// Load factor of step `k`, oscillating around 1.0.
    fn factor(&self, k: usize) -> f64 {
        let k = k as f64;
        1.0 + 0.35 * (k * 0.37).sin() + 0.15 * (k * 1.3).cos()
    }

    /// Sum of load factors over steps `1..=n`.
    fn cumulative(&self, n: usize) -> f64 {
        (1..=n).map(|k| self.factor(k)).sum()
    }

    /// Produces the snapshot for step `n`.
    pub fn step(&self, n: usize) -> MockStep {
        let load = self.cumulative(n) * STEP_SECS;

        let mut counters = Counters::new();
        for &(key, rate) in COUNTER_RATES {
            // Baseline so the first snapshot is not all zeros.
            let base = rate * 3600.0;
            counters.insert(key.to_string(), (base + rate * load) as i64);
        }

        let waits = WAIT_RATES
            .iter()
            .enumerate()
            .map(|(i, &(class, event, us, count))| {
                // Phase-shifted per event so the ranking changes over time.
                let shifted: f64 = (1..=n).map(|k| self.factor(k + i * 3)).sum();
                let t = us * 3600.0 + us * shifted * STEP_SECS;
                let c = count * 3600.0 + count * load;
                WaitTotal::new(class, event, t as i64, c as i64)
            })
            .collect();

        let gauges = match self.vendor {
            Vendor::Oracle => {
                let f = self.factor(n);
                let mut g = Gauges::new();
                g.insert(gauge_keys::ACTIVE_SESSIONS.to_string(), 2.4 * f);
                g.insert(gauge_keys::DB_TIME_PER_SEC.to_string(), 240.0 * f);
                g.insert(gauge_keys::CPU_TIME_PER_SEC.to_string(), 110.0 * f);
                g.insert(gauge_keys::WAIT_TIME_RATIO.to_string(), 54.0);
                g.insert(gauge_keys::HOST_CPU_UTIL.to_string(), (38.0 * f).min(100.0));
                Some(g)
            }
            Vendor::Tibero | Vendor::Postgres => None,
        };

        MockStep {
            counters,
            gauges,
            waits,
            sessions: self.sessions(n),
            hotspots: self.hotspots(load),
        }
    }

    fn sessions(&self, n: usize) -> Vec<SessionRow> {
        let active = 4 + (self.factor(n) * 6.0) as usize;
        (0..active)
            .map(|i| {
                let (class, event, _, _) = WAIT_RATES[(n + i) % WAIT_RATES.len()];
                let (sql_id, _, text) = STATEMENTS[(n / 2 + i) % STATEMENTS.len()];
                SessionRow {
                    sid: 100 + i as i64,
                    serial: 4000 + (i as i64) * 17,
                    username: if i % 3 == 0 { "BATCH" } else { "APP" }.to_string(),
                    status: "ACTIVE".to_string(),
                    event: event.to_string(),
                    wait_class: class.to_string(),
                    blocking_sid: (class == "Application" && i > 0).then_some(100),
                    sql_id: sql_id.to_string(),
                    seconds_in_wait: ((n + i * 7) % 13) as i64,
                    program: format!("app-server-{}", i % 4),
                    sql_text: text.to_string(),
                }
            })
            .collect()
    }

    fn hotspots(&self, load: f64) -> Vec<HotspotRow> {
        STATEMENTS
            .iter()
            .enumerate()
            .map(|(i, &(sql_id, plan_hash, text))| {
                let weight = 1.0 / (i as f64 + 1.0);
                let executions = (load * 40.0 * weight) as i64 + 1;
                HotspotRow {
                    sql_id: sql_id.to_string(),
                    plan_hash,
                    elapsed_sec: load * 0.8 * weight,
                    cpu_sec: load * 0.35 * weight,
                    executions,
                    buffer_gets: executions * 120,
                    disk_reads: executions * 3,
                    rows_processed: executions * 10,
                    sql_text: text.to_string(),
                }
            })
            .collect()
    }
}

impl MockSource {
    /// Endless demo workload for `vendor`.
    pub fn demo(vendor: Vendor) -> Self {
        MockSource::generated(vendor, Workload::new(vendor))
            .with_instance_name(&format!("DEMO_{}", vendor.label().to_uppercase()))
    }
}
