//! Counter rate engine.
//!
//! Converts two consecutive counter snapshots into a [`RateMapping`] keyed by
//! human-readable labels. Vendors without a native gauge view get synthetic
//! gauges derived from the DB time / DB CPU time model; native gauges replace
//! them when present.

use std::collections::BTreeMap;
use std::time::Instant;

use super::{BURST_ELAPSED_SECS, MIN_ELAPSED_SECS, clamped_delta, elapsed_secs};
use crate::collector::vendor::{Counters, Gauges, gauge_keys, keys};
use crate::storage::model::Metrics;

/// Per-second rates keyed by [`labels`].
pub type RateMapping = BTreeMap<&'static str, f64>;

/// Rate labels emitted by [`SysRateState`].
pub mod labels {
    pub const EXECUTIONS: &str = "Executions Per Sec";
    pub const LOGICAL_READS: &str = "Logical Reads Per Sec";
    pub const PHYSICAL_READS: &str = "Physical Reads Per Sec";
    pub const PHYSICAL_WRITES: &str = "Physical Writes Per Sec";
    pub const REDO_GENERATED: &str = "Redo Generated Per Sec";
    pub const USER_COMMITS: &str = "User Commits Per Sec";
    pub const USER_ROLLBACKS: &str = "User Rollbacks Per Sec";
    pub const USER_TRANSACTIONS: &str = "User Transaction Per Sec";
    pub const PARSE_TOTAL: &str = "Total Parse Count Per Sec";
    pub const PARSE_HARD: &str = "Hard Parse Count Per Sec";
    pub const BUFFER_CACHE_HIT: &str = "Buffer Cache Hit Ratio";
    pub const PHYSICAL_READ_BYTES: &str = "Physical Read Total Bytes Per Sec";
    pub const PHYSICAL_WRITE_BYTES: &str = "Physical Write Total Bytes Per Sec";
    pub const AVERAGE_ACTIVE_SESSIONS: &str = "Average Active Sessions";
    pub const DB_TIME: &str = "Database Time Per Sec";
    pub const CPU_USAGE: &str = "CPU Usage Per Sec";
    pub const WAIT_TIME: &str = "Database Wait Time Per Sec";
    pub const WAIT_TIME_RATIO: &str = "Database Wait Time Ratio";
    pub const HOST_CPU: &str = "Host CPU Utilization (%)";

    /// Every label, in display order.
    pub const ALL: [&str; 19] = [
        AVERAGE_ACTIVE_SESSIONS,
        DB_TIME,
        CPU_USAGE,
        WAIT_TIME,
        WAIT_TIME_RATIO,
        HOST_CPU,
        EXECUTIONS,
        LOGICAL_READS,
        PHYSICAL_READS,
        PHYSICAL_WRITES,
        PHYSICAL_READ_BYTES,
        PHYSICAL_WRITE_BYTES,
        REDO_GENERATED,
        USER_COMMITS,
        USER_ROLLBACKS,
        USER_TRANSACTIONS,
        PARSE_TOTAL,
        PARSE_HARD,
        BUFFER_CACHE_HIT,
    ];
}

/// Throughput counters and the label their rate is published under.
const THROUGHPUT: &[(&str, &str)] = &[
    (keys::EXECUTE_COUNT, labels::EXECUTIONS),
    (keys::LOGICAL_READS, labels::LOGICAL_READS),
    (keys::PHYSICAL_READS, labels::PHYSICAL_READS),
    (keys::PHYSICAL_WRITES, labels::PHYSICAL_WRITES),
    (keys::REDO_BYTES, labels::REDO_GENERATED),
    (keys::COMMITS, labels::USER_COMMITS),
    (keys::ROLLBACKS, labels::USER_ROLLBACKS),
    (keys::PARSE_TOTAL, labels::PARSE_TOTAL),
    (keys::PARSE_HARD, labels::PARSE_HARD),
    (keys::PHYSICAL_READ_BYTES, labels::PHYSICAL_READ_BYTES),
    (keys::PHYSICAL_WRITE_BYTES, labels::PHYSICAL_WRITE_BYTES),
];

/// Native gauges and the label they override.
const NATIVE_GAUGES: &[(&str, &str)] = &[
    (gauge_keys::ACTIVE_SESSIONS, labels::AVERAGE_ACTIVE_SESSIONS),
    (gauge_keys::DB_TIME_PER_SEC, labels::DB_TIME),
    (gauge_keys::CPU_TIME_PER_SEC, labels::CPU_USAGE),
    (gauge_keys::WAIT_TIME_RATIO, labels::WAIT_TIME_RATIO),
    (gauge_keys::HOST_CPU_UTIL, labels::HOST_CPU),
];

const MICROS_PER_SEC: f64 = 1_000_000.0;
const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Rate tracking state for cumulative counters.
#[derive(Debug, Default)]
pub struct SysRateState {
    prev_sample: Option<Counters>,
    prev_ts: Option<Instant>,
}

impl SysRateState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` once a baseline snapshot has been stored.
    pub fn has_baseline(&self) -> bool {
        self.prev_sample.is_some()
    }


    /// Computes rates against the stored snapshot, then stores `counters`.
    ///
    /// The first call only stores the baseline and returns every label at
    /// `0.0`. Samples less than half a second apart are rated over one
    /// second.
    pub fn compute_at(
        &mut self,
        counters: &Counters,
        gauges: Option<&Gauges>,
        now: Instant,
    ) -> RateMapping {
        let (Some(prev), Some(prev_ts)) = (self.prev_sample.as_ref(), self.prev_ts) else {
            self.store(counters, now);
            return zero_rates();
        };

        let mut elapsed = elapsed_secs(prev_ts, now);
        if elapsed < MIN_ELAPSED_SECS {
            elapsed = BURST_ELAPSED_SECS;
        }

        let delta = |key: &str| -> f64 {
            let cur = counters.get(key).copied().unwrap_or(0);
            let old = prev.get(key).copied().unwrap_or(0);
            clamped_delta(cur, old) as f64
        };

        let mut rates = zero_rates();
        for &(key, label) in THROUGHPUT {
            rates.insert(label, delta(key) / elapsed);
        }

        let d_logical = delta(keys::LOGICAL_READS);
        let d_physical = delta(keys::PHYSICAL_READS);
        rates.insert(labels::BUFFER_CACHE_HIT, buffer_cache_hit(d_logical, d_physical));

        // Synthetic gauges from the time model, in centiseconds per second.
        let aas = delta(keys::DB_TIME_US) / elapsed / MICROS_PER_SEC;
        rates.insert(labels::AVERAGE_ACTIVE_SESSIONS, aas);
        rates.insert(labels::DB_TIME, aas * 100.0);
        rates.insert(
            labels::CPU_USAGE,
            delta(keys::DB_CPU_US) / elapsed / MICROS_PER_SEC * 100.0,
        );

        if let Some(gauges) = gauges {
            for &(key, label) in NATIVE_GAUGES {
                if let Some(&v) = gauges.get(key)
                    && v.is_finite()
                {
                    rates.insert(label, v.max(0.0));
                }
            }
        }

        let db_time = rates[labels::DB_TIME];
        let cpu = rates[labels::CPU_USAGE];
        rates.insert(labels::WAIT_TIME, (db_time - cpu).max(0.0));
        rates.insert(
            labels::USER_TRANSACTIONS,
            rates[labels::USER_COMMITS] + rates[labels::USER_ROLLBACKS],
        );

        self.store(counters, now);
        rates
    }

    fn store(&mut self, counters: &Counters, now: Instant) {
        self.prev_sample = Some(counters.clone());
        self.prev_ts = Some(now);
    }
}

/// Every label at zero.
fn zero_rates() -> RateMapping {
    labels::ALL.iter().map(|&l| (l, 0.0)).collect()
}

/// Buffer cache hit percentage from logical and physical read deltas.
pub fn buffer_cache_hit(d_logical: f64, d_physical: f64) -> f64 {
    if d_logical > 0.0 {
        ((1.0 - d_physical / d_logical) * 100.0).max(0.0)
    } else {
        0.0
    }
}

/// Flattens a rate mapping into renderer units (MB/s for byte rates).
pub fn metrics_from_rates(rates: &RateMapping) -> Metrics {
    let r = |label: &str| rates.get(label).copied().unwrap_or(0.0);
    Metrics {
        active_sessions: r(labels::AVERAGE_ACTIVE_SESSIONS),
        db_time_per_sec: r(labels::DB_TIME),
        cpu_time_per_sec: r(labels::CPU_USAGE),
        wait_time_per_sec: r(labels::WAIT_TIME),
        wait_time_ratio: r(labels::WAIT_TIME_RATIO),
        host_cpu_util: r(labels::HOST_CPU),
        sql_exec_per_sec: r(labels::EXECUTIONS),
        logical_reads_per_sec: r(labels::LOGICAL_READS),
        physical_reads_per_sec: r(labels::PHYSICAL_READS),
        physical_writes_per_sec: r(labels::PHYSICAL_WRITES),
        physical_read_mb_per_sec: r(labels::PHYSICAL_READ_BYTES) / BYTES_PER_MB,
        physical_write_mb_per_sec: r(labels::PHYSICAL_WRITE_BYTES) / BYTES_PER_MB,
        redo_mb_per_sec: r(labels::REDO_GENERATED) / BYTES_PER_MB,
        commits_per_sec: r(labels::USER_COMMITS),
        rollbacks_per_sec: r(labels::USER_ROLLBACKS),
        tran_per_sec: r(labels::USER_TRANSACTIONS),
        parse_total_per_sec: r(labels::PARSE_TOTAL),
        hard_parses_per_sec: r(labels::PARSE_HARD),
        buffer_cache_hit: r(labels::BUFFER_CACHE_HIT),
    }
}
