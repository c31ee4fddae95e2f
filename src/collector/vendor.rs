//! Vendor-neutral counter vocabulary and raw view-name mappings.
//!
//! The rate engine only understands the keys in [`keys`]. Each adapter maps
//! its native system-view names into this vocabulary and normalises units
//! (bytes, microseconds) before handing a snapshot over.

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Cumulative counters keyed by [`keys`] constants.
pub type Counters = HashMap<String, i64>;

/// Instantaneous gauges keyed by [`gauge_keys`] constants.
pub type Gauges = HashMap<String, f64>;

/// Block size used to derive byte counters from block counts on Tibero.
pub const TIBERO_BLOCK_SIZE: i64 = 8192;

/// Neutral cumulative counter keys.
pub mod keys {
    pub const EXECUTE_COUNT: &str = "execute_count";
    pub const LOGICAL_READS: &str = "logical_reads";
    pub const PHYSICAL_READS: &str = "physical_reads";
    pub const PHYSICAL_WRITES: &str = "physical_writes";
    pub const REDO_BYTES: &str = "redo_bytes";
    pub const COMMITS: &str = "commits";
    pub const ROLLBACKS: &str = "rollbacks";
    pub const PARSE_TOTAL: &str = "parse_total";
    pub const PARSE_HARD: &str = "parse_hard";
    pub const PHYSICAL_READ_BYTES: &str = "physical_read_bytes";
    pub const PHYSICAL_WRITE_BYTES: &str = "physical_write_bytes";
    /// Time-model: cumulative DB time, microseconds.
    pub const DB_TIME_US: &str = "db_time_us";
    /// Time-model: cumulative DB CPU, microseconds.
    pub const DB_CPU_US: &str = "db_cpu_us";
}

/// Neutral instantaneous gauge keys.
pub mod gauge_keys {
    pub const ACTIVE_SESSIONS: &str = "active_sessions";
    /// Centiseconds of DB time per second.
    pub const DB_TIME_PER_SEC: &str = "db_time_per_sec";
    /// Centiseconds of CPU per second.
    pub const CPU_TIME_PER_SEC: &str = "cpu_time_per_sec";
    pub const WAIT_TIME_RATIO: &str = "wait_time_ratio";
    pub const HOST_CPU_UTIL: &str = "host_cpu_util";
}

/// Supported database vendors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    Oracle,
    Tibero,
    Postgres,
}

impl Vendor {
    /// Label written into frames.
    pub fn label(&self) -> &'static str {
        match self {
            Vendor::Oracle => "oracle",
            Vendor::Tibero => "tibero",
            Vendor::Postgres => "postgres",
        }
    }

    /// Product name for the title bar.
    pub fn product_name(&self) -> &'static str {
        match self {
            Vendor::Oracle => "Oracle",
            Vendor::Tibero => "Tibero",
            Vendor::Postgres => "PostgreSQL",
        }
    }

    /// Maximum number of wait rows shown by default for this vendor.
    pub fn default_top_waits(&self) -> usize {
        match self {
            Vendor::Tibero => 13,
            _ => 12,
        }
    }
}

impl std::fmt::Display for Vendor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Vendor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "oracle" => Ok(Vendor::Oracle),
            "tibero" => Ok(Vendor::Tibero),
            "postgres" | "postgresql" | "pg" => Ok(Vendor::Postgres),
            other => Err(format!("unknown vendor '{}'", other)),
        }
    }
}

// ============================================================
// Oracle
// ============================================================

const ORACLE_SYSSTAT: &[(&str, &str)] = &[
    ("execute count", keys::EXECUTE_COUNT),
    ("session logical reads", keys::LOGICAL_READS),
    ("physical reads", keys::PHYSICAL_READS),
    ("physical writes", keys::PHYSICAL_WRITES),
    ("redo size", keys::REDO_BYTES),
    ("user commits", keys::COMMITS),
    ("user rollbacks", keys::ROLLBACKS),
    ("parse count (total)", keys::PARSE_TOTAL),
    ("parse count (hard)", keys::PARSE_HARD),
    ("physical read total bytes", keys::PHYSICAL_READ_BYTES),
    ("physical write total bytes", keys::PHYSICAL_WRITE_BYTES),
];

const ORACLE_TIME_MODEL: &[(&str, &str)] = &[
    ("DB time", keys::DB_TIME_US),
    ("DB CPU", keys::DB_CPU_US),
];

const ORACLE_SYSMETRIC: &[(&str, &str)] = &[
    ("Host CPU Utilization (%)", gauge_keys::HOST_CPU_UTIL),
    ("Average Active Sessions", gauge_keys::ACTIVE_SESSIONS),
    ("Database Time Per Sec", gauge_keys::DB_TIME_PER_SEC),
    ("CPU Usage Per Sec", gauge_keys::CPU_TIME_PER_SEC),
    ("Database Wait Time Ratio", gauge_keys::WAIT_TIME_RATIO),
];

/// Maps `v$sysstat` and `v$sys_time_model` rows into neutral counters.
///
/// Unknown names are ignored.
pub fn oracle_counters<'a, I>(rows: I) -> Counters
where
    I: IntoIterator<Item = (&'a str, i64)>,
{
    let mut out = Counters::new();
    for (name, value) in rows {
        if let Some(key) = lookup(ORACLE_SYSSTAT, name).or_else(|| lookup(ORACLE_TIME_MODEL, name))
        {
            out.insert(key.to_string(), value);
        }
    }
    out
}

/// Maps `v$sysmetric` rows into neutral gauges.
pub fn oracle_gauges<'a, I>(rows: I) -> Gauges
where
    I: IntoIterator<Item = (&'a str, f64)>,
{
    let mut out = Gauges::new();
    for (name, value) in rows {
        if let Some(key) = lookup(ORACLE_SYSMETRIC, name) {
            out.insert(key.to_string(), value);
        }
    }
    out
}

// ============================================================
// Tibero
// ============================================================

const TIBERO_SYSSTAT: &[(&str, &str)] = &[
    ("execute count", keys::EXECUTE_COUNT),
    ("logical reads", keys::LOGICAL_READS),
    ("physical reads", keys::PHYSICAL_READS),
    ("dbwr multi block writes - block count", keys::PHYSICAL_WRITES),
    ("redo log size", keys::REDO_BYTES),
    ("the number of user commits performed", keys::COMMITS),
    ("user rollbacks", keys::ROLLBACKS),
    ("parse count (total)", keys::PARSE_TOTAL),
    ("parse count (hard)", keys::PARSE_HARD),
];

const TIBERO_TIME_MODEL: &[(&str, &str)] = &[
    ("DB Time", keys::DB_TIME_US),
    ("DB CPU", keys::DB_CPU_US),
];

/// Maps Tibero `v$sysstat` and time-model rows into neutral counters.
///
/// Tibero exposes no byte counters; read/write bytes are derived from block
/// counts times [`TIBERO_BLOCK_SIZE`].
pub fn tibero_counters<'a, I>(rows: I) -> Counters
where
    I: IntoIterator<Item = (&'a str, i64)>,
{
    let mut out = Counters::new();
    for (name, value) in rows {
        if let Some(key) = lookup(TIBERO_SYSSTAT, name).or_else(|| lookup(TIBERO_TIME_MODEL, name))
        {
            out.insert(key.to_string(), value);
        }
    }
    if let Some(&reads) = out.get(keys::PHYSICAL_READS) {
        out.insert(
            keys::PHYSICAL_READ_BYTES.to_string(),
            reads.saturating_mul(TIBERO_BLOCK_SIZE),
        );
    }
    if let Some(&writes) = out.get(keys::PHYSICAL_WRITES) {
        out.insert(
            keys::PHYSICAL_WRITE_BYTES.to_string(),
            writes.saturating_mul(TIBERO_BLOCK_SIZE),
        );
    }
    out
}

fn lookup(table: &[(&str, &'static str)], name: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(raw, _)| *raw == name)
        .map(|(_, key)| *key)
}

// ============================================================
// Wait events
// ============================================================

/// Native unit of a vendor's cumulative wait time column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitTimeUnit {
    Microseconds,
    Centiseconds,
}

impl WaitTimeUnit {
    pub fn for_vendor(vendor: Vendor) -> Self {
        match vendor {
            Vendor::Tibero => WaitTimeUnit::Centiseconds,
            Vendor::Oracle | Vendor::Postgres => WaitTimeUnit::Microseconds,
        }
    }

    /// Converts a raw reading into microseconds.
    pub fn to_micros(&self, value: i64) -> i64 {
        match self {
            WaitTimeUnit::Microseconds => value,
            WaitTimeUnit::Centiseconds => value.saturating_mul(10_000),
        }
    }
}

/// Normalises a vendor wait-class label for display.
///
/// Tibero reports `STAT_CLASS_*` identifiers; other vendors already use
/// readable names and pass through unchanged.
pub fn normalize_wait_class(raw: &str) -> String {
    let Some(suffix) = raw.strip_prefix("STAT_CLASS_") else {
        return raw.to_string();
    };
    match suffix {
        "" => "Other".to_string(),
        "USER_IO" => "User I/O".to_string(),
        "SYSTEM_IO" => "System I/O".to_string(),
        _ => {
            let lower = suffix.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => "Other".to_string(),
            }
        }
    }
}

/// Returns `true` for wait classes that never count toward load.
pub fn is_idle_wait_class(class: &str) -> bool {
    matches!(class, "Idle" | "STAT_CLASS_IDLE" | "Activity")
}
