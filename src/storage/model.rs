//! Frame data model.
//!
//! A [`Frame`] is one cycle's worth of metrics, sessions, waits and SQL
//! hotspots together with per-section provenance. Frames are written to the
//! frame log as one JSON object per line and read back by the reporter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::collector::Vendor;

/// Record discriminator written as `"type"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    #[default]
    Frame,
}

/// Overall health of a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollectorState {
    #[serde(rename = "ON")]
    On,
    #[serde(rename = "ERR")]
    Err,
}

impl CollectorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectorState::On => "ON",
            CollectorState::Err => "ERR",
        }
    }
}

/// Where a section's data came from this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Live fetch succeeded.
    Collector,
    /// Fetch failed or was skipped; the section holds a fallback value.
    Synthetic,
}

impl Provenance {
    pub fn from_ok(ok: bool) -> Self {
        if ok {
            Provenance::Collector
        } else {
            Provenance::Synthetic
        }
    }

    pub fn is_backed(&self) -> bool {
        *self == Provenance::Collector
    }
}

/// Per-section provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSources {
    pub metrics: Provenance,
    pub sessions: Provenance,
    pub wait_events: Provenance,
    pub sql_hotspots: Provenance,
}

impl DataSources {
    /// All sections degraded.
    pub fn degraded() -> Self {
        Self {
            metrics: Provenance::Synthetic,
            sessions: Provenance::Synthetic,
            wait_events: Provenance::Synthetic,
            sql_hotspots: Provenance::Synthetic,
        }
    }

    pub fn any_backed(&self) -> bool {
        self.metrics.is_backed()
            || self.sessions.is_backed()
            || self.wait_events.is_backed()
            || self.sql_hotspots.is_backed()
    }
}

/// Flat per-cycle metrics in renderer-friendly units.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub active_sessions: f64,
    pub db_time_per_sec: f64,
    pub cpu_time_per_sec: f64,
    pub wait_time_per_sec: f64,
    pub wait_time_ratio: f64,
    pub host_cpu_util: f64,
    pub sql_exec_per_sec: f64,
    pub logical_reads_per_sec: f64,
    pub physical_reads_per_sec: f64,
    pub physical_writes_per_sec: f64,
    pub physical_read_mb_per_sec: f64,
    pub physical_write_mb_per_sec: f64,
    pub redo_mb_per_sec: f64,
    pub commits_per_sec: f64,
    pub rollbacks_per_sec: f64,
    pub tran_per_sec: f64,
    pub parse_total_per_sec: f64,
    pub hard_parses_per_sec: f64,
    pub buffer_cache_hit: f64,
}

impl Metrics {
    /// Metric names in display order.
    pub const NAMES: [&'static str; 19] = [
        "active_sessions",
        "db_time_per_sec",
        "cpu_time_per_sec",
        "wait_time_per_sec",
        "wait_time_ratio",
        "host_cpu_util",
        "sql_exec_per_sec",
        "logical_reads_per_sec",
        "physical_reads_per_sec",
        "physical_writes_per_sec",
        "physical_read_mb_per_sec",
        "physical_write_mb_per_sec",
        "redo_mb_per_sec",
        "commits_per_sec",
        "rollbacks_per_sec",
        "tran_per_sec",
        "parse_total_per_sec",
        "hard_parses_per_sec",
        "buffer_cache_hit",
    ];

    /// Looks up a metric by its flat name.
    pub fn get(&self, name: &str) -> Option<f64> {
        let v = match name {
            "active_sessions" => self.active_sessions,
            "db_time_per_sec" => self.db_time_per_sec,
            "cpu_time_per_sec" => self.cpu_time_per_sec,
            "wait_time_per_sec" => self.wait_time_per_sec,
            "wait_time_ratio" => self.wait_time_ratio,
            "host_cpu_util" => self.host_cpu_util,
            "sql_exec_per_sec" => self.sql_exec_per_sec,
            "logical_reads_per_sec" => self.logical_reads_per_sec,
            "physical_reads_per_sec" => self.physical_reads_per_sec,
            "physical_writes_per_sec" => self.physical_writes_per_sec,
            "physical_read_mb_per_sec" => self.physical_read_mb_per_sec,
            "physical_write_mb_per_sec" => self.physical_write_mb_per_sec,
            "redo_mb_per_sec" => self.redo_mb_per_sec,
            "commits_per_sec" => self.commits_per_sec,
            "rollbacks_per_sec" => self.rollbacks_per_sec,
            "tran_per_sec" => self.tran_per_sec,
            "parse_total_per_sec" => self.parse_total_per_sec,
            "hard_parses_per_sec" => self.hard_parses_per_sec,
            "buffer_cache_hit" => self.buffer_cache_hit,
            _ => return None,
        };
        Some(v)
    }

    /// Iterates `(name, value)` pairs in display order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        Self::NAMES
            .iter()
            .filter_map(move |name| self.get(name).map(|v| (*name, v)))
    }
}

/// One ranked wait-event row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitRow {
    pub wait_class: String,
    pub event: String,
    pub wait_sec_per_sec: f64,
    pub waits_per_sec: f64,
    pub avg_wait_ms: f64,
}

/// One active user session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionRow {
    pub sid: i64,
    pub serial: i64,
    pub username: String,
    pub status: String,
    pub event: String,
    pub wait_class: String,
    pub blocking_sid: Option<i64>,
    pub sql_id: String,
    pub seconds_in_wait: i64,
    pub program: String,
    pub sql_text: String,
}

/// One top-SQL row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HotspotRow {
    pub sql_id: String,
    pub plan_hash: i64,
    pub elapsed_sec: f64,
    pub cpu_sec: f64,
    pub executions: i64,
    pub buffer_gets: i64,
    pub disk_reads: i64,
    pub rows_processed: i64,
    pub sql_text: String,
}

/// One recorded cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    #[serde(rename = "type", default)]
    pub record_type: RecordType,
    pub timestamp: DateTime<Utc>,
    pub db_type: Vendor,
    pub instance_name: String,
    pub collector_state: CollectorState,
    pub data_sources: DataSources,
    pub metrics: Metrics,
    pub sessions: Vec<SessionRow>,
    pub wait_events: Vec<WaitRow>,
    pub sql_hotspots: Vec<HotspotRow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_frame() -> Frame {
        Frame {
            record_type: RecordType::Frame,
            timestamp: DateTime::parse_from_rfc3339("2026-03-01T10:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            db_type: Vendor::Postgres,
            instance_name: "main".into(),
            collector_state: CollectorState::On,
            data_sources: DataSources {
                metrics: Provenance::Collector,
                sessions: Provenance::Collector,
                wait_events: Provenance::Synthetic,
                sql_hotspots: Provenance::Collector,
            },
            metrics: Metrics {
                sql_exec_per_sec: 150.0,
                ..Default::default()
            },
            sessions: Vec::new(),
            wait_events: Vec::new(),
            sql_hotspots: Vec::new(),
            last_error: None,
        }
    }

    #[test]
    fn frame_json_uses_wire_labels() {
        let json = serde_json::to_value(sample_frame()).unwrap();
        assert_eq!(json["type"], "frame");
        assert_eq!(json["db_type"], "postgres");
        assert_eq!(json["collector_state"], "ON");
        assert_eq!(json["data_sources"]["metrics"], "collector");
        assert_eq!(json["data_sources"]["wait_events"], "synthetic");
        assert_eq!(json["metrics"]["sql_exec_per_sec"], 150.0);
        assert!(json.get("last_error").is_none());
    }

    #[test]
    fn metrics_iter_covers_every_name() {
        let m = Metrics::default();
        assert_eq!(m.iter().count(), Metrics::NAMES.len());
        assert!(m.get("no_such_metric").is_none());
    }

    #[test]
    fn data_sources_any_backed() {
        assert!(!DataSources::degraded().any_backed());
        let mut ds = DataSources::degraded();
        ds.sessions = Provenance::Collector;
        assert!(ds.any_backed());
    }
}
