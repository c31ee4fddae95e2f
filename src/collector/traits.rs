//! Snapshot source abstraction.
//!
//! The `SnapshotSource` trait is the only seam between the metrics engine and a
//! database. An adapter issues vendor queries, translates native view rows into
//! the vendor-neutral vocabulary from [`super::vendor`], and hands back plain
//! snapshots. Every fetch is independently fallible so the poll loop can isolate
//! a failing section from the rest of the cycle.

use serde::{Deserialize, Serialize};

use super::vendor::{Counters, Gauges, Vendor};
use crate::storage::model::{HotspotRow, SessionRow};

/// Error types returned by a snapshot source.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceError {
    /// The connection itself is gone (closed socket, server shutdown).
    /// Moves the poll loop into its reconnect state.
    Connection(String),
    /// A single query failed; the connection is still usable.
    Query(String),
    /// Connection settings are missing or invalid.
    Config(String),
}

impl SourceError {
    /// Returns `true` if the error means the connection must be reacquired.
    pub fn is_connection_lost(&self) -> bool {
        matches!(self, SourceError::Connection(_))
    }
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::Connection(msg) => write!(f, "connection error: {}", msg),
            SourceError::Query(msg) => write!(f, "query error: {}", msg),
            SourceError::Config(msg) => write!(f, "configuration error: {}", msg),
        }
    }
}

impl std::error::Error for SourceError {}

/// Data-bearing fetches of one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Counters,
    Gauges,
    Waits,
    Sessions,
    Hotspots,
}

impl Section {
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Counters => "counters",
            Section::Gauges => "gauges",
            Section::Waits => "waits",
            Section::Sessions => "sessions",
            Section::Hotspots => "hotspots",
        }
    }
}

/// One cumulative wait-event reading, already normalized to microseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct WaitTotal {
    pub wait_class: String,
    pub event: String,
    /// Cumulative time waited, microseconds.
    pub time_waited_us: i64,
    /// Cumulative number of waits.
    pub total_waits: i64,
}

impl WaitTotal {
    pub fn new(wait_class: &str, event: &str, time_waited_us: i64, total_waits: i64) -> Self {
        Self {
            wait_class: wait_class.to_string(),
            event: event.to_string(),
            time_waited_us,
            total_waits,
        }
    }
}

/// Identity of the monitored instance, fetched once per connection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceInfo {
    pub instance_name: String,
    pub host_name: String,
    pub version: String,
}

/// Abstraction for a vendor-specific data source.
///
/// Implementations hold at most one connection. The poll loop drives them from
/// a single thread, one call at a time.
pub trait SnapshotSource: Send {
    /// Vendor whose vocabulary this source emits.
    fn vendor(&self) -> Vendor;

    /// Establishes the connection. Calling it while connected is a no-op.
    fn connect(&mut self) -> Result<(), SourceError>;

    /// Drops the current connection, if any.
    fn close(&mut self);

    /// Returns `true` while a connection is held.
    fn is_connected(&self) -> bool;

    /// Instance identity (name, host, version).
    fn instance_info(&mut self) -> Result<InstanceInfo, SourceError>;

    /// Cumulative counters and time-model values, keyed by [`super::vendor::keys`].
    fn fetch_counters(&mut self) -> Result<Counters, SourceError>;

    /// Native instantaneous gauges.
    ///
    /// Returns `Ok(None)` for vendors without a gauge view; the rate engine then
    /// derives synthetic gauges from the time model.
    fn fetch_gauges(&mut self) -> Result<Option<Gauges>, SourceError>;

    /// Cumulative wait-event totals, idle classes excluded.
    fn fetch_wait_totals(&mut self) -> Result<Vec<WaitTotal>, SourceError>;

    /// Currently active user sessions.
    fn fetch_sessions(&mut self) -> Result<Vec<SessionRow>, SourceError>;

    /// Most expensive recent SQL statements.
    fn fetch_hotspots(&mut self) -> Result<Vec<HotspotRow>, SourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_connection_errors_require_reconnect() {
        assert!(SourceError::Connection("closed".into()).is_connection_lost());
        assert!(!SourceError::Query("syntax".into()).is_connection_lost());
        assert!(!SourceError::Config("PGUSER".into()).is_connection_lost());
    }

    #[test]
    fn display_includes_kind() {
        let e = SourceError::Query("relation does not exist".into());
        assert_eq!(e.to_string(), "query error: relation does not exist");
    }
}
