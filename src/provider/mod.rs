//! Poll loop and the published view handed to renderers.
//!
//! [`LiveMonitor`] owns the snapshot source and all rate state and runs one
//! cycle per tick. At the end of each cycle it replaces the current
//! [`Published`] view inside a [`Dashboard`]; renderers only ever see whole
//! cycles.

mod live;
mod ticker;

pub use live::LiveMonitor;
pub use ticker::Ticker;

use std::sync::{Arc, Mutex, MutexGuard};

use crate::collector::{InstanceInfo, SourceError};
use crate::config::ConfigError;
use crate::storage::{Frame, FrameLogError, Metrics, SeriesBuffer};

/// Error types that stop the monitor from starting.
#[derive(Debug)]
pub enum ProviderError {
    /// The initial connection failed.
    Connect(SourceError),
    /// Invalid configuration.
    Config(ConfigError),
    /// The frame log could not be opened.
    FrameLog(FrameLogError),
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderError::Connect(e) => write!(f, "initial connection failed: {}", e),
            ProviderError::Config(e) => write!(f, "invalid configuration: {}", e),
            ProviderError::FrameLog(e) => write!(f, "cannot open frame log: {}", e),
        }
    }
}

impl std::error::Error for ProviderError {}

impl ProviderError {
    /// Process exit code: 2 for configuration errors, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            ProviderError::Config(e) => e.exit_code(),
            ProviderError::Connect(_) | ProviderError::FrameLog(_) => 1,
        }
    }
}

impl From<ConfigError> for ProviderError {
    fn from(e: ConfigError) -> Self {
        ProviderError::Config(e)
    }
}

/// Poll loop state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Connecting,
    Cycling,
    /// Connection lost; the next tick closes and reconnects.
    Error,
    Stopped,
}

impl LoopState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoopState::Connecting => "CONNECTING",
            LoopState::Cycling => "CYCLING",
            LoopState::Error => "ERROR",
            LoopState::Stopped => "STOPPED",
        }
    }
}

/// One completed cycle as seen by renderers.
#[derive(Debug, Clone)]
pub struct Published {
    pub frame: Frame,
    pub instance: InstanceInfo,
    pub state: LoopState,
    /// Sequence number, starting at 1.
    pub cycle: u64,
    /// Wall time spent fetching and computing this cycle.
    pub collect_ms: u64,
    /// Most recent error, kept until a cycle completes cleanly.
    pub last_error: Option<String>,
}

/// Shared handle to the latest published cycle and metric history.
///
/// Cloning is cheap; all clones observe the same state. The published cycle
/// and the samples it contributed are swapped in under one lock, so a reader
/// never sees a sparkline ahead of its frame.
#[derive(Clone)]
pub struct Dashboard {
    inner: Arc<Mutex<DashboardInner>>,
}

struct DashboardInner {
    current: Option<Arc<Published>>,
    series: SeriesBuffer,
    /// Metrics of the most recent cycle that had collector-backed metrics.
    last_backed: Option<Metrics>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Dashboard {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(DashboardInner {
                current: None,
                series: SeriesBuffer::new(history_capacity),
                last_backed: None,
            })),
        }
    }

    /// Latest published cycle, if any.
    pub fn current(&self) -> Option<Arc<Published>> {
        lock(&self.inner).current.clone()
    }

    /// Replaces the published cycle. `backed` metrics, when present, are
    /// appended to the history and kept as the last known values.
    pub(crate) fn publish(&self, published: Arc<Published>, backed: Option<&Metrics>) {
        let mut inner = lock(&self.inner);
        if let Some(metrics) = backed {
            for (name, value) in metrics.iter() {
                inner.series.push(name, value);
            }
            inner.last_backed = Some(metrics.clone());
        }
        inner.current = Some(published);
    }

    pub fn sparkline(&self, name: &str, width: usize) -> String {
        lock(&self.inner).series.sparkline(name, width)
    }

    pub fn values(&self, name: &str) -> Vec<f64> {
        lock(&self.inner).series.values(name)
    }

    /// Metrics of the last cycle whose metrics were collector-backed.
    pub fn last_backed_metrics(&self) -> Option<Metrics> {
        lock(&self.inner).last_backed.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn published(cycle: u64) -> Arc<Published> {
        Arc::new(Published {
            frame: Frame {
                record_type: crate::storage::RecordType::Frame,
                timestamp: chrono::Utc::now(),
                db_type: crate::collector::Vendor::Oracle,
                instance_name: "ORCL".into(),
                collector_state: crate::storage::CollectorState::On,
                data_sources: crate::storage::DataSources::degraded(),
                metrics: Metrics::default(),
                sessions: Vec::new(),
                wait_events: Vec::new(),
                sql_hotspots: Vec::new(),
                last_error: None,
            },
            instance: InstanceInfo::default(),
            state: LoopState::Cycling,
            cycle,
            collect_ms: 0,
            last_error: None,
        })
    }

    #[test]
    fn dashboard_clones_share_series() {
        let a = Dashboard::new(10);
        let b = a.clone();
        assert!(b.current().is_none());
        let m = |exec: f64| Metrics {
            sql_exec_per_sec: exec,
            ..Metrics::default()
        };
        a.publish(published(1), Some(&m(1.0)));
        a.publish(published(2), Some(&m(2.0)));
        assert_eq!(b.values("sql_exec_per_sec"), vec![1.0, 2.0]);
        assert_eq!(b.sparkline("sql_exec_per_sec", 3).chars().count(), 3);
        assert_eq!(b.current().map(|p| p.cycle), Some(2));
    }

    #[test]
    fn unbacked_cycle_keeps_history_and_last_values() {
        let d = Dashboard::new(10);
        assert!(d.last_backed_metrics().is_none());
        let m = Metrics {
            sql_exec_per_sec: 5.0,
            ..Metrics::default()
        };
        d.publish(published(1), Some(&m));
        d.publish(published(2), None);
        assert_eq!(d.values("sql_exec_per_sec"), vec![5.0]);
        assert_eq!(d.last_backed_metrics(), Some(m));
        assert_eq!(d.current().map(|p| p.cycle), Some(2));
    }

    #[test]
    fn provider_error_display() {
        let e = ProviderError::Connect(SourceError::Connection("connection refused".into()));
        assert_eq!(
            e.to_string(),
            "initial connection failed: connection error: connection refused"
        );
        assert_eq!(e.exit_code(), 1);
        assert_eq!(ProviderError::Config(ConfigError::InvalidHistory(0)).exit_code(), 2);
    }
}
