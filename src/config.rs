//! Validated monitor configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::collector::mock::Workload;
use crate::collector::{MockSource, PostgresSource, SnapshotSource, Vendor};
use crate::rates::waits::DEFAULT_TOP_WAITS;
use crate::storage::series::DEFAULT_CAPACITY;

/// Allowed range for the ranked wait list.
pub const TOP_WAITS_RANGE: std::ops::RangeInclusive<usize> = 1..=50;

/// Error type for configuration validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Poll interval below one second.
    InvalidInterval(u64),
    /// Sparkline history capacity of zero.
    InvalidHistory(usize),
    /// Wait row cap outside [`TOP_WAITS_RANGE`].
    InvalidTopWaits(usize),
    /// Vendor recognised but not available for live collection.
    UnsupportedVendor(String),
    /// Connection settings missing or unusable.
    Connection(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidInterval(v) => {
                write!(f, "interval must be at least 1 second, got {}", v)
            }
            ConfigError::InvalidHistory(v) => {
                write!(f, "history capacity must be at least 1, got {}", v)
            }
            ConfigError::InvalidTopWaits(v) => write!(
                f,
                "top waits must be between {} and {}, got {}",
                TOP_WAITS_RANGE.start(),
                TOP_WAITS_RANGE.end(),
                v
            ),
            ConfigError::UnsupportedVendor(v) => {
                write!(f, "live collection is not available for vendor '{}'", v)
            }
            ConfigError::Connection(msg) => write!(f, "connection settings: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl ConfigError {
    /// Process exit code for configuration errors.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

/// Poll loop configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    /// Time between cycles.
    pub interval: Duration,
    /// Samples kept per metric for sparklines.
    pub history_capacity: usize,
    /// Maximum ranked wait rows per frame.
    pub top_waits: usize,
    /// Frame log path; `None` disables recording.
    pub record: Option<PathBuf>,
    /// Overrides the instance name reported by the source.
    pub instance_name: Option<String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(6),
            history_capacity: DEFAULT_CAPACITY,
            top_waits: DEFAULT_TOP_WAITS,
            record: None,
            instance_name: None,
        }
    }
}

impl MonitorConfig {
    /// Builds a validated configuration from raw option values.
    pub fn new(
        interval_secs: u64,
        history_capacity: usize,
        top_waits: usize,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            interval: Duration::from_secs(interval_secs),
            history_capacity,
            top_waits,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_record(mut self, path: Option<PathBuf>) -> Self {
        self.record = path;
        self
    }

    pub fn with_instance_name(mut self, name: Option<String>) -> Self {
        self.instance_name = name;
        self
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval < Duration::from_secs(1) {
            return Err(ConfigError::InvalidInterval(self.interval.as_secs()));
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::InvalidHistory(self.history_capacity));
        }
        if !TOP_WAITS_RANGE.contains(&self.top_waits) {
            return Err(ConfigError::InvalidTopWaits(self.top_waits));
        }
        Ok(())
    }
}

/// Which snapshot source to collect from.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceSpec {
    /// Live PostgreSQL; `None` reads the libpq environment variables.
    Postgres { dsn: Option<String> },
    /// Synthetic workload in the given vendor's vocabulary.
    Mock { flavor: Vendor, demo: bool },
}

impl SourceSpec {
    /// Resolves command-line vendor options.
    ///
    /// `demo` selects the demo scenario and takes precedence over `vendor`.
    /// Oracle and Tibero are known vocabularies without a live adapter.
    pub fn from_args(
        vendor: &str,
        dsn: Option<String>,
        demo: Option<&str>,
    ) -> Result<Self, ConfigError> {
        if let Some(flavor) = demo {
            let flavor = Vendor::from_str(flavor)
                .map_err(|_| ConfigError::UnsupportedVendor(flavor.to_string()))?;
            return Ok(SourceSpec::Mock { flavor, demo: true });
        }
        if vendor.eq_ignore_ascii_case("mock") {
            return Ok(SourceSpec::Mock {
                flavor: Vendor::Oracle,
                demo: false,
            });
        }
        match Vendor::from_str(vendor) {
            Ok(Vendor::Postgres) => Ok(SourceSpec::Postgres { dsn }),
            Ok(other) => Err(ConfigError::UnsupportedVendor(other.label().to_string())),
            Err(_) => Err(ConfigError::UnsupportedVendor(vendor.to_string())),
        }
    }

    /// Vocabulary the source reports in.
    pub fn vendor(&self) -> Vendor {
        match self {
            SourceSpec::Postgres { .. } => Vendor::Postgres,
            SourceSpec::Mock { flavor, .. } => *flavor,
        }
    }

    /// Builds the source. Does not connect.
    pub fn open(&self) -> Result<Box<dyn SnapshotSource>, ConfigError> {
        match self {
            SourceSpec::Postgres { dsn: Some(dsn) } => {
                Ok(Box::new(PostgresSource::with_connection_string(dsn.as_str())))
            }
            SourceSpec::Postgres { dsn: None } => PostgresSource::from_env()
                .map(|s| Box::new(s) as Box<dyn SnapshotSource>)
                .map_err(|e| ConfigError::Connection(e.to_string())),
            SourceSpec::Mock { flavor, demo: true } => Ok(Box::new(MockSource::demo(*flavor))),
            SourceSpec::Mock {
                flavor,
                demo: false,
            } => Ok(Box::new(MockSource::generated(
                *flavor,
                Workload::new(*flavor),
            ))),
        }
    }
}
