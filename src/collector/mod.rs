//! Database snapshot sources.
//!
//! This module provides the contract between the metrics engine and a
//! database, the vendor-neutral vocabulary snapshots are expressed in, and the
//! concrete sources.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      LiveMonitor (provider)                  │
//! └───────────────────────────────┬──────────────────────────────┘
//!                                 │
//!                       ┌─────────▼─────────┐
//!                       │  SnapshotSource   │ (trait)
//!                       └─────────┬─────────┘
//!                                 │
//!              ┌──────────────────┼──────────────────┐
//!              │                  │                  │
//!      ┌───────▼───────┐  ┌───────▼───────┐  ┌───────▼───────┐
//!      │PostgresSource │  │  MockSource   │  │   Scenarios   │
//!      │ (pg_stat_*)   │  │  (Testing)    │  │  (Fixtures)   │
//!      └───────────────┘  └───────────────┘  └───────────────┘
//! ```
//!
//! Native rows are translated into [`vendor::keys`] at the adapter boundary;
//! wait times are normalized to microseconds there as well.

pub mod mock;
pub mod pg_collector;
pub mod traits;
pub mod vendor;

pub use mock::MockSource;
pub use pg_collector::PostgresSource;
pub use traits::{InstanceInfo, Section, SnapshotSource, SourceError, WaitTotal};
pub use vendor::{Counters, Gauges, Vendor};
