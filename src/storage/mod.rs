//! Frame model, time-series history, and the append-only frame log.

pub mod frame_log;
pub mod model;
pub mod series;

pub use frame_log::{FrameLog, FrameLogError};
pub use model::{
    CollectorState, DataSources, Frame, HotspotRow, Metrics, Provenance, RecordType, SessionRow,
    WaitRow,
};
pub use series::SeriesBuffer;
