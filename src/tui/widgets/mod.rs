//! Dashboard widgets.

mod footer;
mod header;
mod load_profile;
mod sessions;
mod sql;
mod waits;

pub use footer::render_footer;
pub use header::render_header;
pub use load_profile::{LOAD_PROFILE_HEIGHT, displayed_metrics, render_load_profile};
pub use sessions::render_sessions;
pub use sql::render_sql;
pub use waits::render_waits;
