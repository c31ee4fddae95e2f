//! Terminal dashboard.
//!
//! Draws the latest [`crate::provider::Published`] cycle: title bar, load
//! profile with sparklines, top waits, sessions, top SQL and a footer. Data
//! collection and input handling share one thread; input is polled with a
//! short timeout so the collection cadence is never delayed by the keyboard.

mod app;
mod input;
mod render;
mod state;
mod style;
mod widgets;

pub use app::App;
pub use state::ViewState;
