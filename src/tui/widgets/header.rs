//! Title bar: instance, vendor, version, collection time and collector state.

use chrono::Local;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::provider::{LoopState, Published};
use crate::storage::model::CollectorState;
use crate::tui::style::Styles;

/// Title text for the latest cycle.
pub fn title_text(published: Option<&Published>) -> String {
    let Some(p) = published else {
        return " DIT | Connecting... ".to_string();
    };
    let host = if p.instance.host_name.is_empty() {
        String::new()
    } else {
        format!("@{}", p.instance.host_name)
    };
    let collected = p
        .frame
        .timestamp
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S");
    format!(
        " DIT | {}{} | {} {} | Collected: {} ",
        p.frame.instance_name,
        host,
        p.frame.db_type.product_name(),
        p.instance.version,
        collected
    )
}

/// Collector state badge, with the loop state while it is in error.
pub fn status_text(published: &Published) -> String {
    let state = published.frame.collector_state.as_str();
    if published.state == LoopState::Error {
        format!(" {} ({}) ", state, published.state.as_str())
    } else {
        format!(" {} ", state)
    }
}

/// Renders the title bar.
pub fn render_header(frame: &mut Frame, area: Rect, published: Option<&Published>) {
    let mut spans = vec![Span::raw(title_text(published))];
    if let Some(p) = published {
        let style = match p.frame.collector_state {
            CollectorState::On => Styles::title(),
            CollectorState::Err => Styles::alert(),
        };
        spans.push(Span::styled(status_text(p), style));
    }
    let title = Paragraph::new(Line::from(spans)).style(Styles::title());
    frame.render_widget(title, area);
}
