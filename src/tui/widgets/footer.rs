//! Footer: keys, cadence, last collect time and error text.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::fmt::truncate;
use crate::tui::style::Styles;

const ERROR_MAX: usize = 40;

/// Footer text without the error suffix.
pub fn footer_text(interval_secs: u64, collect_ms: u64) -> String {
    format!(
        " Q:Quit  Up/Down:Navigate  PgUp/PgDn:Scroll  Tab:SQL | Interval: {}s  Collect: {}ms",
        interval_secs, collect_ms
    )
}

/// Renders the footer bar.
pub fn render_footer(
    frame: &mut Frame,
    area: Rect,
    interval_secs: u64,
    collect_ms: u64,
    last_error: Option<&str>,
) {
    let mut spans = vec![Span::raw(footer_text(interval_secs, collect_ms))];
    if let Some(err) = last_error {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(
            format!("ERR: {}", truncate(err, ERROR_MAX)),
            Styles::error(),
        ));
    }
    let footer = Paragraph::new(Line::from(spans)).style(Styles::footer());
    frame.render_widget(footer, area);
}
