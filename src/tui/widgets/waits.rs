//! Top Waits panel.

use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table};

use crate::fmt::{format_avg_ms, format_grouped};
use crate::storage::model::WaitRow;
use crate::tui::style::Styles;

/// Cells for one wait row: event, average wait, wait seconds per second.
pub fn wait_cells(row: &WaitRow) -> [String; 3] {
    [
        row.event.clone(),
        format_avg_ms(row.avg_wait_ms),
        format_grouped(row.wait_sec_per_sec, 2),
    ]
}

/// Renders the ranked wait list.
pub fn render_waits(frame: &mut Frame, area: Rect, waits: &[WaitRow], backed: bool) {
    let title = if backed {
        " Top Waits (Real-time) ".to_string()
    } else {
        " Top Waits (Real-time) [degraded] ".to_string()
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Styles::border());

    if waits.is_empty() {
        let msg = if backed { "No wait activity" } else { "Wait data unavailable" };
        frame.render_widget(Paragraph::new(msg).block(block), area);
        return;
    }

    let header = Row::new(["Wait Event", "Avg(ms)", "Wait Time(s)"])
        .style(Styles::label())
        .height(1);
    let rows: Vec<Row> = waits
        .iter()
        .map(|w| Row::new(wait_cells(w)).style(Styles::wait_class(&w.wait_class)))
        .collect();
    let widths = [
        Constraint::Fill(1),
        Constraint::Length(11),
        Constraint::Length(12),
    ];
    let table = Table::new(rows, widths).header(header).block(block);
    frame.render_widget(table, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_format_average_by_magnitude() {
        let row = WaitRow {
            wait_class: "User I/O".into(),
            event: "db file sequential read".into(),
            wait_sec_per_sec: 1234.5,
            waits_per_sec: 10.0,
            avg_wait_ms: 2500.0,
        };
        assert_eq!(
            wait_cells(&row),
            [
                "db file sequential read".to_string(),
                "2,500.0".to_string(),
                "1,234.50".to_string()
            ]
        );
        let fast = WaitRow {
            avg_wait_ms: 0.126,
            ..row
        };
        assert_eq!(wait_cells(&fast)[1], "0.13");
    }
}
