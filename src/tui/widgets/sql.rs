//! Top SQL panel.

use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table};

use crate::fmt::format_grouped;
use crate::storage::model::HotspotRow;
use crate::tui::style::Styles;

const HEADERS: [&str; 9] = [
    "SQL ID",
    "Plan Hash",
    "Elapsed(s)",
    "Ela(s)/Exec",
    "CPU(s)",
    "Execs",
    "Gets",
    "Gets/Exec",
    "SQL Text",
];

const WIDTHS: [u16; 8] = [15, 13, 13, 13, 11, 10, 11, 11];

/// Cells for one hotspot row. Per-execution columns are zero when the
/// statement has not completed an execution.
pub fn hotspot_cells(h: &HotspotRow) -> Vec<String> {
    let execs = h.executions as f64;
    let (ela_per_exec, gets_per_exec) = if h.executions > 0 {
        (h.elapsed_sec / execs, h.buffer_gets as f64 / execs)
    } else {
        (0.0, 0.0)
    };
    vec![
        h.sql_id.clone(),
        h.plan_hash.to_string(),
        format_grouped(h.elapsed_sec, 0),
        format!("{:.3}", ela_per_exec),
        format_grouped(h.cpu_sec, 0),
        format_grouped(execs, 0),
        format_grouped(h.buffer_gets as f64, 0),
        format_grouped(gets_per_exec, 0),
        h.sql_text.clone(),
    ]
}

/// Renders the hotspot list starting at row `scroll`.
pub fn render_sql(
    frame: &mut Frame,
    area: Rect,
    hotspots: &[HotspotRow],
    backed: bool,
    scroll: usize,
) {
    let title = if backed { " Top SQL " } else { " Top SQL [degraded] " };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Styles::border());

    if hotspots.is_empty() {
        let msg = if backed { "No SQL activity" } else { "SQL statistics unavailable" };
        frame.render_widget(Paragraph::new(msg).block(block), area);
        return;
    }

    let header = Row::new(HEADERS).style(Styles::label()).height(1);
    let rows: Vec<Row> = hotspots
        .iter()
        .skip(scroll)
        .map(|h| Row::new(hotspot_cells(h)).style(Styles::default()))
        .collect();

    let mut widths: Vec<Constraint> = WIDTHS.iter().map(|&w| Constraint::Length(w)).collect();
    widths.push(Constraint::Fill(1));

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .column_spacing(0);
    frame.render_widget(table, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_execution_columns() {
        let h = HotspotRow {
            sql_id: "abc".into(),
            plan_hash: 123,
            elapsed_sec: 12.5,
            cpu_sec: 4.0,
            executions: 4,
            buffer_gets: 10_000,
            ..HotspotRow::default()
        };
        let cells = hotspot_cells(&h);
        assert_eq!(cells.len(), HEADERS.len());
        assert_eq!(cells[3], "3.125");
        assert_eq!(cells[6], "10,000");
        assert_eq!(cells[7], "2,500");
    }

    #[test]
    fn zero_executions_do_not_divide() {
        let h = HotspotRow {
            elapsed_sec: 5.0,
            buffer_gets: 99,
            ..HotspotRow::default()
        };
        let cells = hotspot_cells(&h);
        assert_eq!(cells[3], "0.000");
        assert_eq!(cells[7], "0");
    }
}
