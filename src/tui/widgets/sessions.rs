//! Sessions panel with a selectable row.

use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Row, Table};

use crate::fmt::truncate;
use crate::storage::model::SessionRow;
use crate::tui::state::ViewState;
use crate::tui::style::Styles;

const HEADERS: [&str; 11] = [
    "SID",
    "Serial",
    "User",
    "Status",
    "Wait Event",
    "WClass",
    "Blk",
    "SQL ID",
    "Wait(s)",
    "Program",
    "SQL Text",
];

/// Fixed column widths; SQL text fills the rest.
const WIDTHS: [u16; 10] = [7, 8, 12, 10, 28, 12, 5, 15, 8, 16];

/// Cells for one session row, truncated to fit their columns.
pub fn session_cells(s: &SessionRow) -> Vec<String> {
    let fit = |text: &str, col: usize| truncate(text, WIDTHS[col] as usize - 1);
    vec![
        s.sid.to_string(),
        s.serial.to_string(),
        fit(&s.username, 2),
        fit(&s.status, 3),
        fit(&s.event, 4),
        fit(&s.wait_class, 5),
        s.blocking_sid.map(|b| b.to_string()).unwrap_or_default(),
        fit(&s.sql_id, 7),
        s.seconds_in_wait.to_string(),
        fit(&s.program, 9),
        s.sql_text.clone(),
    ]
}

/// Renders the session list.
pub fn render_sessions(
    frame: &mut Frame,
    area: Rect,
    sessions: &[SessionRow],
    backed: bool,
    state: &mut ViewState,
) {
    let title = if backed {
        format!(" Sessions ({}) ", sessions.len())
    } else {
        format!(" Sessions ({}) [degraded] ", sessions.len())
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Styles::border());

    state.resolve_selection(sessions.len());
    if sessions.is_empty() {
        frame.render_widget(Clear, area);
        frame.render_widget(Paragraph::new("No active sessions").block(block), area);
        return;
    }

    let header = Row::new(HEADERS).style(Styles::label()).height(1);
    let rows: Vec<Row> = sessions
        .iter()
        .map(|s| Row::new(session_cells(s)).style(Styles::session(&s.status)))
        .collect();

    let mut widths: Vec<Constraint> = WIDTHS.iter().map(|&w| Constraint::Length(w)).collect();
    widths.push(Constraint::Fill(1));

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .column_spacing(0)
        .row_highlight_style(Styles::selected());

    frame.render_widget(Clear, area);
    frame.render_stateful_widget(table, area, &mut state.sessions_table);
}
