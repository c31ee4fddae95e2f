//! View state: session selection and SQL panel scroll.

use ratatui::widgets::TableState;

/// Rows moved by PgUp/PgDn.
pub const PAGE_SIZE: usize = 10;

/// Selection and scroll state that survives between cycles.
///
/// Navigation only adjusts the raw index; clamping to the current row count
/// happens in [`ViewState::resolve_selection`] at render time, since the
/// session list can shrink between cycles.
#[derive(Debug, Default)]
pub struct ViewState {
    pub selected: usize,
    pub sql_scroll: usize,
    pub sessions_table: TableState,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_down(&mut self) {
        self.selected = self.selected.saturating_add(1);
    }

    pub fn page_up(&mut self) {
        self.selected = self.selected.saturating_sub(PAGE_SIZE);
    }

    pub fn page_down(&mut self) {
        self.selected = self.selected.saturating_add(PAGE_SIZE);
    }

    pub fn home(&mut self) {
        self.selected = 0;
        *self.sessions_table.offset_mut() = 0;
    }

    pub fn end(&mut self) {
        self.selected = usize::MAX;
    }

    /// Scrolls the SQL panel by one row, stopping at the last row.
    pub fn scroll_sql(&mut self, rows: usize) {
        self.sql_scroll = (self.sql_scroll + 1).min(rows.saturating_sub(1));
    }

    /// Clamps the selection to `len` rows and syncs the table state.
    pub fn resolve_selection(&mut self, len: usize) {
        if len == 0 {
            self.selected = 0;
            self.sessions_table.select(None);
            return;
        }
        self.selected = self.selected.min(len - 1);
        self.sessions_table.select(Some(self.selected));
    }

    /// Clamps the SQL scroll to `rows`.
    pub fn resolve_sql_scroll(&mut self, rows: usize) {
        self.sql_scroll = self.sql_scroll.min(rows.saturating_sub(1));
    }
}
