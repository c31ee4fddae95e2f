//! Input handling and keybindings.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::state::ViewState;

/// Result of handling a key event.
#[derive(Debug, PartialEq, Eq)]
pub enum KeyAction {
    /// No action, continue.
    None,
    /// Quit the application.
    Quit,
}

/// Handles key input and updates state.
///
/// `sql_rows` is the number of rows in the current Top SQL list.
pub fn handle_key(state: &mut ViewState, key: KeyEvent, sql_rows: usize) -> KeyAction {
    match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => KeyAction::Quit,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => KeyAction::Quit,

        KeyCode::Up => {
            state.select_up();
            KeyAction::None
        }
        KeyCode::Down => {
            state.select_down();
            KeyAction::None
        }
        KeyCode::PageUp => {
            state.page_up();
            KeyAction::None
        }
        KeyCode::PageDown => {
            state.page_down();
            KeyAction::None
        }
        KeyCode::Home => {
            state.home();
            KeyAction::None
        }
        KeyCode::End => {
            state.end();
            KeyAction::None
        }
        KeyCode::Tab => {
            state.scroll_sql(sql_rows);
            KeyAction::None
        }
        _ => KeyAction::None,
    }
}
