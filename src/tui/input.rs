use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Represents the result of handling a key event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    /// Quit the application
    Quit,
    /// Swipe the front photo right
    Keep,
    /// Swipe the front photo left, marking it for deletion
    MarkDelete,
    /// Ask to delete every marked photo
    DeleteAll,
    /// Confirm the bulk delete
    ConfirmDelete,
    /// Cancel the bulk delete
    CancelDelete,
    /// Fetch more photos now
    Reload,
    /// Toggle help overlay
    Help,
    /// No action
    None,
}

/// Maps keyboard events to actions
pub fn handle_key_event(key: KeyEvent) -> KeyAction {
    match (key.code, key.modifiers) {
        // Quit: q or Ctrl+C
        (KeyCode::Char('q'), KeyModifiers::NONE) => KeyAction::Quit,
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => KeyAction::Quit,
        (KeyCode::Esc, KeyModifiers::NONE) => KeyAction::Quit,

        // Keep: Right arrow or k
        (KeyCode::Right, KeyModifiers::NONE) => KeyAction::Keep,
        (KeyCode::Char('k'), KeyModifiers::NONE) => KeyAction::Keep,

        // Mark for deletion: Left arrow or d
        (KeyCode::Left, KeyModifiers::NONE) => KeyAction::MarkDelete,
        (KeyCode::Char('d'), KeyModifiers::NONE) => KeyAction::MarkDelete,

        (KeyCode::Char('x'), KeyModifiers::NONE) => KeyAction::DeleteAll,
        (KeyCode::Char('r'), KeyModifiers::NONE) => KeyAction::Reload,

        // Help: ?
        (KeyCode::Char('?'), KeyModifiers::NONE) => KeyAction::Help,
        (KeyCode::Char('?'), KeyModifiers::SHIFT) => KeyAction::Help,

        _ => KeyAction::None,
    }
}

/// Maps keyboard events to confirmation actions
/// Used when ViewState is ConfirmDelete
pub fn handle_confirm_input(key: KeyEvent) -> KeyAction {
    match (key.code, key.modifiers) {
        // Confirm: y or Enter
        (KeyCode::Char('y'), KeyModifiers::NONE) => KeyAction::ConfirmDelete,
        (KeyCode::Char('Y'), _) => KeyAction::ConfirmDelete,
        (KeyCode::Enter, KeyModifiers::NONE) => KeyAction::ConfirmDelete,

        // Cancel: n or Esc
        (KeyCode::Char('n'), KeyModifiers::NONE) => KeyAction::CancelDelete,
        (KeyCode::Char('N'), _) => KeyAction::CancelDelete,
        (KeyCode::Esc, KeyModifiers::NONE) => KeyAction::CancelDelete,

        _ => KeyAction::None,
    }
}
