//! Default key bindings.

use crate::model::KeyAction;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Map a key press to its action. Releases and unbound keys map to `None`.
pub fn key_action(key: &KeyEvent) -> Option<KeyAction> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    let action = match key.code {
        KeyCode::Char('c') if ctrl => KeyAction::Quit,
        KeyCode::Char('d') if ctrl => KeyAction::PageDown,
        KeyCode::Char('u') if ctrl => KeyAction::PageUp,
        _ if ctrl => return None,
        KeyCode::Char('q') | KeyCode::Esc => KeyAction::Quit,
        KeyCode::Char('j') | KeyCode::Down => KeyAction::ScrollDown,
        KeyCode::Char('k') | KeyCode::Up => KeyAction::ScrollUp,
        KeyCode::PageDown | KeyCode::Char(' ') => KeyAction::PageDown,
        KeyCode::PageUp => KeyAction::PageUp,
        KeyCode::Char('g') | KeyCode::Home => KeyAction::ScrollToTop,
        KeyCode::Char('G') | KeyCode::End => KeyAction::ScrollToBottom,
        KeyCode::Char('c') => KeyAction::NextCategory,
        KeyCode::Char('C') => KeyAction::PrevCategory,
        KeyCode::Char('r') => KeyAction::Reload,
        _ => return None,
    };
    Some(action)
}
