//! Key bindings.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Action from a key press. Drop and Restart are edge signals: the app
/// latches them and the simulation consumes them at the next tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Drop,
    Restart,
    Pause,
    Quit,
    None,
}

/// Map key event to game action.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent {
        code, modifiers, ..
    } = key;
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if !no_mod && modifiers != KeyModifiers::CONTROL {
        return Action::None;
    }
    match code {
        KeyCode::Char('q') | KeyCode::Esc if no_mod => Action::Quit,
        KeyCode::Char('c') if modifiers == KeyModifiers::CONTROL => Action::Quit,
        KeyCode::Char('p') if no_mod => Action::Pause,
        KeyCode::Char(' ') | KeyCode::Enter | KeyCode::Down if no_mod => Action::Drop,
        KeyCode::Char('j') if no_mod => Action::Drop,
        KeyCode::Char('r') if no_mod => Action::Restart,
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventKind;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: crossterm::event::KeyEventState::NONE,
        }
    }

    #[test]
    fn space_is_drop() {
        assert_eq!(key_to_action(press(KeyCode::Char(' '))), Action::Drop);
    }

    #[test]
    fn r_is_restart() {
        assert_eq!(key_to_action(press(KeyCode::Char('r'))), Action::Restart);
    }

    #[test]
    fn esc_is_quit() {
        assert_eq!(key_to_action(press(KeyCode::Esc)), Action::Quit);
    }

    #[test]
    fn alt_modified_keys_are_ignored() {
        let key = KeyEvent {
            code: KeyCode::Char(' '),
            modifiers: KeyModifiers::ALT,
            kind: KeyEventKind::Press,
            state: crossterm::event::KeyEventState::NONE,
        };
        assert_eq!(key_to_action(key), Action::None);
    }
}
