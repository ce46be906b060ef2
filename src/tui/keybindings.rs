//! Key bindings — maps key events to application actions.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::layout::FocusPanel;

/// Application-level actions triggered by key events.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Quit,
    /// Cycle focus to the next pane.
    CycleFocus,
    ToggleHelp,
    ToggleFaultLog,
    CycleTheme,
    /// Close overlays, return focus to the script.
    Escape,
    EditorInsert(char),
    EditorBackspace,
    EditorDelete,
    EditorNewline,
    EditorLeft,
    EditorRight,
    EditorUp,
    EditorDown,
    EditorHome,
    EditorEnd,
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
}

/// Map a key event to an action given the focused pane and whether an
/// overlay is open. Overlays swallow everything except global keys and
/// scrolling.
pub fn map_key(key: KeyEvent, focus: FocusPanel, overlay_visible: bool) -> Option<Action> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // Global bindings
    match key.code {
        KeyCode::Char('q') if ctrl => return Some(Action::Quit),
        KeyCode::Char('l') if ctrl => return Some(Action::ToggleFaultLog),
        KeyCode::Char('t') if ctrl => return Some(Action::CycleTheme),
        KeyCode::F(1) => return Some(Action::ToggleHelp),
        KeyCode::Esc => return Some(Action::Escape),
        KeyCode::Tab if !overlay_visible => return Some(Action::CycleFocus),
        _ => {}
    }

    if overlay_visible {
        return match key.code {
            KeyCode::Up => Some(Action::ScrollUp),
            KeyCode::Down => Some(Action::ScrollDown),
            _ => None,
        };
    }

    match focus {
        FocusPanel::Editor => match key.code {
            KeyCode::Char(c) if !ctrl => Some(Action::EditorInsert(c)),
            KeyCode::Enter => Some(Action::EditorNewline),
            KeyCode::Backspace => Some(Action::EditorBackspace),
            KeyCode::Delete => Some(Action::EditorDelete),
            KeyCode::Left => Some(Action::EditorLeft),
            KeyCode::Right => Some(Action::EditorRight),
            KeyCode::Up => Some(Action::EditorUp),
            KeyCode::Down => Some(Action::EditorDown),
            KeyCode::Home => Some(Action::EditorHome),
            KeyCode::End => Some(Action::EditorEnd),
            _ => None,
        },
        FocusPanel::Output => match key.code {
            KeyCode::Up => Some(Action::ScrollUp),
            KeyCode::Down => Some(Action::ScrollDown),
            KeyCode::PageUp => Some(Action::PageUp),
            KeyCode::PageDown => Some(Action::PageDown),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventKind, KeyEventState};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn ctrl_key(c: char) -> KeyEvent {
        KeyEvent {
            code: KeyCode::Char(c),
            modifiers: KeyModifiers::CONTROL,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn ctrl_q_quits_everywhere() {
        for focus in [FocusPanel::Editor, FocusPanel::Output] {
            for overlay in [false, true] {
                assert_eq!(map_key(ctrl_key('q'), focus, overlay), Some(Action::Quit));
            }
        }
    }

    #[test]
    fn typing_inserts_only_in_editor() {
        assert_eq!(
            map_key(key(KeyCode::Char('a')), FocusPanel::Editor, false),
            Some(Action::EditorInsert('a'))
        );
        assert_eq!(map_key(key(KeyCode::Char('a')), FocusPanel::Output, false), None);
    }

    #[test]
    fn shifted_chars_insert() {
        let mut k = key(KeyCode::Char('R'));
        k.modifiers = KeyModifiers::SHIFT;
        assert_eq!(
            map_key(k, FocusPanel::Editor, false),
            Some(Action::EditorInsert('R'))
        );
    }

    #[test]
    fn unbound_ctrl_chars_do_not_insert() {
        assert_eq!(map_key(ctrl_key('x'), FocusPanel::Editor, false), None);
    }

    #[test]
    fn arrows_depend_on_focus() {
        assert_eq!(
            map_key(key(KeyCode::Up), FocusPanel::Editor, false),
            Some(Action::EditorUp)
        );
        assert_eq!(
            map_key(key(KeyCode::Up), FocusPanel::Output, false),
            Some(Action::ScrollUp)
        );
        assert_eq!(
            map_key(key(KeyCode::PageDown), FocusPanel::Output, false),
            Some(Action::PageDown)
        );
    }

    #[test]
    fn overlay_blocks_editing() {
        assert_eq!(map_key(key(KeyCode::Char('a')), FocusPanel::Editor, true), None);
        assert_eq!(map_key(key(KeyCode::Tab), FocusPanel::Editor, true), None);
        assert_eq!(
            map_key(key(KeyCode::Down), FocusPanel::Editor, true),
            Some(Action::ScrollDown)
        );
        assert_eq!(map_key(key(KeyCode::Esc), FocusPanel::Editor, true), Some(Action::Escape));
    }

    #[test]
    fn global_toggles() {
        assert_eq!(map_key(key(KeyCode::F(1)), FocusPanel::Output, false), Some(Action::ToggleHelp));
        assert_eq!(map_key(ctrl_key('l'), FocusPanel::Editor, false), Some(Action::ToggleFaultLog));
        assert_eq!(map_key(ctrl_key('t'), FocusPanel::Editor, false), Some(Action::CycleTheme));
        assert_eq!(map_key(key(KeyCode::Tab), FocusPanel::Editor, false), Some(Action::CycleFocus));
    }
}
