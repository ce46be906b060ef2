//! TUI end-to-end tests — keys flow through the bindings into the app, runs
//! resolve on worker threads, and frames are drawn from the resulting state.

use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};
use ratatui::backend::TestBackend;
use ratatui::Terminal;

use sieveplay::config::{PlaygroundConfig, ThemeName};
use sieveplay::state::{Phase, RequestId, StalePolicy};
use sieveplay::tui::{map_key, App, FocusPanel};

const WAIT: Duration = Duration::from_secs(10);

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

/// Route a key the way the event loop does.
fn press(app: &mut App, key: KeyEvent) {
    let overlay = app.help_screen.visible || app.fault_log_visible;
    if let Some(action) = map_key(key, app.focus, overlay) {
        app.handle_action(action);
    }
}

fn type_text(app: &mut App, text: &str) {
    for c in text.chars() {
        match c {
            '\n' => press(app, key(KeyCode::Enter)),
            c => press(app, key(KeyCode::Char(c))),
        }
    }
}

/// Wait until no run is in flight.
fn settle(app: &mut App) {
    while app.controller().state().in_flight > 0 {
        assert!(app.wait_for_resolution(WAIT), "a run never resolved");
    }
}

fn render(app: &mut App, width: u16, height: u16) -> String {
    let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
    terminal.draw(|f| app.draw(f)).unwrap();
    let buffer = terminal.backend().buffer();
    let mut text = String::new();
    for y in 0..buffer.area.height {
        for x in 0..buffer.area.width {
            text.push_str(buffer[(x, y)].symbol());
        }
        text.push('\n');
    }
    text
}

fn status_line(app: &mut App) -> String {
    let screen = render(app, 160, 30);
    screen.lines().last().unwrap_or_default().to_string()
}

// =============================================================================
// Typing and compiling
// =============================================================================

#[test]
fn every_keystroke_issues_a_run() {
    let mut app = App::new("", &PlaygroundConfig::default());
    type_text(&mut app, "keep;");
    // Mount plus one run per character.
    assert_eq!(app.controller().state().latest_issued, RequestId::new(5));
    settle(&mut app);
    let state = app.controller().state();
    assert_eq!(state.phase, Phase::Success);
    assert!(state.is_current());
    assert_eq!(state.source_text, "keep;");
}

#[test]
fn fault_then_fix() {
    let mut app = App::new("", &PlaygroundConfig::default());
    type_text(&mut app, "discard");
    settle(&mut app);
    assert_eq!(app.controller().state().phase, Phase::Failed);
    let screen = render(&mut app, 120, 30);
    assert!(screen.contains("Failed to compile"));

    type_text(&mut app, ";");
    settle(&mut app);
    assert_eq!(app.controller().state().phase, Phase::Success);
    let screen = render(&mut app, 120, 30);
    assert!(!screen.contains("Failed to compile"));
    assert!(screen.contains("Worker"));
    assert!(app.viewer.lines().iter().any(|l| l.contains("discard the email")));
}

#[test]
fn multi_line_script_from_keys() {
    let mut app = App::new("", &PlaygroundConfig::default());
    type_text(
        &mut app,
        "require \"fileinto\";\nif header :contains \"subject\" \"invoice\" {\nfileinto \"r2://BILLS\";\n}",
    );
    assert_eq!(app.editor.line_count(), 4);
    settle(&mut app);
    assert_eq!(app.controller().state().phase, Phase::Success);
    assert!(app.viewer.lines().iter().any(|l| l.contains("env.BILLS.put(")));
}

#[test]
fn navigation_keys_do_not_issue_runs() {
    let mut app = App::new("keep;\nstop;", &PlaygroundConfig::default());
    for code in [
        KeyCode::Down,
        KeyCode::End,
        KeyCode::Left,
        KeyCode::Up,
        KeyCode::Home,
        KeyCode::Right,
    ] {
        press(&mut app, key(code));
    }
    assert_eq!(app.controller().state().next_request, RequestId::new(1));
    assert_eq!(app.editor.cursor(), (0, 1));
}

// =============================================================================
// Focus and overlays
// =============================================================================

#[test]
fn output_focus_scrolls_instead_of_typing() {
    let mut app = App::new(sieveplay::demo::DEFAULT_SCRIPT, &PlaygroundConfig::default());
    settle(&mut app);
    render(&mut app, 120, 20);

    press(&mut app, key(KeyCode::Tab));
    assert_eq!(app.focus, FocusPanel::Output);
    press(&mut app, key(KeyCode::Char('x')));
    assert_eq!(app.controller().state().next_request, RequestId::new(1));

    press(&mut app, key(KeyCode::PageDown));
    assert!(app.viewer.scroll_offset() > 0);
    press(&mut app, key(KeyCode::PageUp));
    assert_eq!(app.viewer.scroll_offset(), 0);

    press(&mut app, key(KeyCode::Esc));
    assert_eq!(app.focus, FocusPanel::Editor);
}

#[test]
fn fault_log_collects_failed_runs() {
    let mut app = App::new("stop", &PlaygroundConfig::default());
    settle(&mut app);
    assert_eq!(app.fault_log.len(), 1);

    press(&mut app, ctrl_key('l'));
    assert!(app.fault_log_visible);
    let screen = render(&mut app, 120, 30);
    assert!(screen.contains("Fault Log"));

    // Typing is swallowed while the overlay is open.
    press(&mut app, key(KeyCode::Char(';')));
    assert_eq!(app.controller().state().source_text, "stop");

    press(&mut app, key(KeyCode::Esc));
    assert!(!app.fault_log_visible);
}

#[test]
fn help_overlay_renders_and_closes() {
    let mut app = App::new("keep;", &PlaygroundConfig::default());
    press(&mut app, key(KeyCode::F(1)));
    assert!(app.help_screen.visible);
    assert!(render(&mut app, 120, 40).contains("Help"));
    press(&mut app, key(KeyCode::F(1)));
    assert!(!app.help_screen.visible);
}

#[test]
fn ctrl_q_quits_from_an_overlay() {
    let mut app = App::new("keep;", &PlaygroundConfig::default());
    press(&mut app, key(KeyCode::F(1)));
    press(&mut app, ctrl_key('q'));
    assert!(app.should_quit);
}

// =============================================================================
// Config and status bar
// =============================================================================

#[test]
fn config_selects_theme_and_policy() {
    let config = PlaygroundConfig {
        theme: ThemeName::Light,
        stale_results: StalePolicy::LastResolved,
        ..PlaygroundConfig::default()
    };
    let mut app = App::new("keep;", &config);
    assert_eq!(app.theme.name, "Light");
    assert_eq!(app.controller().policy(), StalePolicy::LastResolved);
    settle(&mut app);
    let status = status_line(&mut app);
    assert!(status.contains("last-resolved"), "{status}");
}

#[test]
fn status_bar_reports_phase_and_policy() {
    let mut app = App::new("keep;", &PlaygroundConfig::default());
    settle(&mut app);
    let status = status_line(&mut app);
    assert!(status.contains("latest-wins"), "{status}");
    assert!(status.contains("runs:0"), "{status}");
}

#[test]
fn small_terminal_still_draws() {
    let mut app = App::new(sieveplay::demo::DEFAULT_SCRIPT, &PlaygroundConfig::default());
    settle(&mut app);
    press(&mut app, key(KeyCode::F(1)));
    let screen = render(&mut app, 30, 8);
    assert_eq!(screen.lines().count(), 8);
}
