//! Theme system — the two colour schemes the playground ships with.

use ratatui::style::Color;

use crate::config::ThemeName;

/// A complete color theme for the TUI.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub name: String,

    // Editor and viewer text
    pub editor_fg: Color,
    pub editor_cursor: Color,
    pub editor_line_number: Color,

    // Status bar
    pub status_fg: Color,
    pub status_bg: Color,
    pub status_ok: Color,
    pub status_err: Color,
    pub status_busy: Color,

    // Borders & chrome
    pub border: Color,
    pub border_focused: Color,
    pub overlay_bg: Color,

    // Help
    pub help_key: Color,
    pub help_desc: Color,

    // Syntax highlighting
    pub syntax_keyword: Color,
    pub syntax_string: Color,
    pub syntax_number: Color,
    pub syntax_tag: Color,
    pub syntax_comment: Color,

    // Fault banner
    pub fault_border: Color,
    pub fault_fg: Color,
}

/// Default theme for dark terminals.
pub fn default() -> Theme {
    Theme {
        name: "Default".to_string(),

        editor_fg: Color::White,
        editor_cursor: Color::Yellow,
        editor_line_number: Color::DarkGray,

        status_fg: Color::White,
        status_bg: Color::DarkGray,
        status_ok: Color::Green,
        status_err: Color::Red,
        status_busy: Color::Yellow,

        border: Color::White,
        border_focused: Color::Cyan,
        overlay_bg: Color::Black,

        help_key: Color::Yellow,
        help_desc: Color::White,

        syntax_keyword: Color::Yellow,
        syntax_string: Color::Green,
        syntax_number: Color::Magenta,
        syntax_tag: Color::Cyan,
        syntax_comment: Color::DarkGray,

        fault_border: Color::Red,
        fault_fg: Color::LightRed,
    }
}

/// Light theme for light terminal backgrounds.
pub fn light() -> Theme {
    Theme {
        name: "Light".to_string(),

        editor_fg: Color::Black,
        editor_cursor: Color::Blue,
        editor_line_number: Color::Gray,

        status_fg: Color::Black,
        status_bg: Color::Gray,
        status_ok: Color::Rgb(0, 128, 0),
        status_err: Color::Rgb(178, 34, 34),
        status_busy: Color::Rgb(184, 134, 11),

        border: Color::DarkGray,
        border_focused: Color::Blue,
        overlay_bg: Color::White,

        help_key: Color::Blue,
        help_desc: Color::Black,

        syntax_keyword: Color::Rgb(0, 0, 160),
        syntax_string: Color::Rgb(0, 110, 0),
        syntax_number: Color::Rgb(128, 0, 128),
        syntax_tag: Color::Rgb(0, 110, 130),
        syntax_comment: Color::Gray,

        fault_border: Color::Red,
        fault_fg: Color::Rgb(178, 34, 34),
    }
}

pub fn all_builtins() -> Vec<Theme> {
    vec![default(), light()]
}

/// The built-in theme selected in config.
pub fn from_name(name: ThemeName) -> Theme {
    match name {
        ThemeName::Default => default(),
        ThemeName::Light => light(),
    }
}

/// Cycle to the next theme in the list, wrapping around.
pub fn cycle_theme(current: &Theme, themes: &[Theme]) -> Theme {
    if themes.is_empty() {
        return current.clone();
    }
    let idx = themes
        .iter()
        .position(|t| t.name == current.name)
        .map(|i| (i + 1) % themes.len())
        .unwrap_or(0);
    themes[idx].clone()
}
