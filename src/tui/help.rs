//! Help screen — modal overlay showing the keybinding reference.

#[derive(Debug, Clone)]
pub struct HelpLine {
    pub text: String,
    pub is_header: bool,
}

#[derive(Debug, Clone)]
pub struct HelpScreen {
    pub visible: bool,
    pub scroll_offset: usize,
    content: Vec<HelpLine>,
}

impl Default for HelpScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl HelpScreen {
    pub fn new() -> Self {
        Self {
            visible: false,
            scroll_offset: 0,
            content: Self::build_content(),
        }
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
        if self.visible {
            self.scroll_offset = 0;
        }
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(1);
    }

    pub fn scroll_down(&mut self, max_visible: usize) {
        let max_scroll = self.content.len().saturating_sub(max_visible);
        if self.scroll_offset < max_scroll {
            self.scroll_offset += 1;
        }
    }

    pub fn lines(&self) -> &[HelpLine] {
        &self.content
    }

    fn build_content() -> Vec<HelpLine> {
        let h = |text: &str| HelpLine {
            text: text.to_string(),
            is_header: true,
        };
        let l = |text: &str| HelpLine {
            text: text.to_string(),
            is_header: false,
        };

        vec![
            h("GLOBAL"),
            l("  Ctrl-Q       Quit"),
            l("  Tab          Switch focus between script and output"),
            l("  F1           Toggle this help"),
            l("  Ctrl-L       Toggle the fault log"),
            l("  Ctrl-T       Cycle theme"),
            l("  Esc          Close overlay / focus the script"),
            l(""),
            h("SCRIPT PANE"),
            l("  Type         Edit; every change recompiles immediately"),
            l("  Arrows       Move cursor"),
            l("  Home/End     Start/end of line"),
            l("  Backspace    Delete before cursor"),
            l("  Delete       Delete at cursor"),
            l(""),
            h("OUTPUT PANE"),
            l("  Up/Down      Scroll one line"),
            l("  PgUp/PgDn    Scroll one page"),
            l(""),
            h("SIEVE"),
            l("  require [\"fileinto\", \"variables\", ...];"),
            l("  if header :contains \"subject\" \"x\" { discard; }"),
            l("  fileinto \"r2://BINDING\";   redirect \"a@b.example\";"),
            l("  Tests: header address envelope body size string spamtest"),
            l("  Match: :is :contains :matches :value \"lt\""),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_resets_scroll() {
        let mut help = HelpScreen::new();
        help.toggle();
        help.scroll_down(5);
        assert_eq!(help.scroll_offset, 1);
        help.toggle();
        assert!(!help.visible);
        help.toggle();
        assert_eq!(help.scroll_offset, 0);
    }

    #[test]
    fn scroll_is_bounded() {
        let mut help = HelpScreen::new();
        let total = help.lines().len();
        for _ in 0..total * 2 {
            help.scroll_down(10);
        }
        assert_eq!(help.scroll_offset, total - 10);
        help.scroll_up();
        assert_eq!(help.scroll_offset, total - 11);
    }

    #[test]
    fn lists_global_bindings() {
        let help = HelpScreen::new();
        assert!(help.lines()[0].is_header);
        assert!(help.lines().iter().any(|l| l.text.contains("Ctrl-L")));
    }
}
