//! Read-only viewer for the compiled worker.

use super::syntax::Language;

#[derive(Debug, Clone)]
pub struct Viewer {
    lines: Vec<String>,
    language: Language,
    scroll_offset: usize,
    viewport_height: usize,
}

impl Viewer {
    pub fn new(language: Language) -> Self {
        Self {
            lines: Vec::new(),
            language,
            scroll_offset: 0,
            viewport_height: 20,
        }
    }

    /// Replace what is shown. The scroll position is kept where possible so
    /// recompiles while typing do not jump back to the top.
    pub fn set_content(&mut self, content: &str) {
        self.lines = content.lines().map(str::to_string).collect();
        self.clamp_scroll();
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn set_viewport_height(&mut self, h: usize) {
        self.viewport_height = h.max(1);
        self.clamp_scroll();
    }

    fn max_scroll(&self) -> usize {
        self.lines.len().saturating_sub(self.viewport_height)
    }

    fn clamp_scroll(&mut self) {
        self.scroll_offset = self.scroll_offset.min(self.max_scroll());
    }

    pub fn scroll_up(&mut self, n: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(n);
    }

    pub fn scroll_down(&mut self, n: usize) {
        self.scroll_offset = (self.scroll_offset + n).min(self.max_scroll());
    }

    pub fn page_up(&mut self) {
        self.scroll_up(self.viewport_height);
    }

    pub fn page_down(&mut self) {
        self.scroll_down(self.viewport_height);
    }
}
