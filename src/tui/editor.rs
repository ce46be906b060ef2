//! Script editor — simple text buffer with cursor.
//!
//! Columns count characters, not bytes. Every mutating method reports whether
//! the text actually changed so the caller only recompiles on real edits.
//!
//! Lines are stored without their terminators. The ending of the first line
//! (`\r\n` or `\n`) is remembered and used for every line of [`Editor::content`],
//! so a CRLF file comes back as CRLF; a file mixing both comes back uniform.

/// A minimal text editor for the Sieve script.
#[derive(Debug, Clone)]
pub struct Editor {
    lines: Vec<String>,
    line_ending: &'static str,
    cursor_row: usize,
    cursor_col: usize,
    scroll_offset: usize,
    viewport_height: usize,
}

fn line_ending(content: &str) -> &'static str {
    match content.find('\n') {
        Some(at) if content[..at].ends_with('\r') => "\r\n",
        _ => "\n",
    }
}

fn split_lines(content: &str) -> Vec<String> {
    if content.is_empty() {
        vec![String::new()]
    } else {
        content.split('\n').map(|l| l.trim_end_matches('\r').to_string()).collect()
    }
}

/// Byte offset of character column `col` in `line`, clamped to its end.
fn byte_at(line: &str, col: usize) -> usize {
    line.char_indices()
        .nth(col)
        .map(|(i, _)| i)
        .unwrap_or(line.len())
}

fn char_len(line: &str) -> usize {
    line.chars().count()
}

impl Editor {
    pub fn new(content: &str) -> Self {
        Self {
            lines: split_lines(content),
            line_ending: line_ending(content),
            cursor_row: 0,
            cursor_col: 0,
            scroll_offset: 0,
            viewport_height: 20,
        }
    }

    /// The full text, lines joined with the file's line ending.
    pub fn content(&self) -> String {
        self.lines.join(self.line_ending)
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Cursor position (row, col).
    pub fn cursor(&self) -> (usize, usize) {
        (self.cursor_row, self.cursor_col)
    }

    /// First visible line.
    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn set_viewport_height(&mut self, h: usize) {
        self.viewport_height = h.max(1);
        self.ensure_cursor_visible();
    }

    fn ensure_cursor_visible(&mut self) {
        if self.cursor_row < self.scroll_offset {
            self.scroll_offset = self.cursor_row;
        } else if self.cursor_row >= self.scroll_offset + self.viewport_height {
            self.scroll_offset = self.cursor_row + 1 - self.viewport_height;
        }
    }

    fn current_len(&self) -> usize {
        char_len(&self.lines[self.cursor_row])
    }

    pub fn insert_char(&mut self, c: char) -> bool {
        let col = self.cursor_col.min(self.current_len());
        let line = &mut self.lines[self.cursor_row];
        let at = byte_at(line, col);
        line.insert(at, c);
        self.cursor_col = col + 1;
        true
    }

    /// Split the line at the cursor.
    pub fn newline(&mut self) -> bool {
        let col = self.cursor_col.min(self.current_len());
        let at = byte_at(&self.lines[self.cursor_row], col);
        let rest = self.lines[self.cursor_row].split_off(at);
        self.cursor_row += 1;
        self.lines.insert(self.cursor_row, rest);
        self.cursor_col = 0;
        self.ensure_cursor_visible();
        true
    }

    /// Delete the character before the cursor, joining lines at column 0.
    pub fn backspace(&mut self) -> bool {
        let col = self.cursor_col.min(self.current_len());
        if col > 0 {
            let line = &mut self.lines[self.cursor_row];
            let at = byte_at(line, col - 1);
            line.remove(at);
            self.cursor_col = col - 1;
            true
        } else if self.cursor_row > 0 {
            let current_line = self.lines.remove(self.cursor_row);
            self.cursor_row -= 1;
            self.cursor_col = self.current_len();
            self.lines[self.cursor_row].push_str(&current_line);
            self.ensure_cursor_visible();
            true
        } else {
            false
        }
    }

    /// Delete the character at the cursor, joining the next line at the end.
    pub fn delete(&mut self) -> bool {
        let col = self.cursor_col.min(self.current_len());
        if col < self.current_len() {
            let line = &mut self.lines[self.cursor_row];
            let at = byte_at(line, col);
            line.remove(at);
            true
        } else if self.cursor_row + 1 < self.lines.len() {
            let next_line = self.lines.remove(self.cursor_row + 1);
            self.lines[self.cursor_row].push_str(&next_line);
            true
        } else {
            false
        }
    }

    pub fn move_left(&mut self) {
        let col = self.cursor_col.min(self.current_len());
        if col > 0 {
            self.cursor_col = col - 1;
        } else if self.cursor_row > 0 {
            self.cursor_row -= 1;
            self.cursor_col = self.current_len();
            self.ensure_cursor_visible();
        }
    }

    pub fn move_right(&mut self) {
        if self.cursor_col < self.current_len() {
            self.cursor_col += 1;
        } else if self.cursor_row + 1 < self.lines.len() {
            self.cursor_row += 1;
            self.cursor_col = 0;
            self.ensure_cursor_visible();
        }
    }

    pub fn move_up(&mut self) {
        if self.cursor_row > 0 {
            self.cursor_row -= 1;
            self.cursor_col = self.cursor_col.min(self.current_len());
            self.ensure_cursor_visible();
        }
    }

    pub fn move_down(&mut self) {
        if self.cursor_row + 1 < self.lines.len() {
            self.cursor_row += 1;
            self.cursor_col = self.cursor_col.min(self.current_len());
            self.ensure_cursor_visible();
        }
    }

    pub fn home(&mut self) {
        self.cursor_col = 0;
    }

    pub fn end(&mut self) {
        self.cursor_col = self.current_len();
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}
