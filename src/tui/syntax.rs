//! Lightweight per-line syntax highlighter for the Sieve and JavaScript panes.
//!
//! Works one line at a time, so block comments and multi-line strings that
//! span lines are only coloured on the line where they start.

use ratatui::style::Style;
use ratatui::text::Span;

use super::theme::Theme;

/// Language tag of a pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Sieve,
    JavaScript,
}

const SIEVE_KEYWORDS: &[&str] = &[
    "require", "if", "elsif", "else", "stop", "keep", "discard", "fileinto", "redirect",
    "reject", "ereject", "set", "addheader", "vacation", "not", "allof", "anyof", "true",
    "false", "exists", "header", "address", "envelope", "size", "body", "string", "spamtest",
];

const JS_KEYWORDS: &[&str] = &[
    "async", "await", "break", "case", "catch", "class", "const", "continue", "default",
    "else", "export", "false", "finally", "for", "from", "function", "if", "import", "let",
    "new", "null", "of", "return", "switch", "throw", "true", "try", "typeof", "undefined",
    "var", "while",
];

impl Language {
    fn keywords(self) -> &'static [&'static str] {
        match self {
            Language::Sieve => SIEVE_KEYWORDS,
            Language::JavaScript => JS_KEYWORDS,
        }
    }

    /// Whether the rest of the line starting here is a comment.
    fn comment_at(self, rest: &str) -> bool {
        match self {
            Language::Sieve => rest.starts_with('#') || rest.starts_with("/*"),
            Language::JavaScript => rest.starts_with("//") || rest.starts_with("/*"),
        }
    }
}

/// Highlight a single line into styled spans.
pub fn highlight_line<'a>(line: &'a str, language: Language, theme: &Theme) -> Vec<Span<'a>> {
    if line.is_empty() {
        return vec![Span::raw("")];
    }

    let plain = Style::default().fg(theme.editor_fg);
    let mut spans: Vec<Span<'a>> = Vec::new();
    let mut chars = line.char_indices().peekable();

    while let Some(&(start, ch)) = chars.peek() {
        let rest = &line[start..];

        if language.comment_at(rest) {
            spans.push(Span::styled(rest, Style::default().fg(theme.syntax_comment)));
            return spans;
        }

        if ch == '"' || (language == Language::JavaScript && (ch == '\'' || ch == '`')) {
            let end = string_end(line, start, ch);
            spans.push(Span::styled(
                &line[start..end],
                Style::default().fg(theme.syntax_string),
            ));
            while chars.peek().is_some_and(|&(i, _)| i < end) {
                chars.next();
            }
            continue;
        }

        // Sieve tags: :contains, :is, ...
        if language == Language::Sieve && ch == ':' {
            let end = word_end(line, start + 1);
            if end > start + 1 {
                spans.push(Span::styled(
                    &line[start..end],
                    Style::default().fg(theme.syntax_tag),
                ));
                while chars.peek().is_some_and(|&(i, _)| i < end) {
                    chars.next();
                }
                continue;
            }
        }

        if ch.is_ascii_digit() && !preceded_by_word(line, start) {
            let mut end = start;
            for (i, c) in chars.clone() {
                // Sieve quantifiers K/M/G ride along with the number.
                if c.is_ascii_alphanumeric() || c == '.' {
                    end = i + c.len_utf8();
                } else {
                    break;
                }
            }
            spans.push(Span::styled(
                &line[start..end],
                Style::default().fg(theme.syntax_number),
            ));
            while chars.peek().is_some_and(|&(i, _)| i < end) {
                chars.next();
            }
            continue;
        }

        if ch.is_alphabetic() || ch == '_' || ch == '$' {
            let end = word_end(line, start);
            let word = &line[start..end];
            let style = if language.keywords().contains(&word) {
                Style::default().fg(theme.syntax_keyword)
            } else {
                plain
            };
            spans.push(Span::styled(word, style));
            while chars.peek().is_some_and(|&(i, _)| i < end) {
                chars.next();
            }
            continue;
        }

        spans.push(Span::styled(&line[start..start + ch.len_utf8()], plain));
        chars.next();
    }

    spans
}

/// Byte index one past the closing quote, or the end of the line.
fn string_end(line: &str, start: usize, quote: char) -> usize {
    let mut escaped = false;
    for (i, c) in line[start + quote.len_utf8()..].char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == quote {
            return start + quote.len_utf8() + i + c.len_utf8();
        }
    }
    line.len()
}

fn word_end(line: &str, start: usize) -> usize {
    line[start..]
        .char_indices()
        .find(|&(_, c)| !(c.is_alphanumeric() || c == '_' || c == '$'))
        .map(|(i, _)| start + i)
        .unwrap_or(line.len())
}

fn preceded_by_word(line: &str, start: usize) -> bool {
    line[..start]
        .chars()
        .next_back()
        .is_some_and(|c| c.is_alphanumeric() || c == '_')
}
