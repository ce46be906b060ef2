//! JavaScript tokenizer.
//!
//! Produces a flat token list with layout facts (line breaks and blank lines
//! before each token) that the printer needs for ASI and blank-line
//! preservation. Token text is kept verbatim.

use super::error::FormatError;

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokKind,
    pub text: String,
    pub line: usize,
    pub col: usize,
    /// A line break separates this token from the previous one.
    pub newline_before: bool,
    /// At least one empty line separates this token from the previous one.
    pub blank_line_before: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokKind {
    /// Identifiers and keywords alike.
    Ident,
    Number,
    Str,
    Template,
    Regex,
    Punct,
    LineComment,
    BlockComment,
}

impl Token {
    pub fn is_punct(&self, p: &str) -> bool {
        self.kind == TokKind::Punct && self.text == p
    }

    pub fn is_ident(&self, name: &str) -> bool {
        self.kind == TokKind::Ident && self.text == name
    }

    pub fn is_comment(&self) -> bool {
        matches!(self.kind, TokKind::LineComment | TokKind::BlockComment)
    }
}

/// Longest-first punctuator table.
const PUNCTUATORS: &[&str] = &[
    ">>>=", "...", "===", "!==", "**=", "<<=", ">>=", ">>>", "&&=", "||=", "??=", "=>", "==",
    "!=", "<=", ">=", "&&", "||", "??", "?.", "++", "--", "+=", "-=", "*=", "/=", "%=", "&=",
    "|=", "^=", "**", "<<", ">>", "{", "}", "(", ")", "[", "]", ";", ",", "<", ">", "+", "-",
    "*", "/", "%", "&", "|", "^", "!", "~", "?", ":", "=", ".", "@",
];

/// Keywords after which a `/` starts a regular expression.
const REGEX_AFTER_KEYWORDS: &[&str] = &[
    "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case", "do",
    "else", "yield", "await",
];

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, FormatError> {
        let mut tokens: Vec<Token> = Vec::new();

        if self.peek_str("#!") {
            while !self.is_at_end() && self.peek() != '\n' {
                self.advance();
            }
        }

        loop {
            let newlines = self.skip_whitespace();
            if self.is_at_end() {
                break;
            }

            let line = self.line;
            let col = self.col;
            let start = self.pos;
            let ch = self.peek();

            let kind = if ch == '/' && self.peek_at(1) == Some('/') {
                while !self.is_at_end() && self.peek() != '\n' {
                    self.advance();
                }
                TokKind::LineComment
            } else if ch == '/' && self.peek_at(1) == Some('*') {
                self.block_comment(line, col)?;
                TokKind::BlockComment
            } else if ch == '"' || ch == '\'' {
                self.string(ch, line, col)?;
                TokKind::Str
            } else if ch == '`' {
                self.template(line, col)?;
                TokKind::Template
            } else if ch.is_ascii_digit()
                || (ch == '.' && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()))
            {
                self.number();
                TokKind::Number
            } else if is_ident_start(ch) || (ch == '#' && self.peek_at(1).is_some_and(is_ident_start)) {
                self.advance();
                while !self.is_at_end() && is_ident_part(self.peek()) {
                    self.advance();
                }
                TokKind::Ident
            } else if ch == '/' && regex_allowed(last_significant(&tokens)) {
                self.regex(line, col)?;
                TokKind::Regex
            } else {
                self.punct(line, col)?;
                TokKind::Punct
            };

            let text: String = self.chars[start..self.pos].iter().collect();
            tokens.push(Token {
                kind,
                text,
                line,
                col,
                newline_before: newlines > 0,
                blank_line_before: newlines > 1,
            });
        }

        Ok(tokens)
    }

    fn peek(&self) -> char {
        self.chars[self.pos]
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn peek_str(&self, s: &str) -> bool {
        s.chars().enumerate().all(|(i, c)| self.peek_at(i) == Some(c))
    }

    fn advance(&mut self) -> char {
        let ch = self.chars[self.pos];
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        ch
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    /// Skip whitespace, returning how many line breaks were crossed.
    fn skip_whitespace(&mut self) -> usize {
        let mut newlines = 0;
        while !self.is_at_end() && self.peek().is_whitespace() {
            if self.advance() == '\n' {
                newlines += 1;
            }
        }
        newlines
    }

    fn block_comment(&mut self, line: usize, col: usize) -> Result<(), FormatError> {
        self.advance();
        self.advance();
        while !self.is_at_end() {
            if self.peek() == '*' && self.peek_at(1) == Some('/') {
                self.advance();
                self.advance();
                return Ok(());
            }
            self.advance();
        }
        Err(FormatError::new("unterminated comment", line, col))
    }

    fn string(&mut self, quote: char, line: usize, col: usize) -> Result<(), FormatError> {
        self.advance();
        loop {
            if self.is_at_end() || self.peek() == '\n' {
                return Err(FormatError::new("unterminated string literal", line, col));
            }
            match self.advance() {
                '\\' => {
                    if self.is_at_end() {
                        return Err(FormatError::new("unterminated string literal", line, col));
                    }
                    self.advance();
                }
                c if c == quote => return Ok(()),
                _ => {}
            }
        }
    }

    fn template(&mut self, line: usize, col: usize) -> Result<(), FormatError> {
        self.advance();
        loop {
            if self.is_at_end() {
                return Err(FormatError::new("unterminated template literal", line, col));
            }
            match self.advance() {
                '\\' => {
                    if !self.is_at_end() {
                        self.advance();
                    }
                }
                '`' => return Ok(()),
                '$' if !self.is_at_end() && self.peek() == '{' => {
                    self.advance();
                    self.substitution(line, col)?;
                }
                _ => {}
            }
        }
    }

    /// Skip a `${ … }` substitution, including nested literals.
    fn substitution(&mut self, line: usize, col: usize) -> Result<(), FormatError> {
        let mut depth = 1usize;
        while !self.is_at_end() {
            let (l, c) = (self.line, self.col);
            match self.peek() {
                '{' => {
                    self.advance();
                    depth += 1;
                }
                '}' => {
                    self.advance();
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                q @ ('"' | '\'') => self.string(q, l, c)?,
                '`' => self.template(l, c)?,
                '/' if self.peek_at(1) == Some('*') => self.block_comment(l, c)?,
                '/' if self.peek_at(1) == Some('/') => {
                    while !self.is_at_end() && self.peek() != '\n' {
                        self.advance();
                    }
                }
                _ => {
                    self.advance();
                }
            }
        }
        Err(FormatError::new("unterminated template literal", line, col))
    }

    fn number(&mut self) {
        if self.peek() == '0' && matches!(self.peek_at(1), Some('x' | 'X' | 'o' | 'O' | 'b' | 'B')) {
            self.advance();
            self.advance();
            while !self.is_at_end() && (self.peek().is_ascii_hexdigit() || self.peek() == '_') {
                self.advance();
            }
        } else {
            while !self.is_at_end() && (self.peek().is_ascii_digit() || self.peek() == '_') {
                self.advance();
            }
            if !self.is_at_end() && self.peek() == '.' {
                self.advance();
                while !self.is_at_end() && (self.peek().is_ascii_digit() || self.peek() == '_') {
                    self.advance();
                }
            }
            if !self.is_at_end() && matches!(self.peek(), 'e' | 'E') {
                let sign = matches!(self.peek_at(1), Some('+' | '-'));
                let digit_at = if sign { 2 } else { 1 };
                if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                    for _ in 0..digit_at {
                        self.advance();
                    }
                    while !self.is_at_end() && self.peek().is_ascii_digit() {
                        self.advance();
                    }
                }
            }
        }
        if !self.is_at_end() && self.peek() == 'n' {
            self.advance();
        }
    }

    fn regex(&mut self, line: usize, col: usize) -> Result<(), FormatError> {
        self.advance();
        let mut in_class = false;
        loop {
            if self.is_at_end() || self.peek() == '\n' {
                return Err(FormatError::new(
                    "unterminated regular expression",
                    line,
                    col,
                ));
            }
            match self.advance() {
                '\\' => {
                    if !self.is_at_end() && self.peek() != '\n' {
                        self.advance();
                    }
                }
                '[' => in_class = true,
                ']' => in_class = false,
                '/' if !in_class => break,
                _ => {}
            }
        }
        while !self.is_at_end() && self.peek().is_ascii_alphabetic() {
            self.advance();
        }
        Ok(())
    }

    fn punct(&mut self, line: usize, col: usize) -> Result<(), FormatError> {
        // `?.5` is a conditional followed by a number.
        let optional_number =
            self.peek_str("?.") && self.peek_at(2).is_some_and(|c| c.is_ascii_digit());
        for p in PUNCTUATORS {
            if optional_number && *p == "?." {
                continue;
            }
            if self.peek_str(p) {
                for _ in 0..p.chars().count() {
                    self.advance();
                }
                return Ok(());
            }
        }
        Err(FormatError::new(
            format!("unexpected character '{}'", self.peek()),
            line,
            col,
        ))
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$' || c == '\u{200c}' || c == '\u{200d}'
}

fn last_significant(tokens: &[Token]) -> Option<&Token> {
    tokens.iter().rev().find(|t| !t.is_comment())
}

fn regex_allowed(prev: Option<&Token>) -> bool {
    match prev {
        None => true,
        Some(t) => match t.kind {
            TokKind::Punct => !matches!(t.text.as_str(), ")" | "]" | "}" | "++" | "--"),
            TokKind::Ident => REGEX_AFTER_KEYWORDS.contains(&t.text.as_str()),
            _ => false,
        },
    }
}
