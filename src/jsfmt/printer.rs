//! Canonical printer over the bracket tree.
//!
//! Statement contexts (the program and block bodies) are split into
//! statements using explicit semicolons and the ASI rules; everything inside
//! a statement is printed inline with canonical spacing. Brace groups are
//! either blocks (always broken when non-empty) or object-like lists, which
//! break only when the source broke them or they contain a block.

use super::lexer::{TokKind, Token};
use super::tree::{Group, Node};
use super::FormatOptions;

const ASSIGN_OPS: &[&str] = &[
    "=", "+=", "-=", "*=", "/=", "%=", "**=", "<<=", ">>=", ">>>=", "&=", "|=", "^=", "&&=",
    "||=", "??=",
];

/// Words that are followed by a space before `(` or `[` and after which
/// `+`/`-` are prefix operators.
const SPACED_KEYWORDS: &[&str] = &[
    "if", "for", "while", "switch", "catch", "with", "return", "typeof", "void", "delete",
    "await", "yield", "throw", "case", "in", "of", "instanceof", "new", "else", "do",
    "function", "async", "const", "let", "var", "export", "from", "as", "default", "extends",
];

/// Words after which a line break never ends the statement.
const CONTINUE_KEYWORDS: &[&str] = &[
    "new", "typeof", "void", "delete", "await", "in", "of", "instanceof", "const", "let", "var",
    "extends", "else", "case", "throw", "function", "class", "import", "export", "from", "as",
    "default", "do", "try", "finally",
];

/// Statements that never start with one of these are "expression-like" and
/// still need a terminator after a trailing function body.
const EXPRESSION_STARTS: &[&str] = &[
    "const", "let", "var", "return", "throw", "yield", "await", "new", "typeof", "void", "delete",
];

pub fn print(nodes: &[Node], options: &FormatOptions) -> String {
    let mut printer = Printer {
        out: String::new(),
        indent: 0,
        line_start: true,
        options,
    };
    let items = split(nodes, Mode::Statements);
    printer.items(&items, Mode::Statements);
    printer.out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Program or block body: `;` and ASI separate statements.
    Statements,
    /// Broken object-like brace: `,` separates entries.
    List,
}

#[derive(Debug)]
enum Item<'a> {
    Stmt(Stmt<'a>),
    Comment { token: &'a Token, blank_before: bool },
}

impl Item<'_> {
    fn blank_before(&self) -> bool {
        match self {
            Item::Stmt(s) => s.blank_before,
            Item::Comment { blank_before, .. } => *blank_before,
        }
    }
}

#[derive(Debug)]
struct Stmt<'a> {
    nodes: Vec<&'a Node>,
    blank_before: bool,
    trailing: Option<&'a Token>,
}

// --- Splitting ---

struct Splitter<'a> {
    mode: Mode,
    items: Vec<Item<'a>>,
    cur: Vec<&'a Node>,
    cur_blank: bool,
    pending: Vec<&'a Node>,
    carry_blank: bool,
}

fn split(nodes: &[Node], mode: Mode) -> Vec<Item<'_>> {
    let mut s = Splitter {
        mode,
        items: Vec::new(),
        cur: Vec::new(),
        cur_blank: false,
        pending: Vec::new(),
        carry_blank: false,
    };
    for node in nodes {
        s.push(node);
    }
    s.finish();
    s.items
}

impl<'a> Splitter<'a> {
    fn push(&mut self, node: &'a Node) {
        if let Some(token) = node.as_token() {
            if token.is_comment() {
                self.comment(node, token);
                return;
            }
            let terminator = match self.mode {
                Mode::Statements => token.is_punct(";"),
                Mode::List => token.is_punct(","),
            };
            if terminator {
                self.finish();
                if token.newline_before {
                    self.carry_blank = token.blank_line_before;
                }
                return;
            }
        }

        if self.cur.is_empty() {
            self.start(node);
        } else {
            let newline = node.first_token().newline_before
                || self.pending.iter().any(|n| {
                    let t = n.first_token();
                    t.newline_before || t.kind == TokKind::LineComment
                });
            if self.mode == Mode::Statements && ends_statement(&self.cur, node, newline) {
                self.finish();
                self.start(node);
            } else {
                self.cur.append(&mut self.pending);
                self.cur.push(node);
            }
        }

        if self.mode == Mode::Statements && node.is_punct(":") && is_case_label(&self.cur) {
            self.finish();
        }
    }

    fn start(&mut self, node: &'a Node) {
        self.cur_blank = self.carry_blank || node.first_token().blank_line_before;
        self.carry_blank = false;
        self.cur.push(node);
    }

    fn comment(&mut self, node: &'a Node, token: &'a Token) {
        if !self.cur.is_empty() {
            self.pending.push(node);
            return;
        }
        if !token.newline_before {
            if let Some(Item::Stmt(stmt)) = self.items.last_mut() {
                if stmt.trailing.is_none() {
                    stmt.trailing = Some(token);
                    return;
                }
            }
        }
        self.items.push(Item::Comment {
            token,
            blank_before: token.blank_line_before,
        });
    }

    /// Close the current statement, attaching same-line comments.
    fn finish(&mut self) {
        if self.cur.is_empty() {
            return;
        }
        let mut stmt = Stmt {
            nodes: std::mem::take(&mut self.cur),
            blank_before: self.cur_blank,
            trailing: None,
        };
        let mut pending = std::mem::take(&mut self.pending);
        if pending
            .first()
            .is_some_and(|n| !n.first_token().newline_before)
        {
            let first: &'a Node = pending.remove(0);
            stmt.trailing = Some(first.first_token());
        }
        self.items.push(Item::Stmt(stmt));
        for node in pending {
            let token = node.first_token();
            self.items.push(Item::Comment {
                token,
                blank_before: token.blank_line_before,
            });
        }
    }
}

fn leading_words<'a>(cur: &[&'a Node]) -> Vec<&'a str> {
    cur.iter()
        .take(4)
        .map_while(|n| {
            n.as_token()
                .filter(|t| t.kind == TokKind::Ident)
                .map(|t| t.text.as_str())
        })
        .collect()
}

fn is_case_label(cur: &[&Node]) -> bool {
    let Some(first) = cur.first() else {
        return false;
    };
    let labelled = first.is_ident("case") || (cur.len() == 2 && first.is_ident("default"));
    labelled && !cur.iter().any(|n| n.is_punct("?"))
}

/// Statements whose body is a block: `if`, loops, declarations and the like.
fn is_block_statement(cur: &[&Node]) -> bool {
    if cur.first().is_some_and(|n| n.is_group("{")) {
        return true;
    }
    let words = leading_words(cur);
    let declaration = |w: &[&str]| match w {
        ["function", ..] | ["class", ..] => true,
        ["async", "function", ..] => true,
        _ => false,
    };
    match words.as_slice() {
        ["if" | "for" | "while" | "switch" | "try" | "do" | "with", ..] => true,
        ["export", "default", rest @ ..] => declaration(rest),
        ["export", rest @ ..] => declaration(rest),
        w => declaration(w),
    }
}

fn is_expression_like(cur: &[&Node]) -> bool {
    if cur
        .first()
        .and_then(|n| n.as_token())
        .is_some_and(|t| t.kind == TokKind::Ident && EXPRESSION_STARTS.contains(&t.text.as_str()))
    {
        return true;
    }
    cur.iter().any(|n| {
        n.as_token().is_some_and(|t| {
            t.kind == TokKind::Punct && (t.text == "=>" || ASSIGN_OPS.contains(&t.text.as_str()))
        })
    })
}

/// Whether the `{` at `seq[idx]` opens a block rather than an object.
fn is_block_brace(seq: &[&Node], idx: usize, stmt_start: bool) -> bool {
    if idx == 0 {
        return stmt_start;
    }
    let prev = seq[idx - 1];
    if prev.is_group("(") {
        return true;
    }
    let Some(t) = prev.as_token() else {
        return false;
    };
    if t.is_punct("=>") {
        return true;
    }
    if t.kind != TokKind::Ident {
        return false;
    }
    if matches!(t.text.as_str(), "else" | "try" | "finally" | "do") {
        return true;
    }
    // Class body: `class A {` or `class A extends B {`.
    seq[..idx].iter().any(|n| n.is_ident("class"))
}

fn brace_is_block(seq: &[&Node], idx: usize, stmt_start: bool, group: &Group) -> bool {
    is_block_brace(seq, idx, stmt_start) || group.children.iter().any(|n| n.is_punct(";"))
}

/// The statement ends with a block body and needs no terminator.
fn ends_with_block(cur: &[&Node]) -> bool {
    let Some(last) = cur.last() else {
        return false;
    };
    let Some(group) = last.as_group() else {
        return false;
    };
    if group.delim() != "{" || !brace_is_block(cur, cur.len() - 1, true, group) {
        return false;
    }
    is_block_statement(cur) || !is_expression_like(cur)
}

fn awaiting_body(cur: &[&Node]) -> bool {
    let len = cur.len();
    if len < 2 || !cur[len - 1].is_group("(") {
        return false;
    }
    let before = cur[len - 2];
    if ["if", "for", "while", "switch", "catch", "with"]
        .iter()
        .any(|k| before.is_ident(k))
    {
        return true;
    }
    if len >= 3 && before.is_ident("await") && cur[len - 3].is_ident("for") {
        return true;
    }
    cur.iter().any(|n| n.is_ident("function")) && !cur.iter().any(|n| n.is_group("{"))
}

/// ASI: does `next` start a new statement after `cur`?
fn ends_statement(cur: &[&Node], next: &Node, newline: bool) -> bool {
    let first = cur.first();
    if next.is_ident("else") && first.is_some_and(|n| n.is_ident("if")) {
        return false;
    }
    if (next.is_ident("catch") || next.is_ident("finally")) && first.is_some_and(|n| n.is_ident("try")) {
        return false;
    }
    if next.is_ident("while") && first.is_some_and(|n| n.is_ident("do")) {
        return false;
    }
    if ends_with_block(cur) {
        return true;
    }
    if !newline {
        return false;
    }

    if let Some(last) = cur.last().and_then(|n| n.as_token()) {
        match last.kind {
            TokKind::Punct => {
                return matches!(last.text.as_str(), "++" | "--");
            }
            TokKind::Ident => {
                if matches!(last.text.as_str(), "return" | "break" | "continue") {
                    return true;
                }
                if CONTINUE_KEYWORDS.contains(&last.text.as_str()) {
                    return false;
                }
            }
            _ => {}
        }
    }

    if awaiting_body(cur) {
        return false;
    }

    match next {
        Node::Group(g) => g.delim() == "{",
        Node::Token(t) => match t.kind {
            TokKind::Punct => matches!(t.text.as_str(), "++" | "--" | "!" | "~" | "@"),
            TokKind::Template => false,
            TokKind::Ident => !matches!(t.text.as_str(), "in" | "of" | "instanceof"),
            _ => true,
        },
    }
}

fn needs_leading_semicolon(nodes: &[&Node]) -> bool {
    match nodes.first() {
        Some(Node::Group(g)) => g.delim() != "{",
        Some(Node::Token(t)) => {
            matches!(t.kind, TokKind::Template | TokKind::Regex)
                || t.is_punct("+")
                || t.is_punct("-")
        }
        None => false,
    }
}

// --- Printing ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Atom<'a> {
    Word(&'a str),
    Value,
    Template,
    Op,
    Prefix,
    Postfix,
    Comma,
    Dot,
    KeyColon,
    Comment,
    Group(&'a str),
}

struct Printer<'o> {
    out: String,
    indent: usize,
    line_start: bool,
    options: &'o FormatOptions,
}

impl Printer<'_> {
    fn write(&mut self, s: &str) {
        if self.line_start {
            let width = self.indent * self.options.indent_width;
            self.out.extend(std::iter::repeat(' ').take(width));
            self.line_start = false;
        }
        self.out.push_str(s);
    }

    fn newline(&mut self) {
        self.out.push('\n');
        self.line_start = true;
    }

    fn items(&mut self, items: &[Item<'_>], mode: Mode) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 && item.blank_before() {
                self.newline();
            }
            match item {
                Item::Comment { token, .. } => self.write(&token.text),
                Item::Stmt(stmt) => self.statement(stmt, mode),
            }
            self.newline();
        }
    }

    fn statement(&mut self, stmt: &Stmt<'_>, mode: Mode) {
        match mode {
            Mode::Statements => {
                let semi = self.options.semicolons;
                if !semi && needs_leading_semicolon(&stmt.nodes) {
                    self.write(";");
                }
                self.flow(&stmt.nodes, true);
                if semi && !ends_with_block(&stmt.nodes) && !is_case_label(&stmt.nodes) {
                    self.write(";");
                }
            }
            Mode::List => {
                self.flow(&stmt.nodes, false);
                self.write(",");
            }
        }
        if let Some(comment) = stmt.trailing {
            self.write(" ");
            self.write(&comment.text);
        }
    }

    fn broken(&mut self, children: &[Node], mode: Mode) {
        self.write("{");
        self.newline();
        self.indent += 1;
        let items = split(children, mode);
        self.items(&items, mode);
        self.indent -= 1;
        self.write("}");
    }

    /// Print nodes on one line (groups may still break).
    fn flow(&mut self, nodes: &[&Node], stmt_start: bool) {
        let mut prev: Option<Atom<'_>> = None;
        let mut questions = 0usize;

        for (idx, node) in nodes.iter().enumerate() {
            match node {
                Node::Token(t) => {
                    let atom = classify(t, prev, &mut questions);
                    if space_between(prev, atom) {
                        self.write(" ");
                    }
                    match t.kind {
                        TokKind::Str => self.write(&normalize_string(&t.text)),
                        TokKind::LineComment => self.write(&inline_comment(&t.text)),
                        _ => self.write(&t.text),
                    }
                    prev = Some(atom);
                }
                Node::Group(g) => {
                    let atom = Atom::Group(g.delim());
                    if space_between(prev, atom) {
                        self.write(" ");
                    }
                    self.group(g, nodes, idx, stmt_start);
                    prev = Some(Atom::Group(match g.delim() {
                        "(" => ")",
                        "[" => "]",
                        _ => "}",
                    }));
                }
            }
        }
    }

    fn group(&mut self, g: &Group, seq: &[&Node], idx: usize, stmt_start: bool) {
        match g.delim() {
            "{" => {
                if g.children.is_empty() {
                    self.write("{}");
                } else if brace_is_block(seq, idx, stmt_start, g) {
                    self.broken(&g.children, Mode::Statements);
                } else if object_breaks(g) {
                    self.broken(&g.children, Mode::List);
                } else {
                    self.write("{ ");
                    self.inline_children(&g.children);
                    self.write(" }");
                }
            }
            open => {
                self.write(open);
                self.inline_children(&g.children);
                self.write(if open == "(" { ")" } else { "]" });
            }
        }
    }

    fn inline_children(&mut self, children: &[Node]) {
        let mut refs: Vec<&Node> = children.iter().collect();
        let last_real = refs.iter().rposition(|n| !n.is_comment());
        if let Some(i) = last_real {
            if refs[i].is_punct(",") {
                refs.remove(i);
            }
        }
        self.flow(&refs, false);
    }
}

fn classify<'a>(t: &'a Token, prev: Option<Atom<'_>>, questions: &mut usize) -> Atom<'a> {
    let value_before = matches!(
        prev,
        Some(Atom::Value | Atom::Template | Atom::Postfix | Atom::Group(")" | "]" | "}"))
    ) || matches!(prev, Some(Atom::Word(w)) if !SPACED_KEYWORDS.contains(&w));

    match t.kind {
        TokKind::Ident => Atom::Word(&t.text),
        TokKind::Number | TokKind::Str | TokKind::Regex => Atom::Value,
        TokKind::Template => Atom::Template,
        TokKind::LineComment | TokKind::BlockComment => Atom::Comment,
        TokKind::Punct => match t.text.as_str() {
            "," | ";" => Atom::Comma,
            "." | "?." => Atom::Dot,
            "++" | "--" => {
                if value_before {
                    Atom::Postfix
                } else {
                    Atom::Prefix
                }
            }
            "!" | "~" | "..." | "@" => Atom::Prefix,
            "+" | "-" => {
                if value_before {
                    Atom::Op
                } else {
                    Atom::Prefix
                }
            }
            "?" => {
                *questions += 1;
                Atom::Op
            }
            ":" => {
                if *questions > 0 {
                    *questions -= 1;
                    Atom::Op
                } else {
                    Atom::KeyColon
                }
            }
            _ => Atom::Op,
        },
    }
}

fn space_between(prev: Option<Atom<'_>>, next: Atom<'_>) -> bool {
    let Some(prev) = prev else {
        return false;
    };
    match (prev, next) {
        (_, Atom::Comma | Atom::Dot | Atom::Postfix | Atom::KeyColon) => false,
        (Atom::Dot | Atom::Prefix, _) => false,
        (_, Atom::Group("(" | "[")) => match prev {
            Atom::Word(w) => SPACED_KEYWORDS.contains(&w),
            Atom::Value | Atom::Template | Atom::Group(_) | Atom::Postfix => false,
            _ => true,
        },
        (Atom::Word(w), Atom::Template) => SPACED_KEYWORDS.contains(&w),
        (Atom::Group(_), Atom::Template) => false,
        _ => true,
    }
}

fn object_breaks(g: &Group) -> bool {
    g.close.newline_before
        || g.children.iter().any(|n| {
            let t = n.first_token();
            t.newline_before || t.kind == TokKind::LineComment
        })
        || contains_block(&g.children)
}

fn contains_block(children: &[Node]) -> bool {
    let refs: Vec<&Node> = children.iter().collect();
    children.iter().enumerate().any(|(i, n)| match n {
        Node::Group(g) => {
            (g.delim() == "{" && !g.children.is_empty() && brace_is_block(&refs, i, false, g))
                || contains_block(&g.children)
        }
        Node::Token(_) => false,
    })
}

/// Line comments inside a single-line construct become block comments.
fn inline_comment(text: &str) -> String {
    let body = text.trim_start_matches("//").trim().replace("*/", "* /");
    format!("/* {body} */")
}

/// Re-quote a string literal, preferring double quotes unless the content
/// holds more double than single quotes.
pub(crate) fn normalize_string(raw: &str) -> String {
    enum Unit<'a> {
        Char(char),
        Quote(char),
        Escape(&'a str),
    }

    let inner = &raw[1..raw.len() - 1];
    let mut units = Vec::new();
    let mut iter = inner.char_indices().peekable();
    while let Some((i, c)) = iter.next() {
        match c {
            '\\' => match iter.next() {
                Some((_, q @ ('\'' | '"'))) => units.push(Unit::Quote(q)),
                Some((j, n)) => units.push(Unit::Escape(&inner[i..j + n.len_utf8()])),
                None => units.push(Unit::Escape(&inner[i..])),
            },
            '\'' | '"' => units.push(Unit::Quote(c)),
            c => units.push(Unit::Char(c)),
        }
    }

    let doubles = units.iter().filter(|u| matches!(u, Unit::Quote('"'))).count();
    let singles = units.iter().filter(|u| matches!(u, Unit::Quote('\''))).count();
    let quote = if doubles > singles { '\'' } else { '"' };

    let mut out = String::with_capacity(raw.len());
    out.push(quote);
    for unit in units {
        match unit {
            Unit::Quote(q) if q == quote => {
                out.push('\\');
                out.push(q);
            }
            Unit::Quote(q) | Unit::Char(q) => out.push(q),
            Unit::Escape(s) => out.push_str(s),
        }
    }
    out.push(quote);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_prefers_double_quotes() {
        assert_eq!(normalize_string("'abc'"), "\"abc\"");
        assert_eq!(normalize_string(r#"'say "hi"'"#), r#"'say "hi"'"#);
        assert_eq!(normalize_string(r#"'it\'s'"#), r#""it's""#);
        assert_eq!(normalize_string(r#""a\nb""#), r#""a\nb""#);
    }

    #[test]
    fn normalize_is_stable() {
        for raw in [r#"'a"b'"#, r#""it's""#, r#"'\\'"#, r#""mixed ' and \" ""#] {
            let once = normalize_string(raw);
            assert_eq!(normalize_string(&once), once);
        }
    }

    #[test]
    fn inline_comment_conversion() {
        assert_eq!(inline_comment("// note"), "/* note */");
        assert_eq!(inline_comment("//a */ b"), "/* a * / b */");
    }
}
