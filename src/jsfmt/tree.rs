//! Bracket tree over the token stream.
//!
//! Groups tokens by `()`, `[]` and `{}` nesting. Anything that does not nest
//! cleanly is rejected here, which is most of the syntax checking the
//! formatter does.

use super::error::FormatError;
use super::lexer::{TokKind, Token};
use super::Dialect;

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Token(Token),
    Group(Group),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub open: Token,
    pub close: Token,
    pub children: Vec<Node>,
}

impl Group {
    /// The opening bracket character: `(`, `[` or `{`.
    pub fn delim(&self) -> &str {
        &self.open.text
    }
}

impl Node {
    /// The first token of this node, used for layout facts.
    pub fn first_token(&self) -> &Token {
        match self {
            Node::Token(t) => t,
            Node::Group(g) => &g.open,
        }
    }

    pub fn as_token(&self) -> Option<&Token> {
        match self {
            Node::Token(t) => Some(t),
            Node::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Node::Group(g) => Some(g),
            Node::Token(_) => None,
        }
    }

    pub fn is_group(&self, delim: &str) -> bool {
        self.as_group().is_some_and(|g| g.delim() == delim)
    }

    pub fn is_punct(&self, p: &str) -> bool {
        self.as_token().is_some_and(|t| t.is_punct(p))
    }

    pub fn is_ident(&self, name: &str) -> bool {
        self.as_token().is_some_and(|t| t.is_ident(name))
    }

    pub fn is_comment(&self) -> bool {
        self.as_token().is_some_and(Token::is_comment)
    }
}

fn closer(open: &str) -> &'static str {
    match open {
        "(" => ")",
        "[" => "]",
        _ => "}",
    }
}

/// Build the bracket tree for a whole program.
pub fn build(tokens: Vec<Token>, dialect: Dialect) -> Result<Vec<Node>, FormatError> {
    // Each frame holds an open token and the children collected so far.
    let mut stack: Vec<(Token, Vec<Node>)> = Vec::new();
    let mut top: Vec<Node> = Vec::new();

    for token in tokens {
        let is_open = token.kind == TokKind::Punct && matches!(token.text.as_str(), "(" | "[" | "{");
        let is_close = token.kind == TokKind::Punct && matches!(token.text.as_str(), ")" | "]" | "}");

        if is_open {
            stack.push((token, Vec::new()));
        } else if is_close {
            let Some((open, children)) = stack.pop() else {
                return Err(FormatError::new(
                    format!("unexpected '{}'", token.text),
                    token.line,
                    token.col,
                ));
            };
            if closer(&open.text) != token.text {
                return Err(FormatError::new(
                    format!(
                        "expected '{}' to close '{}' from line {}, found '{}'",
                        closer(&open.text),
                        open.text,
                        open.line,
                        token.text
                    ),
                    token.line,
                    token.col,
                ));
            }
            let group = Node::Group(Group {
                open,
                close: token,
                children,
            });
            match stack.last_mut() {
                Some((_, parent)) => parent.push(group),
                None => top.push(group),
            }
        } else {
            let node = Node::Token(token);
            match stack.last_mut() {
                Some((_, parent)) => parent.push(node),
                None => top.push(node),
            }
        }
    }

    if let Some((open, _)) = stack.pop() {
        return Err(FormatError::new(
            format!("unclosed '{}'", open.text),
            open.line,
            open.col,
        ));
    }

    if dialect == Dialect::Script {
        reject_module_syntax(&top)?;
    }

    Ok(top)
}

/// `import`/`export` declarations are only valid in modules.
fn reject_module_syntax(top: &[Node]) -> Result<(), FormatError> {
    for (i, node) in top.iter().enumerate() {
        let Some(token) = node.as_token() else {
            continue;
        };
        if !(token.is_ident("import") || token.is_ident("export")) {
            continue;
        }
        let after_dot = i > 0 && top[i - 1].is_punct(".");
        let dynamic = token.is_ident("import")
            && top
                .get(i + 1)
                .is_some_and(|n| n.is_group("(") || n.is_punct("."));
        if !after_dot && !dynamic {
            return Err(FormatError::new(
                format!("'{}' declarations are only allowed in modules", token.text),
                token.line,
                token.col,
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jsfmt::lexer::Lexer;

    fn tree(src: &str, dialect: Dialect) -> Result<Vec<Node>, FormatError> {
        build(Lexer::new(src).tokenize()?, dialect)
    }

    #[test]
    fn nests_groups() {
        let nodes = tree("f(a, [b], { c })", Dialect::Module).unwrap();
        assert_eq!(nodes.len(), 2);
        let call = nodes[1].as_group().unwrap();
        assert_eq!(call.delim(), "(");
        assert!(call.children.iter().any(|n| n.is_group("[")));
        assert!(call.children.iter().any(|n| n.is_group("{")));
    }

    #[test]
    fn mismatched_bracket() {
        let err = tree("f(a]", Dialect::Module).unwrap_err();
        assert!(err.message.contains("expected ')'"));
        assert_eq!((err.line, err.col), (1, 4));
    }

    #[test]
    fn unclosed_bracket() {
        let err = tree("if (a) {\n  b()\n", Dialect::Module).unwrap_err();
        assert_eq!(err.message, "unclosed '{'");
        assert_eq!((err.line, err.col), (1, 8));
    }

    #[test]
    fn stray_closer() {
        assert!(tree("a }", Dialect::Module).is_err());
    }

    #[test]
    fn script_rejects_imports() {
        let src = "import x from \"y\"";
        assert!(tree(src, Dialect::Module).is_ok());
        let err = tree(src, Dialect::Script).unwrap_err();
        assert!(err.message.contains("only allowed in modules"));
        assert!(tree("import(\"y\").then(f)", Dialect::Script).is_ok());
    }
}
