//! Full syntax check of the input, run before anything is printed.
//!
//! The tokenizer and bracket tree only prove the input is balanced; oxc
//! parses it as a real program so `const = = 1` is refused instead of
//! being printed as if it were code.

use oxc_allocator::Allocator;
use oxc_parser::Parser;
use oxc_span::SourceType;

use super::{Dialect, FormatError};

pub fn check(source: &str, dialect: Dialect) -> Result<(), FormatError> {
    let allocator = Allocator::default();
    let source_type = match dialect {
        Dialect::Module => SourceType::mjs(),
        Dialect::Script => SourceType::cjs(),
    };
    let parsed = Parser::new(&allocator, source, source_type).parse();

    let Some(diagnostic) = parsed.errors.first() else {
        return Ok(());
    };
    let offset = diagnostic
        .labels
        .as_ref()
        .and_then(|labels| labels.first())
        .map_or(0, |label| label.offset());
    let (line, col) = position(source, offset);
    Err(FormatError::new(
        format!("invalid JavaScript: {}", diagnostic.message),
        line,
        col,
    ))
}

/// 1-based line and column of a byte offset.
fn position(source: &str, offset: usize) -> (usize, usize) {
    let mut end = offset.min(source.len());
    while !source.is_char_boundary(end) {
        end -= 1;
    }
    let before = &source[..end];
    let line = before.matches('\n').count() + 1;
    let col = before
        .rsplit('\n')
        .next()
        .map_or(0, |tail| tail.chars().count())
        + 1;
    (line, col)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_modules_and_scripts() {
        assert!(check("import a from \"a\"\nexport default a", Dialect::Module).is_ok());
        assert!(check("function f(a) { return a }\nf(1)", Dialect::Script).is_ok());
    }

    #[test]
    fn rejects_token_soup() {
        for src in ["const = = 1", "if if if", "import from from"] {
            let err = check(src, Dialect::Module).unwrap_err();
            assert!(err.message.starts_with("invalid JavaScript"), "{src}: {err}");
            assert_eq!(err.line, 1);
        }
    }

    #[test]
    fn module_syntax_needs_module_dialect() {
        assert!(check("export const a = 1", Dialect::Script).is_err());
    }

    #[test]
    fn error_position_is_line_based() {
        let err = check("const a = 1\nconst = 2", Dialect::Module).unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(position("ab\ncd", 4), (2, 2));
        assert_eq!(position("é", 1), (1, 1));
    }
}
