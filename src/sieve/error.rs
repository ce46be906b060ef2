//! Error types for the Sieve compiler.

use thiserror::Error;

/// An error that occurred while compiling a Sieve script.
///
/// `line` and `col` are 1-based. Errors raised after parsing, against the
/// compiled instruction stream, have no source position and carry `0`.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}{kind}: {message}", position(.line, .col))]
pub struct CompileError {
    pub message: String,
    pub line: usize,
    pub col: usize,
    pub kind: ErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    LexError,
    ParseError,
    CapabilityError,
    CodegenError,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::LexError => "syntax error",
            Self::ParseError => "parse error",
            Self::CapabilityError => "capability error",
            Self::CodegenError => "unsupported",
        };
        f.write_str(label)
    }
}

fn position(line: &usize, col: &usize) -> String {
    if *line == 0 {
        String::new()
    } else {
        format!("[{line}:{col}] ")
    }
}

impl CompileError {
    /// A construct the worker backend cannot express.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: 0,
            col: 0,
            kind: ErrorKind::CodegenError,
        }
    }
}

impl From<::sieve::compiler::CompileError> for CompileError {
    fn from(err: ::sieve::compiler::CompileError) -> Self {
        use ::sieve::compiler::ErrorType;

        let kind = match err.error_type() {
            ErrorType::InvalidCharacter(_)
            | ErrorType::InvalidNumber(_)
            | ErrorType::InvalidUnicodeSequence(_)
            | ErrorType::InvalidUtf8String
            | ErrorType::UnterminatedString
            | ErrorType::UnterminatedComment
            | ErrorType::UnterminatedMultiline => ErrorKind::LexError,
            ErrorType::UndeclaredCapability(_) => ErrorKind::CapabilityError,
            _ => ErrorKind::ParseError,
        };
        // The position is kept in its own fields, not in the text.
        let text = err.to_string();
        let message = match text.rsplit_once(" at line ") {
            Some((message, _)) => message.to_string(),
            None => text,
        };
        Self {
            message,
            line: err.line_num(),
            col: err.line_pos(),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_error(source: &str) -> CompileError {
        match ::sieve::Compiler::new().compile(source.as_bytes()) {
            Ok(_) => panic!("{source:?} compiled"),
            Err(err) => err.into(),
        }
    }

    #[test]
    fn display_includes_position_and_kind() {
        let err = CompileError {
            message: "Unterminated string".to_string(),
            line: 3,
            col: 14,
            kind: ErrorKind::LexError,
        };
        assert_eq!(err.to_string(), "[3:14] syntax error: Unterminated string");
    }

    #[test]
    fn unsupported_has_no_position() {
        let err = CompileError::unsupported("redirect :notify");
        assert_eq!(err.kind, ErrorKind::CodegenError);
        assert_eq!(err.to_string(), "unsupported: redirect :notify");
    }

    #[test]
    fn parser_errors_are_classified() {
        let err = parse_error("keep;\nif true { discard; ");
        assert_eq!(err.kind, ErrorKind::ParseError);

        let err = parse_error("require \"fileinto\";\nif header :is \"a\" \"b { keep; }");
        assert_eq!(err.kind, ErrorKind::LexError);
        assert_eq!(err.message, "Unterminated string");

        let err = parse_error("set \"a\" \"b\";");
        assert_eq!(err.kind, ErrorKind::CapabilityError);
        assert!(err.message.contains("'variables'"), "{}", err.message);
        assert_eq!(err.line, 1);
    }

    #[test]
    fn position_suffix_is_stripped() {
        let err = parse_error("discard");
        assert!(!err.message.contains(" at line "), "{}", err.message);
        assert!(!err.message.is_empty());
    }
}
