use thiserror::Error;

/// The input is not JavaScript the formatter can accept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[{line}:{col}] {message}")]
pub struct FormatError {
    pub message: String,
    pub line: usize,
    pub col: usize,
}

impl FormatError {
    pub fn new(message: impl Into<String>, line: usize, col: usize) -> Self {
        Self {
            message: message.into(),
            line,
            col,
        }
    }
}
