//! A small canonical JavaScript pretty-printer.
//!
//! The source is tokenized, grouped by brackets, checked by a real parser
//! ([`syntax`]), then re-printed with one statement per line, broken blocks
//! and canonical spacing. Output is stable: formatting already formatted
//! code returns it unchanged.

pub mod error;
pub mod lexer;
pub mod printer;
pub mod syntax;
pub mod tree;

pub use error::FormatError;

use crate::pipeline::Format;

/// Which top-level syntax is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// ES module: `import`/`export` declarations allowed.
    #[default]
    Module,
    /// Classic script.
    Script,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOptions {
    pub dialect: Dialect,
    /// Terminate statements with `;`. When false, only protective leading
    /// semicolons are printed.
    pub semicolons: bool,
    pub indent_width: usize,
}

impl FormatOptions {
    /// Options used for generated worker modules.
    pub fn worker() -> Self {
        Self {
            dialect: Dialect::Module,
            semicolons: false,
            indent_width: 2,
        }
    }
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            dialect: Dialect::Module,
            semicolons: true,
            indent_width: 2,
        }
    }
}

/// Format `source` according to `options`. Input that is not a valid
/// program in the chosen dialect is an error, never printed.
pub fn format(source: &str, options: &FormatOptions) -> Result<String, FormatError> {
    layout(source, options, true)
}

fn layout(source: &str, options: &FormatOptions, check: bool) -> Result<String, FormatError> {
    let tokens = lexer::Lexer::new(source).tokenize()?;
    let nodes = tree::build(tokens, options.dialect)?;
    if check {
        syntax::check(source, options.dialect)?;
    }
    Ok(printer::print(&nodes, options))
}

/// The production [`Format`] implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsFormatter;

impl Format for JsFormatter {
    type Error = FormatError;

    fn format(&self, code: &str, options: &FormatOptions) -> Result<String, FormatError> {
        format(code, options)
    }
}
