//! Sieve → Cloudflare Email Worker compiler.
//!
//! sieve-rs parses the script and checks its `require`s; [`program`] reads
//! back the compiled instruction list and [`codegen`] turns it into a
//! worker module.

pub mod codegen;
pub mod error;
pub mod program;

pub use codegen::GenerateOpts;
pub use error::{CompileError, ErrorKind};
pub use program::Program;

use crate::pipeline::Compile;

/// Entry point for the whole compiler.
pub struct Compiler;

impl Compiler {
    /// Compile a script to the JavaScript source of a worker module.
    pub fn compile(source: &str, opts: &GenerateOpts) -> Result<String, CompileError> {
        let program = Program::compile(source)?;
        codegen::CodeGen::new(opts, &program.instructions).generate_js()
    }
}

/// The production [`Compile`] implementation.
#[derive(Debug, Clone, Default)]
pub struct SieveCompiler {
    opts: GenerateOpts,
}

impl SieveCompiler {
    pub fn new(opts: GenerateOpts) -> Self {
        Self { opts }
    }

    pub fn opts(&self) -> &GenerateOpts {
        &self.opts
    }
}

impl Compile for SieveCompiler {
    type Error = CompileError;

    fn compile(&self, source: &str) -> Result<String, CompileError> {
        Compiler::compile(source, &self.opts)
    }
}
