//! Compile pipeline — Sieve source through the compiler, then the formatter.
//!
//! Both collaborators are injected behind the [`Compile`] and [`Format`]
//! traits. Whatever either of them reports is normalized into a single
//! [`CompileFault`].

use std::any::Any;
use std::fmt;

use thiserror::Error;
use tracing::{debug, info_span, warn};

use crate::jsfmt::{FormatOptions, JsFormatter};
use crate::sieve::{GenerateOpts, SieveCompiler};
use crate::state::RequestId;

/// Turns source text into target code.
pub trait Compile {
    type Error: std::error::Error;

    fn compile(&self, source: &str) -> Result<String, Self::Error>;
}

/// Pretty-prints target code.
pub trait Format {
    type Error: std::error::Error;

    fn format(&self, code: &str, options: &FormatOptions) -> Result<String, Self::Error>;
}

/// Which stage rejected the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultOrigin {
    /// The compiler rejected the script.
    Input,
    /// The formatter rejected what the compiler produced.
    Output,
}

impl fmt::Display for FaultOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultOrigin::Input => write!(f, "input"),
            FaultOrigin::Output => write!(f, "output"),
        }
    }
}

/// A failed pipeline run, in the one shape the UI knows how to show.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CompileFault {
    pub request: Option<RequestId>,
    /// Log-only; never rendered.
    pub origin: FaultOrigin,
    pub message: String,
    /// `Debug` rendering of the native error, for the log.
    pub detail: Option<String>,
}

impl CompileFault {
    pub fn from_input<E: std::error::Error>(err: &E) -> Self {
        Self::from_error(FaultOrigin::Input, err)
    }

    pub fn from_output<E: std::error::Error>(err: &E) -> Self {
        Self::from_error(FaultOrigin::Output, err)
    }

    fn from_error<E: std::error::Error>(origin: FaultOrigin, err: &E) -> Self {
        Self {
            request: None,
            origin,
            message: err.to_string(),
            detail: Some(format!("{err:?}")),
        }
    }

    /// A collaborator panicked instead of returning a result.
    pub fn crashed(payload: &(dyn Any + Send)) -> Self {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "no panic message".to_string());
        Self {
            request: None,
            origin: FaultOrigin::Output,
            message: format!("the compiler crashed: {reason}"),
            detail: None,
        }
    }

    /// Tag the fault with the run that produced it.
    pub fn with_request(mut self, request: RequestId) -> Self {
        self.request = Some(request);
        self
    }
}

/// Compiler followed by formatter.
#[derive(Debug, Clone)]
pub struct CompilePipeline<C, F> {
    compiler: C,
    formatter: F,
}

impl CompilePipeline<SieveCompiler, JsFormatter> {
    /// The production pipeline.
    pub fn sieve(opts: GenerateOpts) -> Self {
        Self::new(SieveCompiler::new(opts), JsFormatter)
    }
}

impl<C: Compile, F: Format> CompilePipeline<C, F> {
    pub fn new(compiler: C, formatter: F) -> Self {
        Self {
            compiler,
            formatter,
        }
    }

    /// Compile then format `source`. Never yields partial text.
    pub fn run(&self, source: &str) -> Result<String, CompileFault> {
        let raw = self
            .compiler
            .compile(source)
            .map_err(|e| CompileFault::from_input(&e))?;
        self.formatter
            .format(&raw, &FormatOptions::worker())
            .map_err(|e| CompileFault::from_output(&e))
    }

    /// [`run`](Self::run) on behalf of a numbered request, logged in its own span.
    pub fn run_request(&self, request: RequestId, source: &str) -> Result<String, CompileFault> {
        let span = info_span!("pipeline_run", request = request.get());
        let _enter = span.enter();

        match self.run(source) {
            Ok(code) => {
                debug!(bytes = code.len(), "pipeline run succeeded");
                Ok(code)
            }
            Err(fault) => {
                let fault = fault.with_request(request);
                warn!(
                    origin = %fault.origin,
                    detail = fault.detail.as_deref().unwrap_or(""),
                    "{}",
                    fault.message
                );
                Err(fault)
            }
        }
    }
}
