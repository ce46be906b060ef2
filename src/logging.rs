//! Logging infrastructure using `tracing` and `tracing-subscriber`.
//!
//! While the TUI owns the terminal nothing may be written to stdout or
//! stderr, so interactive sessions log to a file (`~/.sieveplay/sieveplay.log`
//! unless overridden). `--print` runs log to stderr.
//!
//! # Log Levels
//!
//! - `warn`: failed pipeline runs, with origin and native error detail
//! - `info`: startup, config source, shutdown
//! - `debug`: runs issued and resolved, stale runs discarded
//! - `trace`: key events

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::{Level, Subscriber};
use tracing_subscriber::{
    filter::ParseError,
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
    EnvFilter,
};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("cannot open log file {path}: {source}")]
    Open { path: PathBuf, source: io::Error },
    #[error("cannot install log subscriber: {0}")]
    Init(#[from] TryInitError),
    #[error("invalid log_level {directive:?}: {source}")]
    Directive { directive: String, source: ParseError },
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: Level,
    /// Explicit filter directive; wins over `level` and `RUST_LOG`.
    pub directive: Option<String>,
    /// Let `RUST_LOG` decide when no directive is given.
    pub honor_env: bool,
    pub with_ansi: bool,
    /// Writes to stderr when `None`.
    pub log_file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            directive: None,
            honor_env: true,
            with_ansi: false,
            log_file: None,
        }
    }
}

impl LogConfig {
    /// - 0 (no `-v`): info, or whatever `RUST_LOG` says
    /// - 1 (`-v`): debug
    /// - 2+ (`-vv`): trace
    #[must_use]
    pub fn from_verbosity(verbosity: u8) -> Self {
        let level = match verbosity {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        };
        Self {
            level,
            honor_env: verbosity == 0,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_directive(mut self, directive: Option<String>) -> Self {
        self.directive = directive;
        self
    }

    #[must_use]
    pub fn with_ansi(mut self, enable: bool) -> Self {
        self.with_ansi = enable;
        self
    }

    #[must_use]
    pub fn with_log_file(mut self, path: Option<PathBuf>) -> Self {
        self.log_file = path;
        self
    }

    /// Check the explicit directive. An invalid one is ignored by the
    /// subscriber, which falls back to `level` or `RUST_LOG`.
    pub fn validate(&self) -> Result<(), LoggingError> {
        match &self.directive {
            Some(directive) => EnvFilter::try_new(directive)
                .map(drop)
                .map_err(|source| LoggingError::Directive {
                    directive: directive.clone(),
                    source,
                }),
            None => Ok(()),
        }
    }
}

/// Install the global subscriber. Call once at startup.
pub fn init_logging(config: &LogConfig) -> Result<(), LoggingError> {
    match &config.log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|source| LoggingError::Open {
                    path: path.clone(),
                    source,
                })?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| LoggingError::Open {
                    path: path.clone(),
                    source,
                })?;
            subscriber(config, SharedFileWriter::new(file)).try_init()?;
        }
        None => subscriber(config, io::stderr).try_init()?,
    }
    if let Err(e) = config.validate() {
        tracing::warn!("{e}; using the default filter");
    }
    Ok(())
}

/// Build a subscriber writing to `writer` without installing it.
pub fn subscriber<W>(config: &LogConfig, writer: W) -> impl Subscriber + Send + Sync
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(config.with_ansi)
        .with_target(false);
    tracing_subscriber::registry()
        .with(build_env_filter(config))
        .with(layer)
}

fn build_env_filter(config: &LogConfig) -> EnvFilter {
    if let Some(directive) = &config.directive {
        if let Ok(filter) = EnvFilter::try_new(directive) {
            return filter;
        }
    }
    let fallback = || EnvFilter::new(format!("warn,sieveplay={}", config.level.as_str().to_lowercase()));
    if config.honor_env {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback())
    } else {
        fallback()
    }
}

#[derive(Clone)]
pub struct SharedFileWriter {
    file: Arc<Mutex<std::fs::File>>,
}

impl SharedFileWriter {
    pub fn new(file: std::fs::File) -> Self {
        Self {
            file: Arc::new(Mutex::new(file)),
        }
    }
}

pub struct SharedFileGuard {
    file: Arc<Mutex<std::fs::File>>,
}

impl Write for SharedFileGuard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self
            .file
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?;
        guard.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut guard = self
            .file
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?;
        guard.flush()
    }
}

impl<'a> MakeWriter<'a> for SharedFileWriter {
    type Writer = SharedFileGuard;

    fn make_writer(&'a self) -> Self::Writer {
        SharedFileGuard {
            file: Arc::clone(&self.file),
        }
    }
}
