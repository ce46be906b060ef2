//! Playground state and the pure reducer that advances it.
//!
//! `AppState` is a value. Every change goes through [`reduce`], which consumes
//! the old state and returns the next one, so the UI thread is the only
//! place it ever changes.

use std::fmt;

use serde::Deserialize;
use tracing::debug;

use crate::pipeline::CompileFault;

/// Monotonic identifier of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RequestId(u64);

impl RequestId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Nothing issued yet.
    #[default]
    Idle,
    Compiling,
    Success,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::Compiling => write!(f, "compiling"),
            Phase::Success => write!(f, "ok"),
            Phase::Failed => write!(f, "failed"),
        }
    }
}

/// What to do with a run that resolves after a newer one was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum StalePolicy {
    /// Only the most recently issued run may change the outcome.
    #[default]
    #[value(name = "discard")]
    #[serde(alias = "discard")]
    DiscardStale,
    /// Whichever run resolves last wins, even if it is older.
    LastResolved,
}

/// Formatted output of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledArtifact {
    pub request: RequestId,
    pub code: String,
}

/// Result of the run currently on display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Artifact(CompiledArtifact),
    Fault(CompileFault),
}

impl RunOutcome {
    fn resolve(request: RequestId, result: Result<String, CompileFault>) -> Self {
        match result {
            Ok(code) => RunOutcome::Artifact(CompiledArtifact { request, code }),
            Err(fault) => RunOutcome::Fault(fault.with_request(request)),
        }
    }

    /// The run this outcome belongs to.
    pub fn request(&self) -> Option<RequestId> {
        match self {
            RunOutcome::Artifact(artifact) => Some(artifact.request),
            RunOutcome::Fault(fault) => fault.request,
        }
    }

    pub fn artifact(&self) -> Option<&CompiledArtifact> {
        match self {
            RunOutcome::Artifact(artifact) => Some(artifact),
            RunOutcome::Fault(_) => None,
        }
    }

    pub fn fault(&self) -> Option<&CompileFault> {
        match self {
            RunOutcome::Fault(fault) => Some(fault),
            RunOutcome::Artifact(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The input text changed; a new run is about to be issued for it.
    Edit { text: String },
    /// A run finished.
    RunResolved {
        request: RequestId,
        result: Result<String, CompileFault>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    pub source_text: String,
    pub outcome: Option<RunOutcome>,
    pub phase: Phase,
    /// Id handed to the most recent `Edit`. Meaningless while `Idle`.
    pub latest_issued: RequestId,
    pub next_request: RequestId,
    pub in_flight: usize,
    pub policy: StalePolicy,
}

impl AppState {
    pub fn new(policy: StalePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn artifact(&self) -> Option<&CompiledArtifact> {
        self.outcome.as_ref().and_then(RunOutcome::artifact)
    }

    pub fn fault(&self) -> Option<&CompileFault> {
        self.outcome.as_ref().and_then(RunOutcome::fault)
    }

    /// Whether the outcome on display was produced from the current text.
    pub fn is_current(&self) -> bool {
        self.outcome
            .as_ref()
            .and_then(RunOutcome::request)
            .is_some_and(|r| r == self.latest_issued)
    }
}

/// Apply one event.
pub fn reduce(state: AppState, event: Event) -> AppState {
    match event {
        Event::Edit { text } => AppState {
            source_text: text,
            latest_issued: state.next_request,
            next_request: state.next_request.next(),
            in_flight: state.in_flight + 1,
            phase: Phase::Compiling,
            ..state
        },
        Event::RunResolved { request, result } => {
            let in_flight = state.in_flight.saturating_sub(1);
            if state.policy == StalePolicy::DiscardStale && request != state.latest_issued {
                debug!(%request, latest = %state.latest_issued, "discarding stale run");
                return AppState { in_flight, ..state };
            }
            let phase = if result.is_ok() {
                Phase::Success
            } else {
                Phase::Failed
            };
            AppState {
                outcome: Some(RunOutcome::resolve(request, result)),
                phase,
                in_flight,
                ..state
            }
        }
    }
}
