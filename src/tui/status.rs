//! Status bar — phase, run counters and the stale-result policy.

use crate::state::{AppState, Phase, RequestId, StalePolicy};

/// What the status bar shows, derived from the current state.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusInfo {
    pub phase: Phase,
    pub in_flight: usize,
    /// Run whose outcome is on display.
    pub shown: Option<RequestId>,
    pub latest: Option<RequestId>,
    pub policy: StalePolicy,
}

impl StatusInfo {
    pub fn from_state(state: &AppState) -> Self {
        Self {
            phase: state.phase,
            in_flight: state.in_flight,
            shown: state.outcome.as_ref().and_then(|o| o.request()),
            latest: (state.phase != Phase::Idle).then_some(state.latest_issued),
            policy: state.policy,
        }
    }

    pub fn phase_display(&self) -> &'static str {
        match self.phase {
            Phase::Idle => " -- ",
            Phase::Compiling => " ... ",
            Phase::Success => " OK ",
            Phase::Failed => " ERR ",
        }
    }

    /// Shown only when the outcome belongs to an older run than the text.
    pub fn lag_display(&self) -> Option<String> {
        match (self.shown, self.latest) {
            (Some(shown), Some(latest)) if shown != latest => {
                Some(format!(" showing {shown} of {latest} "))
            }
            _ => None,
        }
    }

    pub fn policy_display(&self) -> &'static str {
        match self.policy {
            StalePolicy::DiscardStale => "latest-wins",
            StalePolicy::LastResolved => "last-resolved",
        }
    }
}
