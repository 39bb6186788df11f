//! Process lifecycle state machine.
//!
//! ```text
//! INIT -> CONNECTING -> READY -> DRAINING -> STOPPED
//!            |            |
//!            +-> FAILED   +-> (shutdown before READY drains too)
//! ```

use std::fmt;

use parking_lot::RwLock;
use sigrelay_telemetry::Metrics;
use tracing::info;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Init,
    Connecting,
    Ready,
    Draining,
    Stopped,
    Failed,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Connecting => "connecting",
            Self::Ready => "ready",
            Self::Draining => "draining",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped | Self::Failed)
    }

    pub fn can_transition_to(&self, next: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self, next),
            (Init, Connecting)
                | (Connecting, Ready)
                | (Connecting, Draining)
                | (Ready, Draining)
                | (Draining, Stopped)
                | (Init | Connecting | Ready | Draining, Failed)
        )
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current state plus the bound HTTP port.
#[derive(Debug)]
pub struct Lifecycle {
    state: RwLock<LifecycleState>,
    bound_port: RwLock<Option<u16>>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Metrics::lifecycle_state_set(LifecycleState::Init.as_str());
        Self {
            state: RwLock::new(LifecycleState::Init),
            bound_port: RwLock::new(None),
        }
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.read()
    }

    pub fn bound_port(&self) -> Option<u16> {
        *self.bound_port.read()
    }

    pub(crate) fn set_bound_port(&self, port: u16) {
        *self.bound_port.write() = Some(port);
    }

    /// Move to `next`, rejecting transitions the state machine does not allow.
    pub fn transition(&self, next: LifecycleState) -> AppResult<()> {
        let mut state = self.state.write();
        let from = *state;
        if !from.can_transition_to(next) {
            return Err(AppError::InvalidTransition { from, to: next });
        }
        *state = next;
        drop(state);

        info!(from = %from, to = %next, "Lifecycle transition");
        Metrics::lifecycle_state_set(next.as_str());
        Ok(())
    }

    /// Move to FAILED from any non-terminal state.
    pub fn fail(&self) {
        let _ = self.transition(LifecycleState::Failed);
    }
}
