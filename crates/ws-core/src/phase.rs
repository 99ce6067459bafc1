//! Session phase gate.
//!
//! A session moves strictly forward through
//! `Setup -> Planning -> Activity -> Completed` and only returns to `Setup`
//! through an explicit reset from `Completed`.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The phase a work session is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionPhase {
    /// Choosing the planned duration.
    #[default]
    Setup,
    /// Defining the activities for the session.
    Planning,
    /// Working through activities; the external timer is running.
    Activity,
    /// Session over; summary available.
    Completed,
}

impl SessionPhase {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Setup => "SETUP",
            Self::Planning => "PLANNING",
            Self::Activity => "ACTIVITY",
            Self::Completed => "COMPLETED",
        }
    }

    /// The single phase reachable from this one.
    const fn successor(self) -> Self {
        match self {
            Self::Setup => Self::Planning,
            Self::Planning => Self::Activity,
            Self::Activity => Self::Completed,
            Self::Completed => Self::Setup,
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by the phase gate.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    /// There is no edge from `from` to `to`.
    #[error("invalid session transition from {from} to {to}")]
    InvalidTransition { from: SessionPhase, to: SessionPhase },
}

/// Linear state machine over [`SessionPhase`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStateMachine {
    phase: SessionPhase,
}

impl SessionStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Whether `target` is reachable from the current phase in one step.
    pub fn can_transition_to(&self, target: SessionPhase) -> bool {
        self.phase.successor() == target
    }

    pub fn move_to_planning(&mut self) -> Result<(), TransitionError> {
        self.transition(SessionPhase::Planning)
    }

    /// Enters the activity phase, then invokes `on_enter` exactly once.
    ///
    /// The phase is committed before `on_enter` runs. On error the callback
    /// is never invoked.
    pub fn move_to_activity<F>(&mut self, on_enter: F) -> Result<(), TransitionError>
    where
        F: FnOnce(),
    {
        self.transition(SessionPhase::Activity)?;
        on_enter();
        Ok(())
    }

    pub fn move_to_completed(&mut self) -> Result<(), TransitionError> {
        self.transition(SessionPhase::Completed)
    }

    pub fn reset(&mut self) -> Result<(), TransitionError> {
        self.transition(SessionPhase::Setup)
    }

    fn transition(&mut self, to: SessionPhase) -> Result<(), TransitionError> {
        if !self.can_transition_to(to) {
            return Err(TransitionError::InvalidTransition {
                from: self.phase,
                to,
            });
        }
        tracing::debug!(from = %self.phase, to = %to, "session phase changed");
        self.phase = to;
        Ok(())
    }
}
