//! The work session aggregate.
//!
//! [`WorkSession`] owns the phase gate, the activity collection and the
//! timeline, and is the only place the three are mutated together. Every
//! operation checks the phase, the activity transition and the timeline
//! change it implies before committing any of them.
//!
//! # Thread Safety
//!
//! `WorkSession` does no locking. Callers sharing one across threads must
//! serialize access themselves, e.g. with a `Mutex<WorkSession>`.

use std::fmt;

use thiserror::Error;

use crate::accounting::{SessionSummary, StatusInput, summarize};
use crate::activity::{Activity, ActivityError, ActivityLifecycle, LifecycleEvent, OnDuplicate};
use crate::phase::{SessionPhase, SessionStateMachine, TransitionError};
use crate::timeline::{IntervalLabel, TimelineError, TimelineRecorder};
use crate::types::{ActivityId, EpochMillis, ValidationError};

/// Session-level operations, used in error reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOperation {
    SetPlannedDuration,
    ExtendPlannedDuration,
    AddActivity,
    StartActivity,
    CompleteActivity,
    RemoveActivity,
    RestoreActivity,
    StartBreak,
    EndBreak,
}

impl fmt::Display for SessionOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::SetPlannedDuration => "set the planned duration",
            Self::ExtendPlannedDuration => "extend the planned duration",
            Self::AddActivity => "add an activity",
            Self::StartActivity => "start an activity",
            Self::CompleteActivity => "complete an activity",
            Self::RemoveActivity => "remove an activity",
            Self::RestoreActivity => "restore an activity",
            Self::StartBreak => "start a break",
            Self::EndBreak => "end a break",
        };
        f.write_str(s)
    }
}

/// Errors from [`WorkSession`] operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Activity(#[from] ActivityError),

    #[error(transparent)]
    Timeline(#[from] TimelineError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The operation is not available in the current phase.
    #[error("cannot {operation} during {phase}")]
    PhaseNotAllowed {
        phase: SessionPhase,
        operation: SessionOperation,
    },

    /// The session cannot finish while activities remain or none completed.
    #[error("session cannot finish: no activity completed or some are still outstanding")]
    ActivitiesOutstanding,

    #[error("no break in progress")]
    NoBreakInProgress,
}

/// Readings from the external session timer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClockReading {
    /// Seconds since the timer started.
    pub elapsed_time: i64,
    pub is_time_up: bool,
}

/// One work session from setup through completion.
#[derive(Debug, Clone)]
pub struct WorkSession {
    phase: SessionStateMachine,
    activities: ActivityLifecycle,
    timeline: TimelineRecorder,
    planned_duration: i64,
}

impl WorkSession {
    /// Creates a session in `SETUP` with a planned length in seconds.
    pub fn new(planned_duration: i64) -> Result<Self, ValidationError> {
        validate_duration(planned_duration)?;
        Ok(Self {
            phase: SessionStateMachine::new(),
            activities: ActivityLifecycle::new(),
            timeline: TimelineRecorder::new(),
            planned_duration,
        })
    }

    pub const fn phase(&self) -> SessionPhase {
        self.phase.phase()
    }

    pub const fn activities(&self) -> &ActivityLifecycle {
        &self.activities
    }

    pub const fn timeline(&self) -> &TimelineRecorder {
        &self.timeline
    }

    /// Planned session length in seconds.
    pub const fn planned_duration(&self) -> i64 {
        self.planned_duration
    }

    pub fn set_planned_duration(&mut self, seconds: i64) -> Result<(), SessionError> {
        self.require_phase(
            &[SessionPhase::Setup, SessionPhase::Planning],
            SessionOperation::SetPlannedDuration,
        )?;
        validate_duration(seconds)?;
        self.planned_duration = seconds;
        Ok(())
    }

    /// Adds `seconds` to the plan of a session that is under way.
    ///
    /// Returns the new planned duration.
    pub fn extend_planned_duration(&mut self, seconds: i64) -> Result<i64, SessionError> {
        self.require_phase(&[SessionPhase::Activity], SessionOperation::ExtendPlannedDuration)?;
        validate_duration(seconds)?;
        let extended = self
            .planned_duration
            .checked_add(seconds)
            .ok_or(ValidationError::InvalidPlannedDuration { seconds })?;

        tracing::debug!(from = self.planned_duration, to = extended, "extended planned duration");
        self.planned_duration = extended;
        Ok(extended)
    }

    // ========== Phase changes ==========

    pub fn begin_planning(&mut self) -> Result<(), SessionError> {
        Ok(self.phase.move_to_planning()?)
    }

    /// Enters the activity phase and runs `on_enter` once, typically to start
    /// the external timer.
    pub fn begin_activities<F>(&mut self, on_enter: F) -> Result<(), SessionError>
    where
        F: FnOnce(),
    {
        Ok(self.phase.move_to_activity(on_enter)?)
    }

    /// Ends the session once every activity is completed or removed.
    ///
    /// A break still open at `now` is closed.
    pub fn finish(&mut self, now: EpochMillis) -> Result<(), SessionError> {
        if !self.phase.can_transition_to(SessionPhase::Completed) {
            return Err(TransitionError::InvalidTransition {
                from: self.phase(),
                to: SessionPhase::Completed,
            }
            .into());
        }
        if !self.activities.is_completed() {
            return Err(SessionError::ActivitiesOutstanding);
        }
        self.timeline.check_can_close_open(now)?;

        self.timeline.close_open(now)?;
        self.phase.move_to_completed()?;
        Ok(())
    }

    /// Returns to `SETUP`, discarding activities and the timeline.
    ///
    /// The planned duration is kept.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        self.phase.reset()?;
        self.activities.reset();
        self.timeline.clear();
        Ok(())
    }

    // ========== Activities ==========

    pub fn add_activity(
        &mut self,
        activity: Activity,
        on_duplicate: OnDuplicate,
    ) -> Result<bool, SessionError> {
        self.require_phase(&[SessionPhase::Planning], SessionOperation::AddActivity)?;
        Ok(self.activities.add_activity(activity, on_duplicate)?)
    }

    /// Starts an activity, completing whichever one is running and ending
    /// any break at the same instant.
    pub fn start_activity(&mut self, id: &ActivityId, now: EpochMillis) -> Result<(), SessionError> {
        self.require_phase(&[SessionPhase::Activity], SessionOperation::StartActivity)?;
        self.activities.check_start(id)?;
        self.timeline.check_can_close_open(now)?;

        let events = self.activities.start_activity(id, now)?;
        self.record(&events, now)
    }

    pub fn complete_activity(&mut self, id: &ActivityId, now: EpochMillis) -> Result<(), SessionError> {
        self.require_phase(&[SessionPhase::Activity], SessionOperation::CompleteActivity)?;
        self.activities.check_complete(id)?;
        self.timeline.check_can_close_open(now)?;

        let event = self.activities.complete_activity(id, now)?;
        self.record(&[event], now)
    }

    pub fn remove_activity(&mut self, id: &ActivityId, now: EpochMillis) -> Result<(), SessionError> {
        self.require_phase(
            &[SessionPhase::Planning, SessionPhase::Activity],
            SessionOperation::RemoveActivity,
        )?;
        if self.activities.check_remove(id)? {
            self.timeline.check_can_close_open(now)?;
        }

        let event = self.activities.remove_activity(id, now)?;
        self.record(&[event], now)
    }

    pub fn restore_activity(&mut self, id: &ActivityId) -> Result<(), SessionError> {
        self.require_phase(
            &[SessionPhase::Planning, SessionPhase::Activity],
            SessionOperation::RestoreActivity,
        )?;
        self.activities.restore_activity(id)?;
        Ok(())
    }

    // ========== Breaks ==========

    /// Opens an explicit break.
    ///
    /// A running activity is completed at `now` first, so its interval ends
    /// where the break begins. Fails if a break is already open.
    pub fn start_break(&mut self, now: EpochMillis) -> Result<(), SessionError> {
        self.require_phase(&[SessionPhase::Activity], SessionOperation::StartBreak)?;
        if let Some(open) = self.timeline.open_entry().filter(|entry| entry.is_idle()) {
            return Err(TimelineError::IntervalAlreadyOpen {
                open_entry_id: open.id.clone(),
            }
            .into());
        }
        self.timeline.check_can_close_open(now)?;

        if let Some(running) = self.activities.current_activity().map(|r| r.id.clone()) {
            let event = self.activities.complete_activity(&running, now)?;
            self.record(&[event], now)?;
        }
        self.timeline.start_interval(IntervalLabel::idle(), now)?;
        Ok(())
    }

    pub fn end_break(&mut self, now: EpochMillis) -> Result<(), SessionError> {
        self.require_phase(&[SessionPhase::Activity], SessionOperation::EndBreak)?;
        let Some(open) = self.timeline.open_entry().filter(|entry| entry.is_idle()) else {
            return Err(SessionError::NoBreakInProgress);
        };
        let id = open.id.clone();
        self.timeline.close_interval(&id, now)?;
        Ok(())
    }

    // ========== Summary ==========

    /// Summary of the session as of `now`.
    pub fn summary(&self, now: EpochMillis, clock: ClockReading) -> SessionSummary {
        let status = StatusInput {
            is_time_up: clock.is_time_up,
            timer_active: self.phase() == SessionPhase::Activity,
            all_activities_completed: self.activities.is_completed(),
            elapsed_time: clock.elapsed_time,
            total_duration: self.planned_duration,
        };
        summarize(self.timeline.entries(), now, &status)
    }

    /// Mirrors lifecycle events onto the timeline. Callers have already
    /// checked that the open interval can be closed at `now`.
    fn record(&mut self, events: &[LifecycleEvent], now: EpochMillis) -> Result<(), SessionError> {
        for event in events {
            match event {
                LifecycleEvent::Started { id } => {
                    self.timeline.close_open(now)?;
                    let label = self
                        .activities
                        .get(id)
                        .map(|record| {
                            IntervalLabel::activity(
                                record.id.clone(),
                                record.name.clone(),
                                record.colors.clone(),
                            )
                        })
                        .ok_or_else(|| ActivityError::NotFound { id: id.clone() })?;
                    self.timeline.start_interval(label, now)?;
                }
                LifecycleEvent::Completed { .. }
                | LifecycleEvent::Removed {
                    was_running: true, ..
                } => {
                    self.timeline.close_open(now)?;
                }
                LifecycleEvent::Removed { .. } | LifecycleEvent::Restored { .. } => {}
            }
        }
        Ok(())
    }

    fn require_phase(
        &self,
        allowed: &[SessionPhase],
        operation: SessionOperation,
    ) -> Result<(), SessionError> {
        let phase = self.phase();
        if allowed.contains(&phase) {
            Ok(())
        } else {
            Err(SessionError::PhaseNotAllowed { phase, operation })
        }
    }
}

fn validate_duration(seconds: i64) -> Result<(), ValidationError> {
    if seconds > 0 {
        Ok(())
    } else {
        Err(ValidationError::InvalidPlannedDuration { seconds })
    }
}
