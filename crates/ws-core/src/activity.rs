//! Per-activity lifecycle and the collection-wide running invariant.
//!
//! ```text
//! PENDING --start--> RUNNING --complete--> COMPLETED
//!    |                  |
//!    +-----remove-------+--> REMOVED --restore--> PENDING
//! ```
//!
//! At most one record is `Running`; [`ActivityLifecycle`] owns the pointer to
//! it. Starting an activity while another is running completes the running
//! one first, at the same instant. Records are never deleted, so terminal
//! states remain visible for history.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::colors::EntryColors;
use crate::types::{ActivityId, EpochMillis};

/// Lifecycle state of a single activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityState {
    Pending,
    Running,
    Completed,
    Removed,
}

impl ActivityState {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Completed => "COMPLETED",
            Self::Removed => "REMOVED",
        }
    }
}

impl fmt::Display for ActivityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lifecycle operation, used in error reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityOperation {
    Start,
    Complete,
    Remove,
    Restore,
}

impl fmt::Display for ActivityOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Start => "start",
            Self::Complete => "complete",
            Self::Remove => "remove",
            Self::Restore => "restore",
        };
        f.write_str(s)
    }
}

/// Activity lifecycle errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActivityError {
    #[error("activity {id} not found")]
    NotFound { id: ActivityId },

    #[error("cannot {attempted} activity {id} from {from} state")]
    InvalidState {
        id: ActivityId,
        from: ActivityState,
        attempted: ActivityOperation,
    },

    #[error("activity with id {id} already exists")]
    DuplicateId { id: ActivityId },
}

/// What to do when adding an id that already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnDuplicate {
    #[default]
    Reject,
    /// Leave the existing record untouched and succeed.
    Ignore,
}

/// A user-defined activity as entered during planning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<EntryColors>,
}

impl Activity {
    pub fn new(id: ActivityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            colors: None,
        }
    }

    #[must_use]
    pub fn with_colors(mut self, colors: impl Into<EntryColors>) -> Self {
        self.colors = Some(colors.into());
        self
    }
}

/// An activity plus its lifecycle state and transition timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    pub id: ActivityId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<EntryColors>,
    pub state: ActivityState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<EpochMillis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<EpochMillis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removed_at: Option<EpochMillis>,
}

impl ActivityRecord {
    fn pending(activity: Activity) -> Self {
        Self {
            id: activity.id,
            name: activity.name,
            colors: activity.colors,
            state: ActivityState::Pending,
            started_at: None,
            completed_at: None,
            removed_at: None,
        }
    }
}

/// A state change the timeline has to mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    Started { id: ActivityId },
    Completed { id: ActivityId },
    Removed { id: ActivityId, was_running: bool },
    Restored { id: ActivityId },
}

/// The activity collection for one session.
///
/// Records keep insertion order; lookups go through an id index.
#[derive(Debug, Clone, Default)]
pub struct ActivityLifecycle {
    records: Vec<ActivityRecord>,
    index: HashMap<ActivityId, usize>,
    current: Option<usize>,
}

impl ActivityLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records in the order they were added.
    pub fn records(&self) -> &[ActivityRecord] {
        &self.records
    }

    pub fn get(&self, id: &ActivityId) -> Option<&ActivityRecord> {
        self.index.get(id).map(|&i| &self.records[i])
    }

    /// The running activity, if any.
    pub fn current_activity(&self) -> Option<&ActivityRecord> {
        self.current.map(|i| &self.records[i])
    }

    pub fn activities_by_state(&self, state: ActivityState) -> impl Iterator<Item = &ActivityRecord> {
        self.records.iter().filter(move |r| r.state == state)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether any activity was ever started.
    pub fn has_started_any(&self) -> bool {
        self.records.iter().any(|r| r.started_at.is_some())
    }

    // ========== Completion ==========

    pub fn has_activities(&self) -> bool {
        !self.records.is_empty()
    }

    pub fn none_pending_or_running(&self) -> bool {
        !self
            .records
            .iter()
            .any(|r| matches!(r.state, ActivityState::Pending | ActivityState::Running))
    }

    pub fn any_completed(&self) -> bool {
        self.activities_by_state(ActivityState::Completed).next().is_some()
    }

    /// True once every activity was either completed or removed and at least
    /// one of them was completed.
    pub fn is_completed(&self) -> bool {
        self.has_activities() && self.none_pending_or_running() && self.any_completed()
    }

    // ========== Transitions ==========

    /// Adds a pending activity. Returns `false` if an existing record was
    /// kept under [`OnDuplicate::Ignore`].
    pub fn add_activity(
        &mut self,
        activity: Activity,
        on_duplicate: OnDuplicate,
    ) -> Result<bool, ActivityError> {
        if self.check_add(&activity.id, on_duplicate)? {
            return Ok(false);
        }
        tracing::debug!(activity_id = %activity.id, "activity added");
        self.index.insert(activity.id.clone(), self.records.len());
        self.records.push(ActivityRecord::pending(activity));
        Ok(true)
    }

    /// Validates an add; `Ok(true)` means the id exists and should be skipped.
    pub fn check_add(&self, id: &ActivityId, on_duplicate: OnDuplicate) -> Result<bool, ActivityError> {
        match (self.index.contains_key(id), on_duplicate) {
            (false, _) => Ok(false),
            (true, OnDuplicate::Ignore) => Ok(true),
            (true, OnDuplicate::Reject) => Err(ActivityError::DuplicateId { id: id.clone() }),
        }
    }

    /// Validates a start; returns the id of the activity that would be
    /// auto-completed, if one is running.
    pub fn check_start(&self, id: &ActivityId) -> Result<Option<ActivityId>, ActivityError> {
        self.expect_state(id, &[ActivityState::Pending], ActivityOperation::Start)?;
        Ok(self.current_activity().map(|r| r.id.clone()))
    }

    /// Starts a pending activity, completing the running one first.
    pub fn start_activity(
        &mut self,
        id: &ActivityId,
        now: EpochMillis,
    ) -> Result<Vec<LifecycleEvent>, ActivityError> {
        let previous = self.check_start(id)?;
        let mut events = Vec::with_capacity(2);

        if let Some(previous) = previous {
            events.push(self.complete_activity(&previous, now)?);
        }

        let index = self.index[id];
        let record = &mut self.records[index];
        record.state = ActivityState::Running;
        record.started_at = Some(now);
        self.current = Some(index);

        tracing::debug!(activity_id = %id, at = now, "activity started");
        events.push(LifecycleEvent::Started { id: id.clone() });
        Ok(events)
    }

    pub fn check_complete(&self, id: &ActivityId) -> Result<(), ActivityError> {
        let index = self.expect_state(id, &[ActivityState::Running], ActivityOperation::Complete)?;
        if self.current != Some(index) {
            return Err(ActivityError::InvalidState {
                id: id.clone(),
                from: self.records[index].state,
                attempted: ActivityOperation::Complete,
            });
        }
        Ok(())
    }

    pub fn complete_activity(
        &mut self,
        id: &ActivityId,
        now: EpochMillis,
    ) -> Result<LifecycleEvent, ActivityError> {
        self.check_complete(id)?;
        let index = self.index[id];
        let record = &mut self.records[index];
        record.state = ActivityState::Completed;
        record.completed_at = Some(now);
        self.current = None;

        tracing::debug!(activity_id = %id, at = now, "activity completed");
        Ok(LifecycleEvent::Completed { id: id.clone() })
    }

    /// Validates a removal; returns whether the activity is the running one.
    pub fn check_remove(&self, id: &ActivityId) -> Result<bool, ActivityError> {
        let index = self.expect_state(
            id,
            &[ActivityState::Pending, ActivityState::Running],
            ActivityOperation::Remove,
        )?;
        Ok(self.current == Some(index))
    }

    pub fn remove_activity(
        &mut self,
        id: &ActivityId,
        now: EpochMillis,
    ) -> Result<LifecycleEvent, ActivityError> {
        let was_running = self.check_remove(id)?;
        let index = self.index[id];
        if was_running {
            self.current = None;
        }
        let record = &mut self.records[index];
        record.state = ActivityState::Removed;
        record.removed_at = Some(now);

        tracing::debug!(activity_id = %id, at = now, was_running, "activity removed");
        Ok(LifecycleEvent::Removed {
            id: id.clone(),
            was_running,
        })
    }

    pub fn check_restore(&self, id: &ActivityId) -> Result<(), ActivityError> {
        self.expect_state(id, &[ActivityState::Removed], ActivityOperation::Restore)
            .map(|_| ())
    }

    /// Returns a removed activity to pending.
    pub fn restore_activity(&mut self, id: &ActivityId) -> Result<LifecycleEvent, ActivityError> {
        self.check_restore(id)?;
        let index = self.index[id];
        let record = &mut self.records[index];
        record.state = ActivityState::Pending;
        record.removed_at = None;

        tracing::debug!(activity_id = %id, "activity restored");
        Ok(LifecycleEvent::Restored { id: id.clone() })
    }

    /// Drops every record.
    pub fn reset(&mut self) {
        self.records.clear();
        self.index.clear();
        self.current = None;
    }

    fn expect_state(
        &self,
        id: &ActivityId,
        allowed: &[ActivityState],
        attempted: ActivityOperation,
    ) -> Result<usize, ActivityError> {
        let &index = self
            .index
            .get(id)
            .ok_or_else(|| ActivityError::NotFound { id: id.clone() })?;
        let from = self.records[index].state;
        if allowed.contains(&from) {
            Ok(index)
        } else {
            Err(ActivityError::InvalidState {
                id: id.clone(),
                from,
                attempted,
            })
        }
    }
}
