//! Append-only log of start/end intervals.
//!
//! Each entry is either tied to an activity or, when `activity_id` is `None`,
//! marks an explicit break. At most one entry is open (`end_time == None`)
//! at any time, and a closed entry never ends before it starts. Gaps between
//! entries are not recorded; accounting derives them.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::colors::EntryColors;
use crate::types::{ActivityId, EntryId, EpochMillis};

/// One recorded interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub id: EntryId,
    /// `None` for a break.
    pub activity_id: Option<ActivityId>,
    pub activity_name: Option<String>,
    pub start_time: EpochMillis,
    /// `None` while the interval is still running.
    pub end_time: Option<EpochMillis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<EntryColors>,
}

impl TimelineEntry {
    pub const fn is_open(&self) -> bool {
        self.end_time.is_none()
    }

    pub const fn is_idle(&self) -> bool {
        self.activity_id.is_none()
    }

    /// End of the interval, treating an open interval as ending at `now`.
    pub fn effective_end(&self, now: EpochMillis) -> EpochMillis {
        self.end_time.unwrap_or(now)
    }

    /// Saturates instead of overflowing on extreme timestamps.
    pub fn duration_ms(&self, now: EpochMillis) -> i64 {
        self.effective_end(now).saturating_sub(self.start_time)
    }
}

/// What a new interval is attributed to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntervalLabel {
    pub activity_id: Option<ActivityId>,
    pub activity_name: Option<String>,
    pub colors: Option<EntryColors>,
}

impl IntervalLabel {
    /// Label for a break interval.
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn activity(
        id: ActivityId,
        name: impl Into<String>,
        colors: Option<EntryColors>,
    ) -> Self {
        Self {
            activity_id: Some(id),
            activity_name: Some(name.into()),
            colors,
        }
    }
}

/// Why an interval cannot be closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalProblem {
    AlreadyClosed,
    EndsBeforeStart,
}

impl fmt::Display for IntervalProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyClosed => f.write_str("already closed"),
            Self::EndsBeforeStart => f.write_str("would end before it started"),
        }
    }
}

/// Timeline errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimelineError {
    /// The interval is in the wrong state for the requested change.
    #[error("interval {entry_id} {reason}")]
    IntervalState {
        entry_id: EntryId,
        reason: IntervalProblem,
    },

    /// Another interval must be closed first.
    #[error("interval {open_entry_id} is still open")]
    IntervalAlreadyOpen { open_entry_id: EntryId },

    #[error("no timeline entry with id {entry_id}")]
    UnknownEntry { entry_id: EntryId },
}

/// Owner of the timeline and of the single open-interval pointer.
#[derive(Debug, Clone, Default)]
pub struct TimelineRecorder {
    entries: Vec<TimelineEntry>,
    open: Option<usize>,
}

impl TimelineRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a recorder from previously recorded entries.
    ///
    /// Fails if more than one entry is open or a closed entry ends before it
    /// starts.
    pub fn from_entries(entries: Vec<TimelineEntry>) -> Result<Self, TimelineError> {
        let mut open = None;
        for (index, entry) in entries.iter().enumerate() {
            match entry.end_time {
                None => {
                    if let Some(previous) = open {
                        let previous: &TimelineEntry = &entries[previous];
                        return Err(TimelineError::IntervalAlreadyOpen {
                            open_entry_id: previous.id.clone(),
                        });
                    }
                    open = Some(index);
                }
                Some(end) if end < entry.start_time => {
                    return Err(TimelineError::IntervalState {
                        entry_id: entry.id.clone(),
                        reason: IntervalProblem::EndsBeforeStart,
                    });
                }
                Some(_) => {}
            }
        }
        Ok(Self { entries, open })
    }

    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<TimelineEntry> {
        self.entries
    }

    pub fn open_entry(&self) -> Option<&TimelineEntry> {
        self.open.map(|index| &self.entries[index])
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Checks that a new interval could be opened right now.
    pub fn check_can_start(&self) -> Result<(), TimelineError> {
        match self.open_entry() {
            Some(open) => Err(TimelineError::IntervalAlreadyOpen {
                open_entry_id: open.id.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Opens a new interval at `at` and returns its id.
    pub fn start_interval(
        &mut self,
        label: IntervalLabel,
        at: EpochMillis,
    ) -> Result<EntryId, TimelineError> {
        self.check_can_start()?;

        let id = EntryId::generate();
        tracing::debug!(
            entry_id = %id,
            activity_id = ?label.activity_id,
            at,
            "interval opened"
        );
        self.entries.push(TimelineEntry {
            id: id.clone(),
            activity_id: label.activity_id,
            activity_name: label.activity_name,
            start_time: at,
            end_time: None,
            colors: label.colors,
        });
        self.open = Some(self.entries.len() - 1);
        Ok(id)
    }

    /// Checks that `entry_id` could be closed at `at`.
    pub fn check_can_close(&self, entry_id: &EntryId, at: EpochMillis) -> Result<(), TimelineError> {
        let index = self.position(entry_id)?;
        Self::check_closable(&self.entries[index], at)
    }

    /// Sets the end time of an open interval.
    pub fn close_interval(&mut self, entry_id: &EntryId, at: EpochMillis) -> Result<(), TimelineError> {
        let index = self.position(entry_id)?;
        Self::check_closable(&self.entries[index], at)?;

        self.entries[index].end_time = Some(at);
        if self.open == Some(index) {
            self.open = None;
        }
        tracing::debug!(entry_id = %entry_id, at, "interval closed");
        Ok(())
    }

    /// Checks that whichever interval is open (if any) could be closed at `at`.
    pub fn check_can_close_open(&self, at: EpochMillis) -> Result<(), TimelineError> {
        self.open_entry()
            .map_or(Ok(()), |open| Self::check_closable(open, at))
    }

    /// Closes the open interval, if there is one, returning its id.
    pub fn close_open(&mut self, at: EpochMillis) -> Result<Option<EntryId>, TimelineError> {
        let Some(open) = self.open_entry() else {
            return Ok(None);
        };
        let id = open.id.clone();
        self.close_interval(&id, at)?;
        Ok(Some(id))
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.open = None;
    }

    fn position(&self, entry_id: &EntryId) -> Result<usize, TimelineError> {
        self.entries
            .iter()
            .position(|entry| &entry.id == entry_id)
            .ok_or_else(|| TimelineError::UnknownEntry {
                entry_id: entry_id.clone(),
            })
    }

    fn check_closable(entry: &TimelineEntry, at: EpochMillis) -> Result<(), TimelineError> {
        let reason = if !entry.is_open() {
            IntervalProblem::AlreadyClosed
        } else if at < entry.start_time {
            IntervalProblem::EndsBeforeStart
        } else {
            return Ok(());
        };
        Err(TimelineError::IntervalState {
            entry_id: entry.id.clone(),
            reason,
        })
    }
}
