//! Core domain logic for work session tracking.
//!
//! This crate contains the fundamental types and logic for:
//! - Phases: the linear setup/planning/activity/completed gate
//! - Activities: per-activity lifecycle with a single running activity
//! - Timeline: the append-only interval log
//! - Accounting: idle/active/overtime summaries computed from the timeline
//!
//! Nothing here reads a clock, touches storage or formats text for display.

pub mod accounting;
pub mod activity;
pub mod colors;
pub mod phase;
pub mod session;
pub mod timeline;
pub mod types;

pub use accounting::{
    ActivityStats, ActivityTime, SessionSummary, StatusInput, StatusMessage, StatusTone,
    calculate_activity_stats, calculate_activity_times, calculate_overtime, get_status_message,
    summarize,
};
pub use activity::{
    Activity, ActivityError, ActivityLifecycle, ActivityOperation, ActivityRecord, ActivityState,
    LifecycleEvent, OnDuplicate,
};
pub use colors::{ColorSet, EntryColors, Theme};
pub use phase::{SessionPhase, SessionStateMachine, TransitionError};
pub use session::{ClockReading, SessionError, SessionOperation, WorkSession};
pub use timeline::{IntervalLabel, IntervalProblem, TimelineEntry, TimelineError, TimelineRecorder};
pub use types::{ActivityId, EntryId, EpochMillis, ValidationError, millis_to_secs};
