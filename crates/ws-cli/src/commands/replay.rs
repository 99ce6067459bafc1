//! Replay a scripted session.
//!
//! A script is a JSON document with an optional planned duration and a list
//! of steps. Each step names an operation and, optionally, the epoch
//! millisecond it happens at; steps without `at` reuse the previous time.
//!
//! ```json
//! {
//!   "planned_duration_secs": 90,
//!   "steps": [
//!     {"op": "plan"},
//!     {"op": "add", "id": "w", "name": "Write"},
//!     {"op": "begin", "at": 0},
//!     {"op": "start", "id": "w", "at": 0},
//!     {"op": "complete", "id": "w", "at": 60000},
//!     {"op": "finish", "at": 60000}
//!   ]
//! }
//! ```

use std::cell::Cell;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Deserialize;
use ws_core::{
    Activity, ActivityId, ActivityState, ClockReading, EntryColors, EpochMillis, OnDuplicate,
    SessionPhase, SessionSummary, WorkSession, millis_to_secs,
};

use super::render::{SummaryView, format_summary, format_summary_json};
use super::util::{parse_timestamp, read_json};
use crate::Config;

/// A scripted session.
#[derive(Debug, Deserialize)]
pub struct Script {
    /// Planned length in seconds; the configured default when absent.
    #[serde(default)]
    pub planned_duration_secs: Option<i64>,
    pub steps: Vec<Step>,
}

/// One operation and when it happens.
#[derive(Debug, Deserialize)]
pub struct Step {
    #[serde(default)]
    pub at: Option<EpochMillis>,
    #[serde(flatten)]
    pub op: Op,
}

/// Operations a script can perform.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    Plan,
    SetDuration {
        seconds: i64,
    },
    /// Adds time to a running session, one minute unless stated.
    Extend {
        #[serde(default = "one_minute")]
        seconds: i64,
    },
    Add {
        id: ActivityId,
        name: String,
        #[serde(default)]
        colors: Option<EntryColors>,
        /// Skip the activity instead of failing when the id already exists.
        #[serde(default)]
        if_missing: bool,
    },
    Begin,
    Start {
        id: ActivityId,
    },
    Complete {
        id: ActivityId,
    },
    Remove {
        id: ActivityId,
    },
    Restore {
        id: ActivityId,
    },
    Break,
    Resume,
    Finish,
    Reset,
}

const fn one_minute() -> i64 {
    60
}

/// Session state after replaying a script.
#[derive(Debug)]
pub struct Replay {
    pub session: WorkSession,
    /// Time of the last step.
    pub now: EpochMillis,
    timer_started: Option<EpochMillis>,
    timer_stopped: Option<EpochMillis>,
}

impl Replay {
    /// Runs every step in order, stopping at the first failure.
    pub fn run(script: &Script, default_duration: i64) -> Result<Self> {
        let planned = script.planned_duration_secs.unwrap_or(default_duration);
        let session = WorkSession::new(planned).context("invalid planned duration")?;
        let mut replay = Self {
            session,
            now: 0,
            timer_started: None,
            timer_stopped: None,
        };

        for (index, step) in script.steps.iter().enumerate() {
            if let Some(at) = step.at {
                replay.now = at;
            }
            replay
                .apply(&step.op)
                .with_context(|| format!("step {index} ({}) failed", op_name(&step.op)))?;
            tracing::debug!(index, op = op_name(&step.op), now = replay.now, phase = %replay.session.phase(), "applied step");
        }

        Ok(replay)
    }

    fn apply(&mut self, op: &Op) -> Result<()> {
        let now = self.now;
        let session = &mut self.session;
        match op {
            Op::Plan => session.begin_planning()?,
            Op::SetDuration { seconds } => session.set_planned_duration(*seconds)?,
            Op::Extend { seconds } => {
                session.extend_planned_duration(*seconds)?;
            }
            Op::Add {
                id,
                name,
                colors,
                if_missing,
            } => {
                let mut activity = Activity::new(id.clone(), name.clone());
                if let Some(colors) = colors {
                    activity = activity.with_colors(colors.clone());
                }
                let on_duplicate = if *if_missing {
                    OnDuplicate::Ignore
                } else {
                    OnDuplicate::Reject
                };
                if !session.add_activity(activity, on_duplicate)? {
                    tracing::debug!(%id, "activity already present, skipped");
                }
            }
            Op::Begin => {
                let started = Cell::new(None);
                session.begin_activities(|| started.set(Some(now)))?;
                self.timer_started = started.get();
                self.timer_stopped = None;
            }
            Op::Start { id } => session.start_activity(id, now)?,
            Op::Complete { id } => session.complete_activity(id, now)?,
            Op::Remove { id } => session.remove_activity(id, now)?,
            Op::Restore { id } => session.restore_activity(id)?,
            Op::Break => session.start_break(now)?,
            Op::Resume => session.end_break(now)?,
            Op::Finish => {
                session.finish(now)?;
                self.timer_stopped = Some(now);
            }
            Op::Reset => {
                session.reset()?;
                self.timer_started = None;
                self.timer_stopped = None;
            }
        }
        Ok(())
    }

    /// Timer reading at `now`. The timer runs from `begin` until `finish`.
    pub fn clock(&self, now: EpochMillis) -> ClockReading {
        let Some(started) = self.timer_started else {
            return ClockReading::default();
        };
        let end = self.timer_stopped.unwrap_or(now);
        let elapsed_time = millis_to_secs(end.saturating_sub(started)).max(0);
        let running = self.session.phase() == SessionPhase::Activity;
        ClockReading {
            elapsed_time,
            is_time_up: running && elapsed_time >= self.session.planned_duration(),
        }
    }

    pub fn summary(&self, now: EpochMillis) -> SessionSummary {
        self.session.summary(now, self.clock(now))
    }
}

const fn op_name(op: &Op) -> &'static str {
    match op {
        Op::Plan => "plan",
        Op::SetDuration { .. } => "set_duration",
        Op::Extend { .. } => "extend",
        Op::Add { .. } => "add",
        Op::Begin => "begin",
        Op::Start { .. } => "start",
        Op::Complete { .. } => "complete",
        Op::Remove { .. } => "remove",
        Op::Restore { .. } => "restore",
        Op::Break => "break",
        Op::Resume => "resume",
        Op::Finish => "finish",
        Op::Reset => "reset",
    }
}

pub fn run<W: Write>(
    writer: &mut W,
    script_path: &Path,
    now: Option<&str>,
    json: bool,
    config: &Config,
) -> Result<()> {
    let script: Script = read_json(script_path)?;
    let replay = Replay::run(&script, config.planned_duration_secs)
        .with_context(|| format!("failed to replay {}", script_path.display()))?;

    let now = match now {
        Some(raw) => parse_timestamp(raw, Utc::now())?,
        None => replay.now,
    };
    let summary = replay.summary(now);
    let clock = replay.clock(now);

    let view = SummaryView {
        summary: &summary,
        entries: replay.session.timeline().entries(),
        planned: replay.session.planned_duration(),
        elapsed: clock.elapsed_time,
        theme: config.theme,
        skipped: replay
            .session
            .activities()
            .activities_by_state(ActivityState::Removed)
            .collect(),
    };
    if json {
        writeln!(writer, "{}", format_summary_json(&view)?)?;
    } else {
        write!(writer, "{}", format_summary(&view))?;
    }

    Ok(())
}
