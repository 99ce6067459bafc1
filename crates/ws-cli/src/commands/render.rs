//! Human-readable and JSON rendering of session summaries.

use std::fmt::Write;

use anyhow::Result;
use serde::Serialize;
use ws_core::{
    ActivityRecord, ColorSet, SessionSummary, StatusMessage, StatusTone, Theme, TimelineEntry,
};

/// Formats whole seconds as `1h 5m 3s`, `5m 3s` or `3s`.
///
/// Negative values are shown as their magnitude.
pub fn format_duration(seconds: i64) -> String {
    let seconds = seconds.unsigned_abs();
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let remaining = seconds % 60;

    if hours > 0 {
        format!("{hours}h {minutes}m {remaining}s")
    } else if minutes > 0 {
        format!("{minutes}m {remaining}s")
    } else {
        format!("{remaining}s")
    }
}

/// English text for a status message.
pub fn status_text(message: &StatusMessage) -> String {
    match message {
        StatusMessage::TimeUp => "Time's up! Review your completed activities below.".to_string(),
        StatusMessage::OverAllocatedTime { .. } => {
            "You've gone over the allocated time!".to_string()
        }
        StatusMessage::AtAllocatedTime => "Time's up!".to_string(),
        StatusMessage::OnTrack { .. } => "You're doing great, keep going!".to_string(),
        StatusMessage::FinishedEarly { by } => format!(
            "Amazing! You finished {} earlier than planned!",
            format_duration(*by)
        ),
        StatusMessage::TookLonger { by } => {
            format!("You took {} more than planned", format_duration(*by))
        }
    }
}

/// Everything needed to render one summary.
#[derive(Debug)]
pub struct SummaryView<'a> {
    pub summary: &'a SessionSummary,
    pub entries: &'a [TimelineEntry],
    /// Planned session length in seconds.
    pub planned: i64,
    /// Seconds on the session timer.
    pub elapsed: i64,
    pub theme: Theme,
    /// Activities removed without being completed.
    pub skipped: Vec<&'a ActivityRecord>,
}

impl SummaryView<'_> {
    /// Resolved colours for an activity, from its first coloured entry.
    fn colors_for(&self, activity_id: &str) -> Option<ColorSet> {
        self.entries
            .iter()
            .filter(|entry| entry.activity_id.as_ref().is_some_and(|id| id.as_str() == activity_id))
            .find_map(|entry| entry.colors.as_ref())
            .map(|colors| colors.resolve(self.theme).clone())
    }
}

/// Formats a summary for the terminal.
pub fn format_summary(view: &SummaryView<'_>) -> String {
    let summary = view.summary;
    let mut output = String::new();

    if let Some(message) = &summary.status_message {
        let _ = writeln!(output, "{}", status_text(message));
        output.push('\n');
    }

    let rows = [
        ("Planned time", view.planned),
        ("Spent time", view.elapsed),
        ("Active time", summary.active_time),
        ("Idle time", summary.idle_time),
        ("Overtime", summary.overtime),
    ];
    for (label, seconds) in rows {
        let _ = writeln!(output, "{label:<14}{}", format_duration(seconds));
    }

    if !summary.per_activity_time.is_empty() {
        output.push('\n');
        output.push_str("Time spent per activity:\n");
        let width = summary
            .per_activity_time
            .iter()
            .map(|time| display_name(time.name.as_deref(), time.id.as_str()).len())
            .max()
            .unwrap_or(0);
        for time in &summary.per_activity_time {
            let name = display_name(time.name.as_deref(), time.id.as_str());
            let _ = writeln!(
                output,
                "  {name:<width$}  {}",
                format_duration(time.duration)
            );
        }
    }

    if !view.skipped.is_empty() {
        output.push('\n');
        output.push_str("Skipped activities:\n");
        for record in &view.skipped {
            let _ = writeln!(output, "  {}", record.name);
        }
    }

    output
}

fn display_name<'a>(name: Option<&'a str>, id: &'a str) -> &'a str {
    name.unwrap_or(id)
}

#[derive(Serialize)]
struct JsonSkipped {
    id: String,
    name: String,
}

#[derive(Serialize)]
struct JsonStatus {
    #[serde(flatten)]
    message: StatusMessage,
    tone: StatusTone,
    text: String,
}

#[derive(Serialize)]
struct JsonActivity {
    id: String,
    name: Option<String>,
    duration: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    colors: Option<ColorSet>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonSummary {
    planned_time: i64,
    spent_time: i64,
    active_time: i64,
    idle_time: i64,
    overtime: i64,
    status: Option<JsonStatus>,
    activities: Vec<JsonActivity>,
    skipped: Vec<JsonSkipped>,
}

/// Formats a summary as JSON. All durations are whole seconds and keys are
/// camelCase, as in recorded timeline entries.
pub fn format_summary_json(view: &SummaryView<'_>) -> Result<String> {
    let summary = view.summary;
    let report = JsonSummary {
        planned_time: view.planned,
        spent_time: view.elapsed,
        active_time: summary.active_time,
        idle_time: summary.idle_time,
        overtime: summary.overtime,
        status: summary.status_message.map(|message| JsonStatus {
            message,
            tone: message.tone(),
            text: status_text(&message),
        }),
        activities: summary
            .per_activity_time
            .iter()
            .map(|time| JsonActivity {
                id: time.id.to_string(),
                name: time.name.clone(),
                duration: time.duration,
                colors: view.colors_for(time.id.as_str()),
            })
            .collect(),
        skipped: view
            .skipped
            .iter()
            .map(|record| JsonSkipped {
                id: record.id.to_string(),
                name: record.name.clone(),
            })
            .collect(),
    };

    Ok(serde_json::to_string_pretty(&report)?)
}
