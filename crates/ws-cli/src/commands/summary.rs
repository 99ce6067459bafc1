//! Summary command for a recorded timeline.
//!
//! Reads a JSON array of timeline entries and prints idle, active and
//! overtime figures. Timer readings that would normally come from the live
//! session clock are taken from flags.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::Utc;
use ws_core::{EpochMillis, StatusInput, TimelineEntry, TimelineRecorder, millis_to_secs, summarize};

use super::render::{SummaryView, format_summary, format_summary_json};
use super::util::{parse_timestamp, read_json};
use crate::{Config, SummaryArgs};

/// Seconds from the earliest entry start to `now`, or zero without entries.
fn elapsed_since_first_entry(entries: &[TimelineEntry], now: EpochMillis) -> i64 {
    entries
        .iter()
        .map(|entry| entry.start_time)
        .min()
        .map_or(0, |first| millis_to_secs(now.saturating_sub(first)).max(0))
}

pub fn run<W: Write>(writer: &mut W, args: &SummaryArgs, config: &Config) -> Result<()> {
    let entries: Vec<TimelineEntry> = read_json(&args.entries)?;
    let timeline = TimelineRecorder::from_entries(entries)
        .with_context(|| format!("invalid timeline in {}", args.entries.display()))?;

    let now = match &args.now {
        Some(raw) => parse_timestamp(raw, Utc::now())?,
        None => Utc::now().timestamp_millis(),
    };
    let planned = args.planned.unwrap_or(config.planned_duration_secs);
    let elapsed = args
        .elapsed
        .unwrap_or_else(|| elapsed_since_first_entry(timeline.entries(), now));

    let status = StatusInput {
        is_time_up: args.time_up,
        timer_active: args.timer_active,
        all_activities_completed: args.all_completed,
        elapsed_time: elapsed,
        total_duration: planned,
    };
    let summary = summarize(timeline.entries(), now, &status);
    tracing::debug!(entries = timeline.entries().len(), now, elapsed, "summarized timeline");

    let view = SummaryView {
        summary: &summary,
        entries: timeline.entries(),
        planned,
        elapsed,
        theme: config.theme,
        skipped: Vec::new(),
    };
    if args.json {
        writeln!(writer, "{}", format_summary_json(&view)?)?;
    } else {
        write!(writer, "{}", format_summary(&view))?;
    }

    Ok(())
}
