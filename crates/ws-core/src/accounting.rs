//! Time accounting over a recorded timeline.
//!
//! Every function here is pure: results depend only on the entries and the
//! explicit `now`. Millisecond deltas are rounded half up to whole seconds
//! one delta at a time, so all outputs use the same rounding.
//!
//! # Idle time
//!
//! Breaks are not required to be recorded. Entries are walked in start order
//! and any gap between the end of one entry and the start of the next is
//! counted as idle, in addition to explicit break entries.

use std::collections::HashMap;

use serde::Serialize;

use crate::timeline::TimelineEntry;
use crate::types::{ActivityId, EpochMillis, millis_to_secs};

/// Aggregate idle and active seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityStats {
    pub idle_time: i64,
    pub active_time: i64,
}

/// Total seconds attributed to one activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityTime {
    pub id: ActivityId,
    pub name: Option<String>,
    pub duration: i64,
}

/// Entries ordered by start time. Input order is not trusted.
fn chronological(entries: &[TimelineEntry]) -> Vec<&TimelineEntry> {
    let mut sorted: Vec<&TimelineEntry> = entries.iter().collect();
    sorted.sort_by_key(|entry| entry.start_time);
    sorted
}

/// Splits the covered span into idle and active seconds.
pub fn calculate_activity_stats(entries: &[TimelineEntry], now: EpochMillis) -> ActivityStats {
    let mut stats = ActivityStats::default();
    let mut last_end: Option<EpochMillis> = None;

    for entry in chronological(entries) {
        let end = entry.effective_end(now);

        if let Some(last_end) = last_end {
            if entry.start_time > last_end {
                let gap = millis_to_secs(entry.start_time.saturating_sub(last_end));
                stats.idle_time = stats.idle_time.saturating_add(gap);
            }
        }

        let duration = millis_to_secs(entry.duration_ms(now));
        if entry.is_idle() {
            stats.idle_time = stats.idle_time.saturating_add(duration);
        } else {
            stats.active_time = stats.active_time.saturating_add(duration);
        }

        last_end = Some(end);
    }

    stats
}

/// Per-activity totals, ordered by each activity's first appearance.
pub fn calculate_activity_times(entries: &[TimelineEntry], now: EpochMillis) -> Vec<ActivityTime> {
    let mut times: Vec<ActivityTime> = Vec::new();
    let mut positions: HashMap<&ActivityId, usize> = HashMap::new();

    for entry in chronological(entries) {
        let Some(activity_id) = &entry.activity_id else {
            continue;
        };
        let duration = millis_to_secs(entry.duration_ms(now));

        if let Some(&position) = positions.get(activity_id) {
            let time = &mut times[position];
            time.duration = time.duration.saturating_add(duration);
            if time.name.is_none() {
                time.name.clone_from(&entry.activity_name);
            }
        } else {
            positions.insert(activity_id, times.len());
            times.push(ActivityTime {
                id: activity_id.clone(),
                name: entry.activity_name.clone(),
                duration,
            });
        }
    }

    times
}

/// Seconds spent beyond the plan; never negative.
pub const fn calculate_overtime(elapsed: i64, planned: i64) -> i64 {
    let excess = elapsed.saturating_sub(planned);
    if excess > 0 { excess } else { 0 }
}

/// Timer readings the status message is derived from.
///
/// These come from the external clock; the core never measures time itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusInput {
    pub is_time_up: bool,
    pub timer_active: bool,
    pub all_activities_completed: bool,
    /// Seconds since the session timer started.
    pub elapsed_time: i64,
    /// Planned session length in seconds.
    pub total_duration: i64,
}

/// How the session is going, as a category plus the numbers behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum StatusMessage {
    /// The external timer reports the planned time has run out.
    TimeUp,
    /// Still running and past the plan; `remaining` is negative.
    OverAllocatedTime { remaining: i64 },
    /// Still running and exactly at the plan.
    AtAllocatedTime,
    /// Still running within the plan.
    OnTrack { remaining: i64 },
    /// All activities done within the plan.
    FinishedEarly { by: i64 },
    /// All activities done, but after the plan ran out.
    TookLonger { by: i64 },
}

/// Presentation hint for a status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusTone {
    Early,
    Late,
}

impl StatusMessage {
    pub const fn tone(&self) -> StatusTone {
        match self {
            Self::OnTrack { .. } | Self::FinishedEarly { .. } => StatusTone::Early,
            Self::TimeUp
            | Self::OverAllocatedTime { .. }
            | Self::AtAllocatedTime
            | Self::TookLonger { .. } => StatusTone::Late,
        }
    }
}

/// Picks the status message.
///
/// `is_time_up` wins over everything, including an active timer. Otherwise
/// an active timer compares elapsed against planned; otherwise a finished
/// session reports how far off the plan it ended. Anything else has no
/// message.
pub fn get_status_message(input: &StatusInput) -> Option<StatusMessage> {
    if input.is_time_up {
        return Some(StatusMessage::TimeUp);
    }

    if input.timer_active {
        let remaining = input.total_duration.saturating_sub(input.elapsed_time);
        let message = match remaining {
            r if r < 0 => StatusMessage::OverAllocatedTime { remaining },
            0 => StatusMessage::AtAllocatedTime,
            _ => StatusMessage::OnTrack { remaining },
        };
        return Some(message);
    }

    if input.all_activities_completed {
        let diff = input.elapsed_time.saturating_sub(input.total_duration);
        let message = if diff > 0 {
            StatusMessage::TookLonger { by: diff }
        } else {
            StatusMessage::FinishedEarly { by: diff.saturating_abs() }
        };
        return Some(message);
    }

    None
}

/// Display-ready figures for a session. Derived on demand, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub idle_time: i64,
    pub active_time: i64,
    pub overtime: i64,
    pub per_activity_time: Vec<ActivityTime>,
    pub status_message: Option<StatusMessage>,
}

/// Builds the full summary from the timeline and the timer readings.
pub fn summarize(entries: &[TimelineEntry], now: EpochMillis, status: &StatusInput) -> SessionSummary {
    let stats = calculate_activity_stats(entries, now);
    SessionSummary {
        idle_time: stats.idle_time,
        active_time: stats.active_time,
        overtime: calculate_overtime(status.elapsed_time, status.total_duration),
        per_activity_time: calculate_activity_times(entries, now),
        status_message: get_status_message(status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EntryId;

    fn entry(activity: Option<&str>, start: EpochMillis, end: Option<EpochMillis>) -> TimelineEntry {
        TimelineEntry {
            id: EntryId::generate(),
            activity_id: activity.map(|a| ActivityId::new(a).unwrap()),
            activity_name: activity.map(str::to_uppercase),
            start_time: start,
            end_time: end,
            colors: None,
        }
    }

    fn minutes(m: i64) -> EpochMillis {
        m * 60_000
    }

    fn ids(times: &[ActivityTime]) -> Vec<&str> {
        times.iter().map(|t| t.id.as_str()).collect()
    }

    // ========== Stats ==========

    #[test]
    fn test_gap_between_entries_is_idle() {
        let entries = [
            entry(Some("w"), 0, Some(60_000)),
            entry(Some("w2"), 120_000, Some(180_000)),
        ];
        let stats = calculate_activity_stats(&entries, 180_000);
        assert_eq!(
            stats,
            ActivityStats {
                idle_time: 60,
                active_time: 120
            }
        );
    }

    #[test]
    fn test_empty_entries() {
        assert_eq!(calculate_activity_stats(&[], 1_000), ActivityStats::default());
        assert!(calculate_activity_times(&[], 1_000).is_empty());
    }

    #[test]
    fn test_out_of_order_input_is_sorted() {
        let entries = [
            entry(Some("b"), minutes(5), Some(minutes(8))),
            entry(Some("a"), 0, Some(minutes(2))),
        ];
        let stats = calculate_activity_stats(&entries, minutes(8));
        assert_eq!(stats.active_time, 300);
        assert_eq!(stats.idle_time, 180);
    }

    #[test]
    fn test_open_entry_runs_until_now() {
        let entries = [entry(Some("a"), 0, None)];
        let stats = calculate_activity_stats(&entries, 90_000);
        assert_eq!(stats.active_time, 90);
        assert_eq!(stats.idle_time, 0);
    }

    #[test]
    fn test_explicit_break_counts_as_idle() {
        let entries = [
            entry(Some("a"), 0, Some(minutes(1))),
            entry(None, minutes(1), Some(minutes(3))),
            entry(Some("b"), minutes(4), Some(minutes(5))),
        ];
        let stats = calculate_activity_stats(&entries, minutes(5));
        assert_eq!(stats.active_time, 120);
        assert_eq!(stats.idle_time, 180);
    }

    #[test]
    fn test_overlapping_entries_add_no_gap() {
        let entries = [
            entry(Some("a"), 0, Some(minutes(3))),
            entry(Some("b"), minutes(2), Some(minutes(4))),
        ];
        let stats = calculate_activity_stats(&entries, minutes(4));
        assert_eq!(stats.idle_time, 0);
        assert_eq!(stats.active_time, 300);
    }

    #[test]
    fn test_gap_measured_from_entry_starting_at_zero() {
        let entries = [
            entry(Some("a"), 0, Some(0)),
            entry(Some("b"), 10_000, Some(20_000)),
        ];
        let stats = calculate_activity_stats(&entries, 20_000);
        assert_eq!(stats.idle_time, 10);
    }

    #[test]
    fn test_rounding_is_half_up_per_delta() {
        let entries = [
            entry(Some("a"), 0, Some(1_500)),
            entry(Some("b"), 2_000, Some(2_499)),
        ];
        let stats = calculate_activity_stats(&entries, 3_000);
        // 1.5s -> 2, gap 0.5s -> 1, 0.499s -> 0
        assert_eq!(stats.active_time, 2);
        assert_eq!(stats.idle_time, 1);
    }

    #[test]
    fn test_active_plus_idle_covers_span() {
        let entries = [
            entry(Some("a"), minutes(1), Some(minutes(4))),
            entry(None, minutes(6), Some(minutes(7))),
            entry(Some("b"), minutes(9), Some(minutes(15))),
            entry(Some("a"), minutes(20), None),
        ];
        let now = minutes(26);
        let stats = calculate_activity_stats(&entries, now);
        assert_eq!(stats.active_time + stats.idle_time, (now - minutes(1)) / 1000);
    }

    #[test]
    fn test_extreme_timestamps_saturate() {
        let entries = [entry(
            Some("a"),
            -9_000_000_000_000_000_000,
            Some(9_000_000_000_000_000_000),
        )];
        let stats = calculate_activity_stats(&entries, 0);
        assert_eq!(stats.active_time, i64::MAX / 1000);
        assert_eq!(stats.idle_time, 0);

        let times = calculate_activity_times(&entries, 0);
        assert_eq!(times[0].duration, i64::MAX / 1000);
    }

    #[test]
    fn test_stats_are_deterministic() {
        let entries = [
            entry(Some("a"), 0, Some(minutes(1))),
            entry(Some("b"), minutes(2), None),
        ];
        assert_eq!(
            calculate_activity_stats(&entries, minutes(10)),
            calculate_activity_stats(&entries, minutes(10))
        );
    }

    // ========== Per-activity times ==========

    #[test]
    fn test_activity_times_group_by_id() {
        let entries = [
            entry(Some("a"), 0, Some(minutes(1))),
            entry(Some("b"), minutes(1), Some(minutes(3))),
            entry(Some("a"), minutes(3), Some(minutes(6))),
        ];
        let times = calculate_activity_times(&entries, minutes(6));
        assert_eq!(ids(&times), ["a", "b"]);
        assert_eq!(times[0].duration, 240);
        assert_eq!(times[0].name.as_deref(), Some("A"));
        assert_eq!(times[1].duration, 120);
    }

    #[test]
    fn test_activity_times_keep_first_appearance_order() {
        // Input order, alphabetical order and duration order all disagree
        // with chronological first appearance.
        let entries = [
            entry(Some("alpha"), minutes(10), Some(minutes(40))),
            entry(Some("zulu"), 0, Some(minutes(1))),
            entry(Some("mike"), minutes(5), Some(minutes(6))),
        ];
        let times = calculate_activity_times(&entries, minutes(40));
        assert_eq!(ids(&times), ["zulu", "mike", "alpha"]);
    }

    #[test]
    fn test_activity_times_skip_breaks() {
        let entries = [
            entry(None, 0, Some(minutes(5))),
            entry(Some("a"), minutes(5), None),
        ];
        let times = calculate_activity_times(&entries, minutes(7));
        assert_eq!(ids(&times), ["a"]);
        assert_eq!(times[0].duration, 120);
    }

    #[test]
    fn test_activity_times_backfill_missing_name() {
        let mut first = entry(Some("a"), 0, Some(1_000));
        first.activity_name = None;
        let entries = [first, entry(Some("a"), 2_000, Some(3_000))];
        let times = calculate_activity_times(&entries, 3_000);
        assert_eq!(times[0].name.as_deref(), Some("A"));
        assert_eq!(times[0].duration, 2);
    }

    // ========== Overtime ==========

    #[test]
    fn test_overtime_zero_when_within_plan() {
        for elapsed in [0, 1, 89, 90] {
            assert_eq!(calculate_overtime(elapsed, 90), 0);
        }
    }

    #[test]
    fn test_overtime_is_excess() {
        assert_eq!(calculate_overtime(125, 90), 35);
        assert_eq!(calculate_overtime(91, 90), 1);
    }

    // ========== Status ==========

    fn running(elapsed: i64, planned: i64) -> StatusInput {
        StatusInput {
            timer_active: true,
            elapsed_time: elapsed,
            total_duration: planned,
            ..StatusInput::default()
        }
    }

    #[test]
    fn test_status_over_allocated_time() {
        let status = get_status_message(&running(125, 90));
        assert_eq!(
            status,
            Some(StatusMessage::OverAllocatedTime { remaining: -35 })
        );
        assert_eq!(status.unwrap().tone(), StatusTone::Late);
    }

    #[test]
    fn test_status_at_allocated_time() {
        assert_eq!(
            get_status_message(&running(90, 90)),
            Some(StatusMessage::AtAllocatedTime)
        );
    }

    #[test]
    fn test_status_on_track() {
        let status = get_status_message(&running(30, 90)).unwrap();
        assert_eq!(status, StatusMessage::OnTrack { remaining: 60 });
        assert_eq!(status.tone(), StatusTone::Early);
    }

    #[test]
    fn test_time_up_overrides_active_timer() {
        let input = StatusInput {
            is_time_up: true,
            all_activities_completed: true,
            ..running(10, 90)
        };
        assert_eq!(get_status_message(&input), Some(StatusMessage::TimeUp));
    }

    #[test]
    fn test_active_timer_overrides_completion() {
        let input = StatusInput {
            all_activities_completed: true,
            ..running(10, 90)
        };
        assert_eq!(
            get_status_message(&input),
            Some(StatusMessage::OnTrack { remaining: 80 })
        );
    }

    #[test]
    fn test_status_after_completion() {
        let finished = |elapsed| StatusInput {
            all_activities_completed: true,
            elapsed_time: elapsed,
            total_duration: 90,
            ..StatusInput::default()
        };
        assert_eq!(
            get_status_message(&finished(60)),
            Some(StatusMessage::FinishedEarly { by: 30 })
        );
        assert_eq!(
            get_status_message(&finished(90)),
            Some(StatusMessage::FinishedEarly { by: 0 })
        );
        assert_eq!(
            get_status_message(&finished(100)),
            Some(StatusMessage::TookLonger { by: 10 })
        );
    }

    #[test]
    fn test_no_status_when_idle() {
        assert_eq!(get_status_message(&StatusInput::default()), None);
    }

    // ========== Summary ==========

    #[test]
    fn test_summarize_combines_parts() {
        let entries = [
            entry(Some("w"), 0, Some(60_000)),
            entry(Some("w2"), 120_000, Some(180_000)),
        ];
        let status = StatusInput {
            all_activities_completed: true,
            elapsed_time: 180,
            total_duration: 150,
            ..StatusInput::default()
        };

        let summary = summarize(&entries, 180_000, &status);

        assert_eq!(summary.idle_time, 60);
        assert_eq!(summary.active_time, 120);
        assert_eq!(summary.overtime, 30);
        assert_eq!(ids(&summary.per_activity_time), ["w", "w2"]);
        assert_eq!(
            summary.status_message,
            Some(StatusMessage::TookLonger { by: 30 })
        );
    }

    #[test]
    fn test_status_message_json_shape() {
        let json = serde_json::to_string(&StatusMessage::OverAllocatedTime { remaining: -35 }).unwrap();
        assert_eq!(json, r#"{"category":"over_allocated_time","remaining":-35}"#);
    }
}
