//! Wall-clock exam countdown.
//!
//! Nothing runs in the background: remaining time is derived from the start
//! instant on every observation, so the caller polls as often as it renders.

use chrono::{DateTime, Utc};

/// Seconds left: `total_secs - (now - started_at)`, floored at zero.
///
/// Before the clock starts the full duration remains. An observation that
/// precedes the start instant counts as zero elapsed time.
pub fn remaining_time(total_secs: u64, started_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> u64 {
    let Some(started_at) = started_at else {
        return total_secs;
    };
    let elapsed = u64::try_from((now - started_at).num_seconds()).unwrap_or(0);
    total_secs.saturating_sub(elapsed)
}

/// `MM:SS`, minutes unbounded (a 200 minute paper starts at "200:00").
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
