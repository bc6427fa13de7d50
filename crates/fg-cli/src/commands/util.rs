//! Shared utilities for CLI commands.

use anyhow::Context;
use chrono::Duration;
use fg_core::DayKey;

/// Formats seconds for usage tables.
///
/// Returns "Xh MMm" from one hour, "Xm SSs" from one minute, "Xs" below.
pub fn format_seconds(total: u64) -> String {
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    if hours > 0 {
        format!("{hours}h {minutes:02}m")
    } else if minutes > 0 {
        format!("{minutes}m {seconds:02}s")
    } else {
        format!("{seconds}s")
    }
}

/// Formats a countdown as "MM:SS". Negative durations show as 00:00.
pub fn format_countdown(remaining: Duration) -> String {
    let total = remaining.num_seconds().max(0);
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Parses a `YYYY-MM-DD` day argument.
pub fn parse_day(s: &str) -> anyhow::Result<DayKey> {
    s.parse()
        .with_context(|| format!("Invalid date: {s}. Use YYYY-MM-DD (e.g., 2025-01-15)"))
}
