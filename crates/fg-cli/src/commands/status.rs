//! Status command: session countdown and what is being timed.

use std::io::Write;

use anyhow::{Context, Result};
use fg_core::{Dispatcher, state};

use super::session;
use super::stats::build_report;
use super::util::{format_countdown, format_seconds};
use crate::Config;

pub fn run<W: Write>(writer: &mut W, dispatcher: &mut Dispatcher, config: &Config) -> Result<()> {
    let current = session::current(dispatcher)?;
    let now = dispatcher.clock().now();
    let tracking = state::load_tracking(dispatcher.store()).context("failed to read tracking state")?;
    let report = build_report(dispatcher, None)?;

    writeln!(writer, "Focus guard status")?;
    writeln!(writer, "Database: {}", config.database_path.display())?;

    if current.is_active {
        let mode = if current.strict_mode { "strict" } else { "standard" };
        writeln!(
            writer,
            "Session:  active ({mode}), {} left",
            format_countdown(current.remaining(now))
        )?;
    } else {
        writeln!(writer, "Session:  none")?;
    }

    match tracking.as_ref().and_then(|t| t.domain.as_ref().map(|d| (d, t))) {
        Some((domain, t)) => writeln!(
            writer,
            "Tracking: {domain} ({} not yet credited)",
            format_seconds(t.pending_seconds(now))
        )?,
        None => writeln!(writer, "Tracking: idle")?,
    }

    let used = report.rows.iter().filter(|row| row.seconds > 0).count();
    writeln!(
        writer,
        "Today:    {} across {used} domain(s)",
        format_seconds(report.total_seconds)
    )?;
    Ok(())
}
