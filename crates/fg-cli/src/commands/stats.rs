//! Per-day usage report.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Context, Result};
use fg_core::{DayKey, DayReport, Dispatcher, state};

use super::util::{format_seconds, parse_day};

/// Builds the report for `day`, counting not-yet-credited time when `day` is today.
pub fn build_report(dispatcher: &Dispatcher, day: Option<DayKey>) -> Result<DayReport> {
    let store = dispatcher.store();
    let now = dispatcher.clock().now();
    let today = dispatcher.clock().day_key(now);
    let day = day.unwrap_or(today);

    let ledger = state::load_ledger(store).context("failed to read usage")?;
    let allowlist = state::load_allowlist(store).context("failed to read allowlist")?;
    let tracking = state::load_tracking(store).context("failed to read tracking state")?;

    let live = tracking
        .as_ref()
        .filter(|_| day == today)
        .and_then(|t| t.domain.as_ref().map(|domain| (domain, t.pending_seconds(now))));

    Ok(DayReport::build(&ledger, day, &allowlist, live))
}

pub fn format_report(report: &DayReport) -> String {
    let mut output = String::new();
    let title = format!("USAGE {}", report.day);
    writeln!(output, "{title}").unwrap();
    writeln!(output, "{}", "─".repeat(title.chars().count())).unwrap();

    if report.rows.is_empty() {
        writeln!(output, "No allowlisted domains.").unwrap();
        writeln!(output, "Hint: Run 'fg allow add <domain>' to start tracking.").unwrap();
        return output;
    }

    let width = report
        .rows
        .iter()
        .map(|row| row.domain.as_str().len())
        .max()
        .unwrap_or(0);
    for row in &report.rows {
        let marker = if row.active { "  (now)" } else { "" };
        writeln!(
            output,
            "{:<width$}  {:>7}{marker}",
            row.domain.as_str(),
            format_seconds(row.seconds)
        )
        .unwrap();
    }
    writeln!(output).unwrap();
    writeln!(output, "Total: {}", format_seconds(report.total_seconds)).unwrap();
    output
}

pub fn run<W: Write>(
    writer: &mut W,
    dispatcher: &Dispatcher,
    date: Option<&str>,
    json: bool,
) -> Result<()> {
    let day = date.map(parse_day).transpose()?;
    let report = build_report(dispatcher, day)?;

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        write!(writer, "{}", format_report(&report))?;
    }
    Ok(())
}
