//! Delete all recorded usage.

use std::io::Write;

use anyhow::{Context, Result};
use fg_core::{Dispatcher, state};

pub fn run<W: Write>(writer: &mut W, dispatcher: &mut Dispatcher, yes: bool) -> Result<()> {
    if !yes {
        anyhow::bail!("This deletes all usage history and cannot be undone. Re-run with --yes.");
    }

    let ledger = state::load_ledger(dispatcher.store()).unwrap_or_default();
    let days = ledger.days().count();
    state::clear_usage(dispatcher.store_mut()).context("failed to clear usage")?;

    tracing::info!(days, "usage history cleared");
    writeln!(writer, "Cleared usage history ({days} day(s)).")?;
    Ok(())
}
