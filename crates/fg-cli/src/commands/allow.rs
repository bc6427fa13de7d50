//! Allowlist management.

use std::io::Write;

use anyhow::{Context, Result};
use fg_core::{Allowlist, Dispatcher, normalize_domain, state};

pub fn add<W: Write>(writer: &mut W, dispatcher: &mut Dispatcher, input: &str) -> Result<()> {
    let mut allowlist = load(dispatcher)?;
    let domain = allowlist.add(input)?;
    save(dispatcher, &allowlist)?;

    writeln!(writer, "Added {domain}")?;
    refresh_rules(writer, dispatcher)
}

pub fn remove<W: Write>(writer: &mut W, dispatcher: &mut Dispatcher, input: &str) -> Result<()> {
    let target = normalize_domain(input).unwrap_or_else(|| input.trim().to_lowercase());
    let mut allowlist = load(dispatcher)?;
    if !allowlist.remove(&target) {
        anyhow::bail!("{target} is not in the allowlist");
    }
    save(dispatcher, &allowlist)?;

    writeln!(writer, "Removed {target}")?;
    refresh_rules(writer, dispatcher)
}

pub fn list<W: Write>(writer: &mut W, dispatcher: &Dispatcher, json: bool) -> Result<()> {
    let allowlist = load(dispatcher)?;

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&allowlist)?)?;
        return Ok(());
    }

    if allowlist.is_empty() {
        writeln!(writer, "Allowlist is empty.")?;
        writeln!(writer, "Hint: Run 'fg allow add <domain>' to add one.")?;
        return Ok(());
    }
    for domain in &allowlist {
        writeln!(writer, "{domain}")?;
    }
    Ok(())
}

fn load(dispatcher: &Dispatcher) -> Result<Allowlist> {
    state::load_allowlist(dispatcher.store()).context("failed to read allowlist")
}

fn save(dispatcher: &mut Dispatcher, allowlist: &Allowlist) -> Result<()> {
    state::save_allowlist(dispatcher.store_mut(), allowlist).context("failed to save allowlist")
}

/// Widens or narrows a running session's block scope to the new allowlist.
fn refresh_rules<W: Write>(writer: &mut W, dispatcher: &mut Dispatcher) -> Result<()> {
    let mut focus = dispatcher.focus();
    focus.expire_if_due()?;
    if focus.on_allowlist_changed()? {
        writeln!(writer, "Blocking rules updated for the running session.")?;
        writeln!(
            writer,
            "Hint: A running 'fg serve' applies the change when the extension sends ALLOWLIST_UPDATED."
        )?;
    }
    Ok(())
}
