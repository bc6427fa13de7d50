//! Focus session commands.

use std::io::Write;

use anyhow::{Context, Result};
use fg_core::{Command, Dispatcher, Response, SessionState};

use super::util::format_countdown;

pub fn start<W: Write>(
    writer: &mut W,
    dispatcher: &mut Dispatcher,
    minutes: Option<i64>,
    strict: bool,
    default_minutes: u32,
) -> Result<()> {
    let current = current(dispatcher)?;
    if current.is_active {
        let remaining = current.remaining(dispatcher.clock().now());
        anyhow::bail!(
            "A focus session is already running ({} left). Stop it first.",
            format_countdown(remaining)
        );
    }

    let session = into_session(dispatcher.handle_command(Command::StartSession {
        duration_minutes: minutes.unwrap_or_else(|| i64::from(default_minutes)),
        strict_mode: strict,
    }))?;

    let mode = if session.strict_mode { "strict" } else { "standard" };
    writeln!(
        writer,
        "Focus session started: {} minutes ({mode}).",
        session.duration_minutes
    )?;
    writeln!(
        writer,
        "Ends in {}.",
        format_countdown(session.remaining(dispatcher.clock().now()))
    )?;
    Ok(())
}

pub fn stop<W: Write>(writer: &mut W, dispatcher: &mut Dispatcher, force: bool) -> Result<()> {
    let current = current(dispatcher)?;
    if !current.is_active {
        writeln!(writer, "No focus session is running.")?;
        return Ok(());
    }
    if current.strict_mode && !force {
        let remaining = current.remaining(dispatcher.clock().now());
        anyhow::bail!(
            "Strict mode is on: the session cannot be stopped for another {}. Use --force to override.",
            format_countdown(remaining)
        );
    }

    into_session(dispatcher.handle_command(Command::StopSession))?;
    writeln!(writer, "Focus session stopped.")?;
    Ok(())
}

pub fn show<W: Write>(writer: &mut W, dispatcher: &mut Dispatcher, json: bool) -> Result<()> {
    let session = current(dispatcher)?;

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&session)?)?;
        return Ok(());
    }

    if !session.is_active {
        writeln!(writer, "No focus session is running.")?;
        return Ok(());
    }
    let mode = if session.strict_mode { "strict" } else { "standard" };
    writeln!(writer, "Focus session active ({mode})")?;
    writeln!(writer, "Duration:  {} minutes", session.duration_minutes)?;
    writeln!(
        writer,
        "Remaining: {}",
        format_countdown(session.remaining(dispatcher.clock().now()))
    )?;
    Ok(())
}

/// The live session, after stopping it if it ran out while nothing was running.
pub fn current(dispatcher: &mut Dispatcher) -> Result<SessionState> {
    dispatcher
        .focus()
        .expire_if_due()
        .context("failed to read focus session")
}

fn into_session(response: Response) -> Result<SessionState> {
    match response {
        Response {
            ok: true,
            session: Some(session),
            ..
        } => Ok(session),
        Response { error, .. } => {
            anyhow::bail!(error.unwrap_or_else(|| "unexpected empty response".to_string()))
        }
    }
}
