//! `fg serve`: the long-running browser host.
//!
//! Reads newline-delimited JSON frames from stdin, feeds them to the
//! dispatcher one at a time, and writes replies, rule updates and change
//! notifications to stdout. Timer wake-ups and shutdown signals are
//! multiplexed into the same loop, so every handler runs to completion
//! before the next input is taken.

pub mod protocol;
pub mod timers;

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{Context, Result};
use fg_core::env::TICK_ALARM;
use fg_core::{
    Allowlist, Clock, CollaboratorError, Dispatcher, DispatcherConfig, Event, Response,
    RuleInstaller, Store, StoreChange, SystemClock, TabQuery,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::Config;
use crate::rules_file::RulesFile;
use protocol::{BrowserEvent, Inbound, Outbound};
use timers::TimerScheduler;

/// URL of the focused tab, as last reported by the browser.
#[derive(Debug, Clone, Default)]
pub struct ReportedTab(Rc<RefCell<Option<String>>>);

impl ReportedTab {
    pub fn set(&self, url: Option<String>) {
        *self.0.borrow_mut() = url;
    }
}

impl TabQuery for ReportedTab {
    fn active_focused_tab_url(&self) -> Result<Option<String>, CollaboratorError> {
        Ok(self.0.borrow().clone())
    }
}

/// Mirrors rule changes to the rules file, then forwards them to the browser.
///
/// The browser only sees a rule set after the file write succeeded.
pub struct HostRules {
    file: RulesFile,
    frames: UnboundedSender<Outbound>,
}

impl HostRules {
    pub const fn new(file: RulesFile, frames: UnboundedSender<Outbound>) -> Self {
        Self { file, frames }
    }

    fn forward(&self, frame: Outbound) -> Result<(), CollaboratorError> {
        self.frames
            .send(frame)
            .map_err(|_| CollaboratorError::new("rule installer", "host output closed"))
    }
}

impl RuleInstaller for HostRules {
    fn install(&mut self, allowlist: &Allowlist) -> Result<(), CollaboratorError> {
        self.file.install(allowlist)?;
        self.forward(Outbound::install(self.file.rule_for(allowlist)))
    }

    fn clear(&mut self) -> Result<(), CollaboratorError> {
        self.file.clear()?;
        self.forward(Outbound::clear())
    }
}

/// Runs the host on stdin/stdout until input closes or the process is interrupted.
pub fn run(config: &Config, store: impl Store + 'static) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;
    let result = runtime.block_on(serve(
        config,
        store,
        SystemClock,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    ));
    // A pending stdin read would otherwise block shutdown.
    runtime.shutdown_background();
    result
}

pub async fn serve<R, W>(
    config: &Config,
    mut store: impl Store + 'static,
    clock: impl Clock + 'static,
    input: R,
    mut output: W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let (frames_tx, mut frames) = mpsc::unbounded_channel();
    let (alarms_tx, mut alarms) = mpsc::unbounded_channel();

    let changes = frames_tx.clone();
    store.subscribe(Box::new(move |change: &StoreChange| {
        let _ = changes.send(Outbound::Changed {
            key: change.key.clone(),
        });
    }));

    let tab = ReportedTab::default();
    let rules = HostRules::new(
        RulesFile::new(&config.rules_path, &config.block_page_url),
        frames_tx.clone(),
    );
    let mut dispatcher = Dispatcher::new(
        store,
        rules,
        TimerScheduler::new(alarms_tx),
        tab.clone(),
        clock,
    )
    .with_config(DispatcherConfig {
        tick_interval: config.tick_interval(),
    });

    tracing::info!(rules_path = %config.rules_path.display(), "host started");
    dispatcher.handle_event(&Event::Startup);
    write_frames(&mut frames, &mut output).await?;

    let mut lines = input.lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read host input")? else {
                    tracing::info!("input closed, shutting down");
                    break;
                };
                if let Some(reply) = handle_line(&mut dispatcher, &tab, &line) {
                    let _ = frames_tx.send(reply);
                }
            }
            Some(alarm) = alarms.recv() => handle_alarm(&mut dispatcher, &alarm),
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted, shutting down");
                break;
            }
        }
        write_frames(&mut frames, &mut output).await?;
    }

    // Credit the time since the last flush before exiting.
    dispatcher.handle_event(&Event::WindowBlurred);
    write_frames(&mut frames, &mut output).await
}

/// Handles one inbound line, returning the reply for commands.
fn handle_line(dispatcher: &mut Dispatcher, tab: &ReportedTab, line: &str) -> Option<Outbound> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    match Inbound::parse(line) {
        Ok(Inbound::Event { event, url }) => {
            // A blurred window has no active tab until the next focus report.
            if event == BrowserEvent::WindowBlurred {
                tab.set(None);
            } else if let Some(url) = url {
                tab.set(url);
            }
            dispatcher.handle_event(&event.into());
            None
        }
        Ok(Inbound::Command { id, message }) => Some(Outbound::Response {
            id,
            response: dispatcher.handle_message(&message),
        }),
        Err(err) if line.contains("\"event\"") => {
            tracing::warn!(error = %err, line, "ignoring unknown event");
            None
        }
        Err(err) => {
            tracing::warn!(error = %err, "malformed host input");
            Some(Outbound::Response {
                id: None,
                response: Response::error(fg_core::dispatch::UNKNOWN_MESSAGE),
            })
        }
    }
}

fn handle_alarm(dispatcher: &mut Dispatcher, alarm: &str) {
    dispatcher.handle_event(&Event::AlarmFired(alarm.to_string()));
    // Sessions started by one-shot commands have no wake-up of their own.
    if alarm == TICK_ALARM {
        if let Err(err) = dispatcher.focus().expire_if_due() {
            tracing::warn!(error = %err, "session expiry check failed");
        }
    }
}

async fn write_frames<W>(frames: &mut UnboundedReceiver<Outbound>, output: &mut W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut wrote = false;
    while let Ok(frame) = frames.try_recv() {
        let mut line = serde_json::to_string(&frame).context("failed to encode host output")?;
        line.push('\n');
        output
            .write_all(line.as_bytes())
            .await
            .context("failed to write host output")?;
        wrote = true;
    }
    if wrote {
        output.flush().await.context("failed to flush host output")?;
    }
    Ok(())
}
