use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use fg_core::{Dispatcher, SystemClock};
use fg_db::SqliteStore;
use tracing_subscriber::EnvFilter;

use fg_cli::commands::{allow, clear, one_shot, session, stats, status};
use fg_cli::{AllowAction, Cli, Commands, Config, SessionAction, host};

/// Load config and open the store, ensuring the parent directory exists.
fn open_store(config_path: Option<&Path>) -> Result<(SqliteStore, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let store = SqliteStore::open(&config.database_path).context("failed to open database")?;
    Ok((store, config))
}

fn open_dispatcher(config_path: Option<&Path>) -> Result<(Dispatcher, Config)> {
    let (store, config) = open_store(config_path)?;
    let dispatcher = one_shot(store, SystemClock, &config);
    Ok((dispatcher, config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout carries the host protocol, so logs always go to stderr
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let config_path = cli.config.as_deref();
    let mut out = io::stdout();

    match &cli.command {
        Some(Commands::Serve) => {
            let (store, config) = open_store(config_path)?;
            host::run(&config, store)?;
        }
        Some(Commands::Allow(action)) => {
            let (mut dispatcher, _config) = open_dispatcher(config_path)?;
            match action {
                AllowAction::Add { domain } => allow::add(&mut out, &mut dispatcher, domain)?,
                AllowAction::Remove { domain } => allow::remove(&mut out, &mut dispatcher, domain)?,
                AllowAction::List { json } => allow::list(&mut out, &dispatcher, *json)?,
            }
        }
        Some(Commands::Session(action)) => {
            let (mut dispatcher, config) = open_dispatcher(config_path)?;
            match action {
                SessionAction::Start { minutes, strict } => session::start(
                    &mut out,
                    &mut dispatcher,
                    *minutes,
                    *strict,
                    config.default_duration_minutes,
                )?,
                SessionAction::Stop { force } => session::stop(&mut out, &mut dispatcher, *force)?,
                SessionAction::Show { json } => session::show(&mut out, &mut dispatcher, *json)?,
            }
        }
        Some(Commands::Stats { date, json }) => {
            let (dispatcher, _config) = open_dispatcher(config_path)?;
            stats::run(&mut out, &dispatcher, date.as_deref(), *json)?;
        }
        Some(Commands::Status) => {
            let (mut dispatcher, config) = open_dispatcher(config_path)?;
            status::run(&mut out, &mut dispatcher, &config)?;
        }
        Some(Commands::Clear { yes }) => {
            let (mut dispatcher, _config) = open_dispatcher(config_path)?;
            clear::run(&mut out, &mut dispatcher, *yes)?;
        }
        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
