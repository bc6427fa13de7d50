//! Focus guard CLI library.
//!
//! This crate provides the `fg` command-line interface and the browser host.

mod cli;
pub mod commands;
mod config;
pub mod host;
pub mod rules_file;

pub use cli::{AllowAction, Cli, Commands, SessionAction};
pub use config::Config;
