//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use fg_core::session::DEFAULT_DURATION_MINUTES;
use serde::{Deserialize, Serialize};

/// Block page shipped with the browser extension.
pub const DEFAULT_BLOCK_PAGE_URL: &str = "chrome-extension://focusguard/block.html";

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,
    /// Where the active blocking rules are written for the browser to pick up.
    pub rules_path: PathBuf,
    /// Page blocked navigations are redirected to.
    pub block_page_url: String,
    /// Seconds between usage flushes while serving.
    pub tick_interval_secs: u64,
    /// Session length used when `--minutes` is not given.
    pub default_duration_minutes: u32,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("rules_path", &self.rules_path)
            .field("block_page_url", &self.block_page_url)
            .field("tick_interval_secs", &self.tick_interval_secs)
            .field("default_duration_minutes", &self.default_duration_minutes)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("fg.db"),
            rules_path: data_dir.join("rules.json"),
            block_page_url: DEFAULT_BLOCK_PAGE_URL.to_string(),
            tick_interval_secs: 60,
            default_duration_minutes: DEFAULT_DURATION_MINUTES,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // FG_DATABASE_PATH, FG_TICK_INTERVAL_SECS, ...
        figment = figment.merge(Env::prefixed("FG_"));

        figment.extract()
    }

    /// Period of the usage flush, never shorter than one second.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs.max(1))
    }
}

/// Returns the platform-specific config directory for fg.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("fg"))
}

/// Returns the platform-specific data directory for fg.
///
/// On Linux: `~/.local/share/fg`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("fg"))
}
