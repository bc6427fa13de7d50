//! Rule installer that publishes the blocking rule as a JSON file.
//!
//! The file holds the browser's dynamic rule list: one redirect rule while a
//! session is active, no file at all otherwise.

use std::io;
use std::path::{Path, PathBuf};

use fg_core::{Allowlist, BlockingRule, CollaboratorError, RuleInstaller};

const COLLABORATOR: &str = "rule installer";

#[derive(Debug, Clone)]
pub struct RulesFile {
    path: PathBuf,
    block_page_url: String,
}

impl RulesFile {
    pub fn new(path: impl Into<PathBuf>, block_page_url: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            block_page_url: block_page_url.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rule_for(&self, allowlist: &Allowlist) -> BlockingRule {
        BlockingRule::for_allowlist(allowlist, &self.block_page_url)
    }

    /// Whether a rule set is currently published.
    pub fn is_installed(&self) -> bool {
        self.path.exists()
    }

    /// Writes `rules` through a temporary file so readers never see a partial list.
    pub fn write(&self, rules: &[BlockingRule]) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(rules)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)
    }

    pub fn remove(&self) -> io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
            _ => Ok(()),
        }
    }
}

impl RuleInstaller for RulesFile {
    fn install(&mut self, allowlist: &Allowlist) -> Result<(), CollaboratorError> {
        let rule = self.rule_for(allowlist);
        self.write(&[rule])
            .map_err(|err| CollaboratorError::new(COLLABORATOR, err.to_string()))?;
        tracing::debug!(path = %self.path.display(), allowed = allowlist.len(), "rules file written");
        Ok(())
    }

    fn clear(&mut self) -> Result<(), CollaboratorError> {
        self.remove()
            .map_err(|err| CollaboratorError::new(COLLABORATOR, err.to_string()))?;
        tracing::debug!(path = %self.path.display(), "rules file removed");
        Ok(())
    }
}
