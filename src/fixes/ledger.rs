//! Fix ledger: which remediation actions have already run on this host
//!
//! The ledger is keyed by fix name, not by issue code, so a fix shared by
//! several codes runs once. It is read wholesale when loaded and written
//! wholesale by [`FixLedger::save`] as a single JSON array of names.

use crate::core::error::{HostcheckResult, ResultExt};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// What [`FixLedger::apply`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixOutcome {
  Applied,
  AlreadyApplied,
}

/// Persisted set of applied fix names
#[derive(Debug, Clone)]
pub struct FixLedger {
  path: PathBuf,
  applied: BTreeSet<String>,
}

impl FixLedger {
  /// Load the ledger at `path`; a missing file is an empty ledger
  pub fn load(path: &Path) -> HostcheckResult<Self> {
    let applied = if path.exists() {
      let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read fix ledger {}", path.display()))?;
      let names: Vec<String> =
        serde_json::from_str(&content).with_context(|| format!("Corrupt fix ledger {}", path.display()))?;
      names.into_iter().collect()
    } else {
      BTreeSet::new()
    };
    tracing::debug!(path = %path.display(), entries = applied.len(), "fix ledger loaded");

    Ok(Self {
      path: path.to_path_buf(),
      applied,
    })
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn is_applied(&self, name: &str) -> bool {
    self.applied.contains(name)
  }

  /// Applied fix names, ascending
  pub fn applied(&self) -> impl Iterator<Item = &str> {
    self.applied.iter().map(String::as_str)
  }

  /// Run `action` unless `name` is already in the ledger.
  ///
  /// The name is only recorded when the action succeeds, so a failed fix is
  /// retried next time.
  pub fn apply<F>(&mut self, name: &str, action: F) -> anyhow::Result<FixOutcome>
  where
    F: FnOnce() -> anyhow::Result<()>,
  {
    if self.is_applied(name) {
      tracing::debug!(fix = name, "fix already applied, skipping");
      return Ok(FixOutcome::AlreadyApplied);
    }
    action()?;
    self.applied.insert(name.to_string());
    Ok(FixOutcome::Applied)
  }

  /// Write the ledger back to disk, creating its directory if needed
  pub fn save(&self) -> HostcheckResult<()> {
    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let names: Vec<&String> = self.applied.iter().collect();
    let content = serde_json::to_string(&names)?;
    fs::write(&self.path, content).with_context(|| format!("Failed to write fix ledger {}", self.path.display()))?;
    Ok(())
  }
}
