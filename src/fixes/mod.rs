//! Remediation replay
//!
//! Each [`Fix`] names the issue codes it remediates. Given a list of codes
//! (typed in or extracted from a saved report), [`run_fixes`] applies every
//! matching fix through the [`FixLedger`](ledger::FixLedger), so a fix already
//! applied on this host is skipped.

pub mod builtin;
pub mod ledger;

use crate::checks::plugins::PluginCatalog;
use crate::core::config::TargetConfig;
use crate::core::error::{HostcheckResult, PluginError};
use ledger::{FixLedger, FixOutcome};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

type FixAction = dyn Fn(&TargetConfig) -> anyhow::Result<()> + Send + Sync;

/// Named remediation action
#[derive(Clone)]
pub struct Fix {
  name: String,
  codes: Vec<String>,
  description: String,
  action: Arc<FixAction>,
}

impl Fix {
  pub fn new<F>(name: impl Into<String>, codes: &[&str], description: impl Into<String>, action: F) -> Self
  where
    F: Fn(&TargetConfig) -> anyhow::Result<()> + Send + Sync + 'static,
  {
    Self {
      name: name.into(),
      codes: codes.iter().map(|c| c.to_string()).collect(),
      description: description.into(),
      action: Arc::new(action),
    }
  }

  /// Ledger key
  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn codes(&self) -> &[String] {
    &self.codes
  }

  pub fn description(&self) -> &str {
    &self.description
  }

  pub fn apply(&self, config: &TargetConfig) -> anyhow::Result<()> {
    (self.action)(config)
  }
}

impl fmt::Debug for Fix {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Fix")
      .field("name", &self.name)
      .field("codes", &self.codes)
      .finish_non_exhaustive()
  }
}

/// Ordered set of fixes
#[derive(Debug, Default, Clone)]
pub struct FixRegistry {
  fixes: Vec<Fix>,
}

impl FixRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn register(&mut self, fix: Fix) {
    self.fixes.push(fix);
  }

  /// Append the fixes of each named plugin
  pub fn load_plugins(&mut self, catalog: &PluginCatalog, names: &[String]) -> HostcheckResult<()> {
    for name in names {
      let plugin = catalog.get(name).ok_or_else(|| PluginError::Unknown {
        name: name.clone(),
        available: catalog.names(),
      })?;
      self.fixes.extend(plugin.load_fixes());
    }
    Ok(())
  }

  /// Fixes remediating `code`, in registration order
  pub fn for_code(&self, code: &str) -> Vec<&Fix> {
    self.fixes.iter().filter(|f| f.codes.iter().any(|c| c == code)).collect()
  }

  pub fn all(&self) -> &[Fix] {
    &self.fixes
  }
}

/// Registry with every built-in fix
pub fn create_default_fix_registry() -> FixRegistry {
  let mut registry = FixRegistry::new();
  builtin::register_all(&mut registry);
  registry
}

/// What a fix replay did
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FixSummary {
  /// Fixes executed in this run (or that would run, for a dry run)
  pub applied: Vec<String>,
  /// Fixes found in the ledger
  pub skipped: Vec<String>,
  /// Codes no fix is registered for
  pub unknown: Vec<String>,
  /// (fix name, error) for fixes whose action failed
  pub failed: Vec<(String, String)>,
}

impl FixSummary {
  pub fn has_failures(&self) -> bool {
    !self.failed.is_empty()
  }
}

/// Apply the fixes for `codes` in order, each fix at most once.
///
/// A failing fix does not stop the replay. The ledger is not saved here.
pub fn run_fixes(
  codes: &[String],
  registry: &FixRegistry,
  ledger: &mut FixLedger,
  config: &TargetConfig,
  dry_run: bool,
) -> FixSummary {
  let mut summary = FixSummary::default();
  let mut seen = BTreeSet::new();

  for code in codes {
    let fixes = registry.for_code(code);
    if fixes.is_empty() {
      tracing::debug!(code = %code, "no fix registered for code");
      summary.unknown.push(code.clone());
      continue;
    }

    for fix in fixes {
      if !seen.insert(fix.name().to_string()) {
        continue;
      }
      if dry_run {
        if ledger.is_applied(fix.name()) {
          summary.skipped.push(fix.name().to_string());
        } else {
          summary.applied.push(fix.name().to_string());
        }
        continue;
      }

      match ledger.apply(fix.name(), || fix.apply(config)) {
        Ok(FixOutcome::Applied) => {
          tracing::info!(fix = fix.name(), code = %code, "fix applied");
          summary.applied.push(fix.name().to_string());
        }
        Ok(FixOutcome::AlreadyApplied) => summary.skipped.push(fix.name().to_string()),
        Err(err) => {
          tracing::warn!(fix = fix.name(), error = %format!("{:#}", err), "fix failed");
          summary.failed.push((fix.name().to_string(), format!("{:#}", err)));
        }
      }
    }
  }
  summary
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use tempfile::TempDir;

  fn counting_fix(name: &str, codes: &[&str], counter: &Arc<AtomicUsize>) -> Fix {
    let counter = Arc::clone(counter);
    Fix::new(name, codes, "test fix", move |_| {
      counter.fetch_add(1, Ordering::SeqCst);
      Ok(())
    })
  }

  fn codes(list: &[&str]) -> Vec<String> {
    list.iter().map(|c| c.to_string()).collect()
  }

  #[test]
  fn test_shared_fix_runs_once_and_unknown_codes_reported() {
    let tmp = TempDir::new().unwrap();
    let counter = Arc::new(AtomicUsize::new(0));
    let mut registry = FixRegistry::new();
    registry.register(counting_fix("arp", &["9000C3B6", "BDB4D5D8"], &counter));

    let mut ledger = FixLedger::load(&tmp.path().join("ledger")).unwrap();
    let summary = run_fixes(
      &codes(&["9000C3B6", "BDB4D5D8", "NOPE"]),
      &registry,
      &mut ledger,
      &TargetConfig::default(),
      false,
    );
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert_eq!(summary.applied, vec!["arp".to_string()]);
    assert_eq!(summary.unknown, vec!["NOPE".to_string()]);
  }

  #[test]
  fn test_ledger_skips_previously_applied() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("ledger");
    let counter = Arc::new(AtomicUsize::new(0));
    let mut registry = FixRegistry::new();
    registry.register(counting_fix("irq", &["B19D9FF1"], &counter));

    for _ in 0..2 {
      let mut ledger = FixLedger::load(&path).unwrap();
      run_fixes(&codes(&["B19D9FF1"]), &registry, &mut ledger, &TargetConfig::default(), false);
      ledger.save().unwrap();
    }
    assert_eq!(counter.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn test_dry_run_executes_nothing() {
    let tmp = TempDir::new().unwrap();
    let counter = Arc::new(AtomicUsize::new(0));
    let mut registry = FixRegistry::new();
    registry.register(counting_fix("irq", &["B19D9FF1"], &counter));
    let mut ledger = FixLedger::load(&tmp.path().join("ledger")).unwrap();
    let summary = run_fixes(&codes(&["B19D9FF1"]), &registry, &mut ledger, &TargetConfig::default(), true);
    assert_eq!(summary.applied, vec!["irq".to_string()]);
    assert_eq!(counter.load(Ordering::SeqCst), 0);
    assert!(!ledger.is_applied("irq"));
  }

  #[test]
  fn test_failing_fix_is_collected() {
    let tmp = TempDir::new().unwrap();
    let mut registry = FixRegistry::new();
    registry.register(Fix::new("broken", &["C1"], "fails", |_| anyhow::bail!("read-only filesystem")));
    let mut ledger = FixLedger::load(&tmp.path().join("ledger")).unwrap();
    let summary = run_fixes(&codes(&["C1"]), &registry, &mut ledger, &TargetConfig::default(), false);
    assert!(summary.has_failures());
    assert_eq!(summary.failed[0].1, "read-only filesystem");
  }

  #[test]
  fn test_default_registry_covers_arp_codes() {
    let registry = create_default_fix_registry();
    assert_eq!(registry.for_code("9000C3B6").len(), 1);
    assert_eq!(registry.for_code("BDB4D5D8").len(), 1);
    assert!(registry.for_code("HC-CRASH").is_empty());
  }
}
