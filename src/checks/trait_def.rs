//! Check trait abstraction and the per-check scope handed to every body
//!
//! A check never talks to the report directly. The engine builds a
//! [`CheckScope`] for each scheduled check carrying its name, tags, the target
//! configuration and the shared report, and the body records outcomes through
//! it. A body that records nothing counts as Success.

use crate::core::config::TargetConfig;
use crate::report::Report;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Build a tag set from string literals
pub fn tag_set(tags: &[&str]) -> BTreeSet<String> {
  tags.iter().map(|t| t.to_string()).collect()
}

/// Host diagnostic check
///
/// # Example
///
/// ```rust,ignore
/// struct SwapCheck;
///
/// impl Check for SwapCheck {
///   fn name(&self) -> &str {
///     "SWAP"
///   }
///
///   fn tags(&self) -> BTreeSet<String> {
///     tag_set(&["basic", "local"])
///   }
///
///   fn description(&self) -> &str {
///     "Swap should be disabled"
///   }
///
///   fn run(&self, scope: &CheckScope) -> anyhow::Result<()> {
///     if swap_enabled()? {
///       scope.fail_with_fix("swap is enabled", "5A1B2C3D", "swapoff -a");
///     }
///     Ok(())
///   }
/// }
/// ```
pub trait Check: Send + Sync {
  /// Name the outcomes are recorded under (not required to be unique)
  fn name(&self) -> &str;

  /// Category labels used for selection
  fn tags(&self) -> BTreeSet<String>;

  /// One-line description for listings
  fn description(&self) -> &str {
    ""
  }

  /// Inspect the host and record outcomes on the scope.
  ///
  /// Returning an error (or panicking) is recorded by the engine as a crash
  /// failure under this check's name.
  fn run(&self, scope: &CheckScope) -> anyhow::Result<()>;
}

type CheckBody = dyn Fn(&CheckScope) -> anyhow::Result<()> + Send + Sync;

/// Check built from a closure, for registrations that need no struct
pub struct FnCheck {
  name: String,
  tags: BTreeSet<String>,
  description: String,
  body: Box<CheckBody>,
}

impl FnCheck {
  pub fn new<F>(name: impl Into<String>, tags: BTreeSet<String>, body: F) -> Self
  where
    F: Fn(&CheckScope) -> anyhow::Result<()> + Send + Sync + 'static,
  {
    Self {
      name: name.into(),
      tags,
      description: String::new(),
      body: Box::new(body),
    }
  }

  pub fn with_description(mut self, description: impl Into<String>) -> Self {
    self.description = description.into();
    self
  }
}

impl Check for FnCheck {
  fn name(&self) -> &str {
    &self.name
  }

  fn tags(&self) -> BTreeSet<String> {
    self.tags.clone()
  }

  fn description(&self) -> &str {
    &self.description
  }

  fn run(&self, scope: &CheckScope) -> anyhow::Result<()> {
    (self.body)(scope)
  }
}

/// Everything one check invocation may touch
///
/// Once sealed (the engine gave up waiting for this check), every further
/// write is dropped. The seal flag is held for the whole of each write, so
/// once `seal` returns no write of this scope can still land.
#[derive(Clone)]
pub struct CheckScope {
  name: String,
  tags: BTreeSet<String>,
  config: Arc<TargetConfig>,
  report: Arc<Report>,
  sealed: Arc<Mutex<bool>>,
}

impl CheckScope {
  pub fn new(name: impl Into<String>, tags: BTreeSet<String>, config: Arc<TargetConfig>, report: Arc<Report>) -> Self {
    Self {
      name: name.into(),
      tags,
      config,
      report,
      sealed: Arc::new(Mutex::new(false)),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn tags(&self) -> &BTreeSet<String> {
    &self.tags
  }

  pub fn config(&self) -> &TargetConfig {
    &self.config
  }

  /// Record a failure under this check's name
  pub fn fail(&self, reason: impl AsRef<str>, code: &str) {
    self.record_failure(reason.as_ref(), code, None);
  }

  pub fn fail_with_fix(&self, reason: impl AsRef<str>, code: &str, fix: impl AsRef<str>) {
    self.record_failure(reason.as_ref(), code, Some(fix.as_ref()));
  }

  /// Record a warning under this check's name
  pub fn warn(&self, reason: impl AsRef<str>, code: &str) {
    self.record_warning(reason.as_ref(), code, None);
  }

  pub fn warn_with_fix(&self, reason: impl AsRef<str>, code: &str, fix: impl AsRef<str>) {
    self.record_warning(reason.as_ref(), code, Some(fix.as_ref()));
  }

  /// Attach host-state data to the report
  pub fn host_state(&self, key: impl Into<String>, value: serde_json::Value) {
    let sealed = self.seal_guard();
    if *sealed {
      return;
    }
    self.report.record_host_state(key, value);
  }

  fn record_failure(&self, reason: &str, code: &str, fix: Option<&str>) {
    let sealed = self.seal_guard();
    if *sealed {
      tracing::debug!(check = %self.name, code, "dropping failure from timed-out check");
      return;
    }
    self.report.record_failure(&self.name, reason, code, &self.tags, fix);
  }

  fn record_warning(&self, reason: &str, code: &str, fix: Option<&str>) {
    let sealed = self.seal_guard();
    if *sealed {
      tracing::debug!(check = %self.name, code, "dropping warning from timed-out check");
      return;
    }
    self.report.record_warning(&self.name, reason, code, &self.tags, fix);
  }

  /// Implicit success once the body returned normally
  pub(crate) fn succeed(&self) {
    let sealed = self.seal_guard();
    if !*sealed {
      self.report.record_success(&self.name, &self.tags);
    }
  }

  /// Drop every later write. Waits for a write in progress to finish.
  pub(crate) fn seal(&self) {
    *self.seal_guard() = true;
  }

  #[cfg(test)]
  pub(crate) fn is_sealed(&self) -> bool {
    *self.seal_guard()
  }

  fn seal_guard(&self) -> MutexGuard<'_, bool> {
    self.sealed.lock().unwrap_or_else(PoisonError::into_inner)
  }
}
