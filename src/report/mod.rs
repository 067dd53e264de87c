//! Report aggregate: the single place check outcomes are recorded
//!
//! A `Report` is shared between all running checks (`Arc<Report>`) and guards
//! each of its sub-structures with its own lock. Classification is derived on
//! read, so the order in which a check records success, warnings and failures
//! never matters:
//!
//! - any failure code for a name → Failure
//! - otherwise any warning code → Warning
//! - otherwise a recorded success → Success
//!
//! Rendering lives in [`table`] and [`json`]; reading a rendered table back
//! lives in [`parse`].

pub mod json;
pub mod parse;
pub mod table;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};

pub const SUCCESS_LABEL: &str = "Success";
pub const FAILURE_LABEL: &str = "FAIL";
pub const WARNING_LABEL: &str = "WARN";

static ANSI_ESCAPE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*m").expect("ANSI escape pattern is valid"));

/// Remove terminal color escapes
pub fn strip_ansi(text: &str) -> String {
  ANSI_ESCAPE.replace_all(text, "").into_owned()
}

/// Terminal classification of one check name
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Status {
  Failure,
  Warning,
  Success,
}

impl Status {
  /// Literal label used in the table output
  pub fn label(self) -> &'static str {
    match self {
      Status::Success => SUCCESS_LABEL,
      Status::Failure => FAILURE_LABEL,
      Status::Warning => WARNING_LABEL,
    }
  }

  /// Match a table status cell, ignoring case and color escapes
  pub fn from_label(label: &str) -> Option<Self> {
    let plain = strip_ansi(label);
    let plain = plain.trim();
    [Status::Success, Status::Failure, Status::Warning]
      .into_iter()
      .find(|s| s.label().eq_ignore_ascii_case(plain))
  }
}

impl fmt::Display for Status {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.label())
  }
}

/// Report-wide switches; fixed for the lifetime of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportSettings {
  /// Record warnings at all
  pub warnings: bool,
  /// Word-wrap reasons in the table
  pub wrap: bool,
  /// Color status labels in the table
  pub color: bool,
}

impl Default for ReportSettings {
  fn default() -> Self {
    Self {
      warnings: true,
      wrap: true,
      color: false,
    }
  }
}

/// What a code points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
  pub name: String,
  pub reason: String,
}

/// One issue as shown in a row of the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueEntry {
  pub code: String,
  pub reason: String,
  pub fix: Option<String>,
}

/// All issues of one kind recorded under a check name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckIssues {
  pub name: String,
  pub entries: Vec<IssueEntry>,
}

/// Consistent copy of a report, taken once per render
#[derive(Debug, Clone)]
pub struct Snapshot {
  pub host: String,
  /// Names classified as Success, ascending
  pub success: Vec<String>,
  /// Every name with failure codes, ascending
  pub failures: Vec<CheckIssues>,
  /// Every name with warning codes, ascending
  pub warnings: Vec<CheckIssues>,
  pub failure_by_code: BTreeMap<String, Issue>,
  pub warning_by_code: BTreeMap<String, Issue>,
  pub tags: BTreeMap<String, BTreeSet<String>>,
  pub host_state: BTreeMap<String, Value>,
}

#[derive(Debug, Default)]
struct Outcomes {
  /// Names that reported success, in first-seen order
  passed: Vec<String>,
  /// name → warning codes, in recording order
  warnings: BTreeMap<String, Vec<String>>,
  /// name → failure codes, in recording order
  failures: BTreeMap<String, Vec<String>>,
  warning_by_code: BTreeMap<String, Issue>,
  failure_by_code: BTreeMap<String, Issue>,
  fix_by_code: BTreeMap<String, String>,
}

impl Outcomes {
  fn status(&self, name: &str) -> Option<Status> {
    if self.failures.contains_key(name) {
      Some(Status::Failure)
    } else if self.warnings.contains_key(name) {
      Some(Status::Warning)
    } else if self.passed.iter().any(|n| n == name) {
      Some(Status::Success)
    } else {
      None
    }
  }

  fn entries(&self, codes: &[String], index: &BTreeMap<String, Issue>) -> Vec<IssueEntry> {
    codes
      .iter()
      .map(|code| IssueEntry {
        code: code.clone(),
        reason: index.get(code).map(|i| i.reason.clone()).unwrap_or_default(),
        fix: self.fix_by_code.get(code).cloned(),
      })
      .collect()
  }
}

/// Thread-safe accumulator of check outcomes
#[derive(Debug, Default)]
pub struct Report {
  settings: ReportSettings,
  host: Mutex<Option<String>>,
  outcomes: Mutex<Outcomes>,
  tags: Mutex<BTreeMap<String, BTreeSet<String>>>,
  host_state: Mutex<BTreeMap<String, Value>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
  // A panic in another thread cannot leave these maps half-updated: every
  // mutation below is a single insert or push.
  mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Report {
  pub fn new(settings: ReportSettings) -> Self {
    Self {
      settings,
      ..Self::default()
    }
  }

  pub fn settings(&self) -> ReportSettings {
    self.settings
  }

  /// Pin the host identifier instead of resolving it lazily
  pub fn with_host(self, host: impl Into<String>) -> Self {
    self.set_host(host);
    self
  }

  pub fn set_host(&self, host: impl Into<String>) {
    *lock(&self.host) = Some(host.into());
  }

  /// Host identifier, resolving the local hostname if none was stamped yet
  pub fn host(&self) -> String {
    lock(&self.host).clone().unwrap_or_else(crate::utils::hostname)
  }

  /// Drop every outcome, tag and host-state entry
  pub fn reset(&self) {
    *lock(&self.outcomes) = Outcomes::default();
    lock(&self.tags).clear();
    lock(&self.host_state).clear();
    *lock(&self.host) = None;
  }

  /// Record that a check passed. No-op once the name has any issue.
  pub fn record_success<I, S>(&self, name: &str, tags: I)
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    {
      let mut outcomes = lock(&self.outcomes);
      if outcomes.failures.contains_key(name) || outcomes.warnings.contains_key(name) {
        return;
      }
      if !outcomes.passed.iter().any(|n| n == name) {
        outcomes.passed.push(name.to_string());
      }
    }
    self.merge_tags(name, tags);
  }

  /// Record a warning. Dropped entirely while warnings are disabled.
  pub fn record_warning<I, S>(&self, name: &str, reason: &str, code: &str, tags: I, fix: Option<&str>)
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    if !self.settings.warnings {
      return;
    }
    {
      let mut outcomes = lock(&self.outcomes);
      outcomes.warnings.entry(name.to_string()).or_default().push(code.to_string());
      outcomes.warning_by_code.insert(
        code.to_string(),
        Issue {
          name: name.to_string(),
          reason: reason.to_string(),
        },
      );
      if let Some(fix) = fix {
        outcomes.fix_by_code.insert(code.to_string(), fix.to_string());
      }
    }
    self.merge_tags(name, tags);
  }

  /// Record a failure. Never suppressed.
  pub fn record_failure<I, S>(&self, name: &str, reason: &str, code: &str, tags: I, fix: Option<&str>)
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    {
      let mut outcomes = lock(&self.outcomes);
      outcomes.failures.entry(name.to_string()).or_default().push(code.to_string());
      outcomes.failure_by_code.insert(
        code.to_string(),
        Issue {
          name: name.to_string(),
          reason: reason.to_string(),
        },
      );
      if let Some(fix) = fix {
        outcomes.fix_by_code.insert(code.to_string(), fix.to_string());
      }
    }
    self.merge_tags(name, tags);
  }

  /// Upsert a host-state entry; the first call stamps the host identifier
  pub fn record_host_state(&self, key: impl Into<String>, value: Value) {
    {
      let mut host = lock(&self.host);
      if host.is_none() {
        *host = Some(crate::utils::hostname());
      }
    }
    lock(&self.host_state).insert(key.into(), value);
  }

  fn merge_tags<I, S>(&self, name: &str, tags: I)
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let mut all = lock(&self.tags);
    let entry = all.entry(name.to_string()).or_default();
    for tag in tags {
      entry.insert(tag.as_ref().to_string());
    }
  }

  /// Classification of a name, or None if nothing was recorded for it
  pub fn status(&self, name: &str) -> Option<Status> {
    lock(&self.outcomes).status(name)
  }

  /// Names classified as Success, ascending
  pub fn success_names(&self) -> Vec<String> {
    let outcomes = lock(&self.outcomes);
    let mut names: Vec<String> = outcomes
      .passed
      .iter()
      .filter(|n| outcomes.status(n) == Some(Status::Success))
      .cloned()
      .collect();
    names.sort();
    names
  }

  /// Names classified as Warning, ascending
  pub fn warning_names(&self) -> Vec<String> {
    let outcomes = lock(&self.outcomes);
    outcomes
      .warnings
      .keys()
      .filter(|n| !outcomes.failures.contains_key(*n))
      .cloned()
      .collect()
  }

  /// Names classified as Failure, ascending
  pub fn failure_names(&self) -> Vec<String> {
    lock(&self.outcomes).failures.keys().cloned().collect()
  }

  /// Tags recorded for a name
  pub fn tags_for(&self, name: &str) -> BTreeSet<String> {
    lock(&self.tags).get(name).cloned().unwrap_or_default()
  }

  /// Remediation text recorded for a code
  pub fn fix_for(&self, code: &str) -> Option<String> {
    lock(&self.outcomes).fix_by_code.get(code).cloned()
  }

  /// Issue a failure or warning code points at
  pub fn issue(&self, code: &str) -> Option<Issue> {
    let outcomes = lock(&self.outcomes);
    outcomes
      .failure_by_code
      .get(code)
      .or_else(|| outcomes.warning_by_code.get(code))
      .cloned()
  }

  /// Codes to drive fix replay: every failure code, then every warning code
  /// unless warnings are disabled. Each code appears once.
  pub fn codes(&self) -> Vec<String> {
    let outcomes = lock(&self.outcomes);
    let mut seen = BTreeSet::new();
    let mut codes = Vec::new();
    let warning_codes = outcomes.warning_by_code.keys().filter(|_| self.settings.warnings);
    for code in outcomes.failure_by_code.keys().chain(warning_codes) {
      if seen.insert(code.clone()) {
        codes.push(code.clone());
      }
    }
    codes
  }

  /// True when nothing at all has been recorded
  pub fn is_empty(&self) -> bool {
    let outcomes = lock(&self.outcomes);
    outcomes.passed.is_empty() && outcomes.warnings.is_empty() && outcomes.failures.is_empty()
  }

  pub fn has_failures(&self) -> bool {
    !lock(&self.outcomes).failures.is_empty()
  }

  /// Copy everything needed for rendering
  pub fn snapshot(&self) -> Snapshot {
    let (success, failures, warnings, failure_by_code, warning_by_code) = {
      let outcomes = lock(&self.outcomes);
      let mut success: Vec<String> = outcomes
        .passed
        .iter()
        .filter(|n| outcomes.status(n) == Some(Status::Success))
        .cloned()
        .collect();
      success.sort();
      let failures = outcomes
        .failures
        .iter()
        .map(|(name, codes)| CheckIssues {
          name: name.clone(),
          entries: outcomes.entries(codes, &outcomes.failure_by_code),
        })
        .collect();
      let warnings = outcomes
        .warnings
        .iter()
        .map(|(name, codes)| CheckIssues {
          name: name.clone(),
          entries: outcomes.entries(codes, &outcomes.warning_by_code),
        })
        .collect();
      (
        success,
        failures,
        warnings,
        outcomes.failure_by_code.clone(),
        outcomes.warning_by_code.clone(),
      )
    };

    Snapshot {
      host: self.host(),
      success,
      failures,
      warnings,
      failure_by_code,
      warning_by_code,
      tags: lock(&self.tags).clone(),
      host_state: lock(&self.host_state).clone(),
    }
  }
}
