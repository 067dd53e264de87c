//! JSON document form of a report
//!
//! Reasons are stored raw, without the `ISSUE <code>: ` prefix the table adds.
//! Fix texts are not part of the document.

use super::{Report, ReportSettings};
use crate::core::error::HostcheckResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Serialized report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDocument {
  pub host: String,
  /// Names classified as Success
  pub success: Vec<String>,
  /// code → [name, reason]
  pub warnings: BTreeMap<String, (String, String)>,
  /// code → [name, reason]
  pub failures: BTreeMap<String, (String, String)>,
  /// name → sorted tags
  pub tags: BTreeMap<String, Vec<String>>,
  #[serde(default)]
  pub host_state: BTreeMap<String, Value>,
}

impl Report {
  pub fn to_document(&self) -> ReportDocument {
    let snapshot = self.snapshot();
    ReportDocument {
      host: snapshot.host,
      success: snapshot.success,
      warnings: snapshot
        .warning_by_code
        .into_iter()
        .map(|(code, issue)| (code, (issue.name, issue.reason)))
        .collect(),
      failures: snapshot
        .failure_by_code
        .into_iter()
        .map(|(code, issue)| (code, (issue.name, issue.reason)))
        .collect(),
      tags: snapshot
        .tags
        .into_iter()
        .map(|(name, tags)| (name, tags.into_iter().collect()))
        .collect(),
      host_state: snapshot.host_state,
    }
  }

  /// Pretty-printed JSON document
  pub fn render_json(&self) -> HostcheckResult<String> {
    Ok(serde_json::to_string_pretty(&self.to_document())?)
  }

  /// Rebuild a report from its JSON document
  pub fn from_document(doc: ReportDocument, settings: ReportSettings) -> Report {
    let report = Report::new(settings).with_host(doc.host);
    let tags_of = |name: &str| doc.tags.get(name).cloned().unwrap_or_default();

    for (code, (name, reason)) in &doc.failures {
      report.record_failure(name, reason, code, tags_of(name), None);
    }
    for (code, (name, reason)) in &doc.warnings {
      report.record_warning(name, reason, code, tags_of(name), None);
    }
    for name in &doc.success {
      report.record_success(name, tags_of(name));
    }
    for (key, value) in doc.host_state {
      report.record_host_state(key, value);
    }
    report
  }
}
