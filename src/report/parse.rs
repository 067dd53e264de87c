//! Read a rendered table (or JSON document) back into a report
//!
//! The table form is lossy: wrapped lines are joined with single spaces and
//! cell padding is trimmed. Rows whose column count is neither 5 nor the
//! older 4 (`Test | Status | Reasons | Tags`) are skipped.

use super::json::ReportDocument;
use super::{Report, ReportSettings, Status};
use crate::core::error::{HostcheckResult, ParseError, ResultExt};
use std::fs;
use std::path::Path;

/// Load a saved report, detecting the JSON form by its leading brace
pub fn read_report(path: &Path, settings: ReportSettings) -> HostcheckResult<Report> {
  let text = fs::read_to_string(path).with_context(|| format!("Failed to read report {}", path.display()))?;
  if text.trim_start().starts_with('{') {
    let doc: ReportDocument =
      serde_json::from_str(&text).with_context(|| format!("Invalid JSON report {}", path.display()))?;
    return Ok(Report::from_document(doc, settings));
  }
  Ok(Report::parse_table(&text, settings))
}

#[derive(Debug)]
struct PendingIssue {
  code: String,
  reason: Vec<String>,
  fix: Option<Vec<String>>,
}

/// One logical row being accumulated across its physical lines
#[derive(Debug)]
struct PendingRow {
  name: String,
  status: Status,
  tags: Vec<String>,
  issues: Vec<PendingIssue>,
  /// Which text continuation lines extend
  in_fix: bool,
}

impl PendingRow {
  fn new(name: String, status: Status) -> Self {
    Self {
      name,
      status,
      tags: Vec::new(),
      issues: Vec::new(),
      in_fix: false,
    }
  }

  fn feed(&mut self, reason: &str, code_column: Option<&str>) {
    if reason.is_empty() {
      if let Some(code) = code_column.filter(|c| !c.is_empty()) {
        self.start_issue(code, "");
      }
      return;
    }

    // An ISSUE marker only counts when the code column agrees, so a wrapped
    // reason that happens to start with "ISSUE" stays a continuation.
    match code_column {
      Some(code) if !code.is_empty() => {
        let rest = reason
          .strip_prefix(&format!("ISSUE {}:", code))
          .map(str::trim_start)
          .unwrap_or(reason);
        self.start_issue(code, rest);
        return;
      }
      Some(_) => {}
      None => {
        if let Some((code, rest)) = reason.strip_prefix("ISSUE ").and_then(|r| r.split_once(':')) {
          self.start_issue(code.trim(), rest.trim_start());
          return;
        }
      }
    }

    // A fix line always directly follows the issue it belongs to
    let Some(last) = self.issues.last_mut() else {
      return;
    };
    if let Some(rest) = reason.strip_prefix(&format!("FIX {}:", last.code)) {
      last.fix = Some(vec![rest.trim_start().to_string()]);
      self.in_fix = true;
    } else if self.in_fix
      && let Some(fix) = last.fix.as_mut()
    {
      fix.push(reason.to_string());
    } else {
      last.reason.push(reason.to_string());
    }
  }

  fn start_issue(&mut self, code: &str, text: &str) {
    self.issues.push(PendingIssue {
      code: code.to_string(),
      reason: if text.is_empty() { Vec::new() } else { vec![text.to_string()] },
      fix: None,
    });
    self.in_fix = false;
  }

  fn flush(self, report: &Report) {
    let tags = &self.tags;
    match self.status {
      Status::Success => report.record_success(&self.name, tags),
      Status::Failure | Status::Warning => {
        if self.issues.is_empty() {
          tracing::debug!(name = %self.name, status = %self.status, "report row without issue lines skipped");
          return;
        }
        for issue in &self.issues {
          let reason = issue.reason.join(" ");
          let fix = issue.fix.as_ref().map(|f| f.join(" "));
          if self.status == Status::Failure {
            report.record_failure(&self.name, &reason, &issue.code, tags, fix.as_deref());
          } else {
            report.record_warning(&self.name, &reason, &issue.code, tags, fix.as_deref());
          }
        }
      }
    }
  }
}

impl Report {
  /// Reconstruct a report from its table rendering.
  ///
  /// Outcomes are replayed through the normal record operations, so the
  /// result honours `settings` (disabled warnings stay disabled).
  pub fn parse_table(text: &str, settings: ReportSettings) -> Report {
    let report = Report::new(settings);
    let mut header_seen = false;
    let mut pending: Option<PendingRow> = None;

    for (index, line) in text.lines().enumerate() {
      let line = line.trim();
      if let Some((before, host)) = line.split_once("HOST: ")
        && !before.contains('|')
      {
        report.set_host(host.trim());
        continue;
      }
      if !line.contains('|') {
        continue;
      }
      // Whatever precedes the first pipe (indentation, a quote marker) is
      // dropped with the outer fields.
      let fields: Vec<&str> = line.split('|').collect();
      let interior = &fields[1..fields.len().saturating_sub(1).max(1)];

      // The host-state table has 2 columns; it is skipped here together
      // with anything else that is not a check row.
      let (test, status, reason, code, tags) = match interior {
        [test, status, reason, code, tags] => (test.trim(), status.trim(), reason.trim(), Some(code.trim()), tags.trim()),
        [test, status, reason, tags] => (test.trim(), status.trim(), reason.trim(), None, tags.trim()),
        _ => {
          let err = ParseError::ReportLine {
            line: index + 1,
            columns: interior.len(),
          };
          tracing::debug!("{}", err);
          continue;
        }
      };

      if !header_seen {
        header_seen = true;
        continue;
      }

      if !status.is_empty() {
        let Some(status) = Status::from_label(status) else {
          tracing::debug!(line = index + 1, status, "unknown status label skipped");
          if let Some(row) = pending.take() {
            row.flush(&report);
          }
          continue;
        };
        let name = match (test, &pending) {
          ("", Some(prev)) => prev.name.clone(),
          _ => test.to_string(),
        };
        if let Some(row) = pending.take() {
          row.flush(&report);
        }
        pending = Some(PendingRow::new(name, status));
      }

      let Some(row) = pending.as_mut() else {
        continue;
      };
      row.tags.extend(tags.split_whitespace().map(str::to_string));
      row.feed(reason, code);
    }

    if let Some(row) = pending.take() {
      row.flush(&report);
    }
    report
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use proptest::prelude::*;
  use std::collections::{BTreeMap, BTreeSet};

  fn settings() -> ReportSettings {
    ReportSettings::default()
  }

  #[test]
  fn test_roundtrip_preserves_codes_and_fixes() {
    let r = Report::new(settings()).with_host("node-1");
    r.record_failure(
      "ISCSI",
      "noop_out_timeout is not set to 2 in /etc/iscsi/iscsid.conf and several more words to force a wrap",
      "F6A49337",
      ["iscsi", "basic"],
      Some("sed -i 's/^node.session.timeo.noop_out_timeout = .*/node.session.timeo.noop_out_timeout = 2/' /etc/iscsi/iscsid.conf"),
    );
    r.record_failure("ISCSI", "Duplicate noop_out_timeout on line 40", "D3E55910", ["iscsi"], None);
    r.record_warning("VIP2", "No vip2 configured", "16EB208B", ["connection"], None);
    r.record_success("OS", ["basic", "os"]);

    let back = Report::parse_table(&r.render_table(), settings());
    assert_eq!(back.failure_names(), r.failure_names());
    assert_eq!(back.warning_names(), r.warning_names());
    assert_eq!(back.success_names(), r.success_names());
    assert_eq!(back.codes(), r.codes());
    assert_eq!(back.issue("F6A49337"), r.issue("F6A49337"));
    assert_eq!(back.fix_for("F6A49337"), r.fix_for("F6A49337"));
    assert_eq!(back.tags_for("ISCSI"), r.tags_for("ISCSI"));
    assert_eq!(back.tags_for("OS"), r.tags_for("OS"));
  }

  #[test]
  fn test_roundtrip_with_color_and_no_wrap() {
    let s = ReportSettings {
      wrap: false,
      color: true,
      ..settings()
    };
    let r = Report::new(s);
    r.record_failure("A", &"long ".repeat(30), "C1", ["t"], None);
    r.record_warning("B", "soft", "C2", ["t"], Some("do it"));
    let back = Report::parse_table(&r.render_table(), s);
    assert_eq!(back.codes(), vec!["C1".to_string(), "C2".to_string()]);
    assert_eq!(back.fix_for("C2").as_deref(), Some("do it"));
  }

  #[test]
  fn test_mixed_failure_and_warning_rows() {
    let r = Report::new(settings());
    r.record_warning("VIP2", "No vip2 configured", "16EB208B", ["connection"], None);
    r.record_failure("VIP2", "unreachable", "4F6B8D91", ["connection"], None);
    let back = Report::parse_table(&r.render_table(), settings());
    assert_eq!(back.status("VIP2"), Some(Status::Failure));
    assert_eq!(back.codes(), r.codes());
  }

  #[test]
  fn test_disabled_warnings_drop_warning_rows() {
    let r = Report::new(settings());
    r.record_warning("VIP2", "No vip2 configured", "16EB208B", ["connection"], None);
    r.record_failure("MGMT", "no ping", "65FC68BB", ["connection"], None);
    let quiet = ReportSettings {
      warnings: false,
      ..settings()
    };
    let back = Report::parse_table(&r.render_table(), quiet);
    assert_eq!(back.codes(), vec!["65FC68BB".to_string()]);
  }

  #[test]
  fn test_four_column_table() {
    let text = "\
+------+--------+-------------------------+-------+
| Test | Status | Reasons                 | Tags  |
+======+========+=========================+=======+
| OS   | FAIL   | ISSUE 3C47368: Unsupported | basic |
|      |        | OS for hostcheck        | os    |
+------+--------+-------------------------+-------+
| UDEV | Success |                        | udev  |
+------+--------+-------------------------+-------+
";
    let back = Report::parse_table(text, settings());
    assert_eq!(back.codes(), vec!["3C47368".to_string()]);
    assert_eq!(back.issue("3C47368").unwrap().reason, "Unsupported OS for hostcheck");
    assert_eq!(back.success_names(), vec!["UDEV".to_string()]);
    assert_eq!(back.tags_for("OS").len(), 2);
  }

  #[test]
  fn test_host_state_and_noise_are_skipped() {
    let r = Report::new(settings()).with_host("node-7");
    r.record_success("OS", ["basic"]);
    r.record_host_state("kernel", serde_json::json!("6.1"));
    let text = format!("some log line\n{}\ntrailing | junk\n", r.render_table());
    let back = Report::parse_table(&text, settings());
    assert_eq!(back.host(), "node-7");
    assert_eq!(back.success_names(), vec!["OS".to_string()]);
    assert!(back.codes().is_empty());
  }

  #[test]
  fn test_read_report_detects_json() {
    let dir = tempfile::TempDir::new().unwrap();
    let r = Report::new(settings()).with_host("node-1");
    r.record_failure("A", "x", "C1", ["t"], None);

    let json_path = dir.path().join("report.json");
    fs::write(&json_path, r.render_json().unwrap()).unwrap();
    assert_eq!(read_report(&json_path, settings()).unwrap().codes(), vec!["C1".to_string()]);

    let table_path = dir.path().join("report.txt");
    fs::write(&table_path, r.render_table()).unwrap();
    assert_eq!(read_report(&table_path, settings()).unwrap().codes(), vec!["C1".to_string()]);

    assert!(read_report(&dir.path().join("missing"), settings()).is_err());
  }

  #[test]
  fn test_long_words_survive_wrapping() {
    let path = "/dev/disk/by-path/ip-172.28.0.10:3260-iscsi-iqn.2013-05.com.daterainc:tc:01:sn:a1b2c3d4-lun-0";
    let r = Report::new(settings());
    r.record_failure(
      "Block Devices",
      &format!("{} is not using the noop scheduler", path),
      "47BB5083",
      ["block_device"],
      Some(&format!("echo noop > /sys/block/{}/queue/scheduler", path)),
    );
    let back = Report::parse_table(&r.render_table(), settings());
    assert_eq!(back.issue("47BB5083"), r.issue("47BB5083"));
    assert_eq!(back.fix_for("47BB5083"), r.fix_for("47BB5083"));
  }

  #[test]
  fn test_indented_table_is_read() {
    let r = Report::new(settings()).with_host("node-3");
    r.record_failure("A", "broken", "C1", ["t"], None);
    r.record_success("B", ["t"]);
    r.record_host_state("kernel", serde_json::json!("6.1"));
    let table = r.render_table();

    for prefix in ["  ", "> "] {
      let quoted: String = table.lines().map(|l| format!("{}{}\n", prefix, l)).collect();
      let back = Report::parse_table(&quoted, settings());
      assert_eq!(back.codes(), vec!["C1".to_string()]);
      assert_eq!(back.success_names(), vec!["B".to_string()]);
      assert_eq!(back.host(), "node-3");
    }
  }

  #[derive(Debug, Clone)]
  struct CheckCase {
    status: Status,
    tags: BTreeSet<String>,
    issues: Vec<(String, Option<String>)>,
  }

  /// Pipe-free text with single spaces; words run up to 80 characters
  fn words() -> impl Strategy<Value = String> {
    proptest::collection::vec("[a-zA-Z0-9./:_=-]{1,80}", 1..8).prop_map(|w| w.join(" "))
  }

  fn check_case() -> impl Strategy<Value = CheckCase> {
    (
      prop_oneof![Just(Status::Success), Just(Status::Warning), Just(Status::Failure)],
      proptest::collection::btree_set("[a-z]{1,6}", 1..4),
      proptest::collection::vec((words(), proptest::option::of(words())), 1..3),
    )
      .prop_map(|(status, tags, issues)| CheckCase { status, tags, issues })
  }

  fn build(cases: &BTreeMap<String, CheckCase>, settings: ReportSettings) -> Report {
    let r = Report::new(settings).with_host("node-1");
    let mut next = 0;
    for (name, case) in cases {
      if case.status == Status::Success {
        r.record_success(name, &case.tags);
        continue;
      }
      for (reason, fix) in &case.issues {
        let code = format!("C{:07X}", next);
        next += 1;
        if case.status == Status::Failure {
          r.record_failure(name, reason, &code, &case.tags, fix.as_deref());
        } else {
          r.record_warning(name, reason, &code, &case.tags, fix.as_deref());
        }
      }
    }
    r
  }

  proptest! {
    #[test]
    fn table_roundtrip_keeps_outcomes(
      cases in proptest::collection::btree_map("[A-Z][A-Z0-9]{1,7}", check_case(), 1..6),
      wrap in any::<bool>(),
    ) {
      let s = ReportSettings { wrap, ..settings() };
      let r = build(&cases, s);
      let back = Report::parse_table(&r.render_table(), s);

      prop_assert_eq!(back.failure_names(), r.failure_names());
      prop_assert_eq!(back.warning_names(), r.warning_names());
      prop_assert_eq!(back.success_names(), r.success_names());
      prop_assert_eq!(back.codes(), r.codes());
      for name in cases.keys() {
        prop_assert_eq!(back.tags_for(name), r.tags_for(name));
      }
      for code in r.codes() {
        prop_assert_eq!(back.issue(&code), r.issue(&code));
        prop_assert_eq!(back.fix_for(&code), r.fix_for(&code));
      }
    }
  }
}
