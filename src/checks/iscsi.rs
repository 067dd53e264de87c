//! open-iscsi initiator checks

use super::trait_def::{Check, CheckScope, tag_set};
use crate::utils::{self, OsRelease};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

pub const ISCSIADM_CODE: &str = "EFBB085C";
pub const ISCSID_CODE: &str = "EB22737E";
pub const ISCSID_CONF_CODE: &str = "C6F2B356";

const ISCSID_CONF: &str = "/etc/iscsi/iscsid.conf";

/// A timeout key that must be present exactly once with value 2
struct NoopKey {
  key: &'static str,
  wrong_value: &'static str,
  duplicate: &'static str,
  missing: &'static str,
}

const NOOP_KEYS: [NoopKey; 2] = [
  NoopKey {
    key: "node.session.timeo.noop_out_timeout",
    wrong_value: "F6A49337",
    duplicate: "D3E55910",
    missing: "E29BF18A",
  },
  NoopKey {
    key: "node.session.timeo.noop_out_interval",
    wrong_value: "E48C1907",
    duplicate: "CA9AA865",
    missing: "A2EED511",
  },
];

/// Check iscsid.conf content for the noop timeout settings.
///
/// The first occurrence of each key decides its value. Every later
/// occurrence is flagged: one warning per key lists all duplicate lines
/// (1-based), since the duplicate code can only map to one reason.
pub fn scan_iscsid_conf(text: &str, scope: &CheckScope) {
  for noop in &NOOP_KEYS {
    let mut seen = false;
    let mut duplicates = Vec::new();
    for (index, raw) in text.lines().enumerate() {
      let line = raw.trim();
      if line.starts_with('#') {
        continue;
      }
      let Some((key, value)) = line.split_once('=') else {
        continue;
      };
      if key.trim() != noop.key {
        continue;
      }

      if seen {
        duplicates.push((index + 1).to_string());
        continue;
      }
      seen = true;
      if value.trim() != "2" {
        scope.fail_with_fix(
          format!("{} is not set to '2' in iscsid.conf", noop.key),
          noop.wrong_value,
          format!("Set '{} = 2' in {}", noop.key, ISCSID_CONF),
        );
      }
    }

    if !duplicates.is_empty() {
      let label = if duplicates.len() == 1 { "line" } else { "lines" };
      scope.warn(
        format!("{} duplicate found in iscsid.conf, {} {}", noop.key, label, duplicates.join(", ")),
        noop.duplicate,
      );
    }

    if !seen {
      scope.fail_with_fix(
        format!("'{} = 2' is not present in iscsid.conf", noop.key),
        noop.missing,
        format!("Add '{} = 2' to {}", noop.key, ISCSID_CONF),
      );
    }
  }
}

pub struct IscsiCheck;

impl Check for IscsiCheck {
  fn name(&self) -> &str {
    "ISCSI"
  }

  fn tags(&self) -> BTreeSet<String> {
    tag_set(&["basic", "iscsi", "local"])
  }

  fn description(&self) -> &str {
    "open-iscsi installed, iscsid running, noop timeouts set to 2"
  }

  fn run(&self, scope: &CheckScope) -> anyhow::Result<()> {
    if utils::which("iscsiadm").is_none() {
      let fix = match OsRelease::load() {
        Some(release) if release.uses_apt() => "apt-get install open-iscsi",
        _ => "yum install iscsi-initiator-utils",
      };
      scope.fail_with_fix(
        "iscsiadm is not available, has open-iscsi been installed?",
        ISCSIADM_CODE,
        fix,
      );
    }

    if !utils::succeeds("pgrep", &["-x", "iscsid"]) {
      scope.fail_with_fix(
        "iscsid is not running. Is the iscsid service running?",
        ISCSID_CODE,
        "service iscsi start || systemctl start iscsid.service",
      );
    }

    let path = Path::new(ISCSID_CONF);
    if !path.exists() {
      scope.fail("iscsid configuration file does not exist", ISCSID_CONF_CODE);
      return Ok(());
    }
    let text = fs::read_to_string(path)?;
    scan_iscsid_conf(&text, scope);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::config::TargetConfig;
  use crate::report::{Report, ReportSettings, Status};
  use std::sync::Arc;

  fn scan(text: &str) -> Arc<Report> {
    let report = Arc::new(Report::new(ReportSettings::default()));
    let scope = CheckScope::new("ISCSI", IscsiCheck.tags(), Arc::new(TargetConfig::default()), Arc::clone(&report));
    scan_iscsid_conf(text, &scope);
    report
  }

  #[test]
  fn test_correct_config_is_clean() {
    let report = scan(
      "# defaults\nnode.session.timeo.noop_out_timeout = 2\nnode.session.timeo.noop_out_interval = 2\n",
    );
    assert!(report.is_empty());
  }

  #[test]
  fn test_wrong_values_and_missing_key() {
    let report = scan("node.session.timeo.noop_out_timeout = 5\n");
    assert_eq!(report.status("ISCSI"), Some(Status::Failure));
    let codes = report.codes();
    assert!(codes.contains(&"F6A49337".to_string()));
    assert!(codes.contains(&"A2EED511".to_string()));
    // "12" contains a 2 but is not 2
    let report = scan("node.session.timeo.noop_out_timeout = 12\nnode.session.timeo.noop_out_interval = 2\n");
    assert_eq!(report.codes(), vec!["F6A49337".to_string()]);
  }

  #[test]
  fn test_every_duplicate_is_flagged_with_its_line() {
    let text = "\
node.session.timeo.noop_out_timeout = 2
node.session.timeo.noop_out_interval = 2
# node.session.timeo.noop_out_timeout = 9
node.session.timeo.noop_out_timeout = 2
node.session.timeo.noop_out_timeout = 3
";
    let report = scan(text);
    assert_eq!(report.status("ISCSI"), Some(Status::Warning));
    assert_eq!(report.codes(), vec!["D3E55910".to_string()]);
    assert_eq!(
      report.issue("D3E55910").unwrap().reason,
      "node.session.timeo.noop_out_timeout duplicate found in iscsid.conf, lines 4, 5"
    );

    let report = scan(&format!("{text}node.session.timeo.noop_out_interval = 2\n"));
    assert_eq!(
      report.issue("CA9AA865").unwrap().reason,
      "node.session.timeo.noop_out_interval duplicate found in iscsid.conf, line 6"
    );
  }
}
