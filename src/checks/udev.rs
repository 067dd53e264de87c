//! udev rules that give iSCSI LUNs stable names

use super::trait_def::{Check, CheckScope, tag_set};
use std::collections::BTreeSet;
use std::path::Path;

const UDEV_RULES: &str = "/etc/udev/rules.d/99-iscsi-luns.rules";
const SERIAL_HELPER: &str = "/sbin/fetch_device_serial_no.sh";

pub struct UdevCheck;

impl UdevCheck {
  fn evaluate<F>(exists: F, scope: &CheckScope)
  where
    F: Fn(&Path) -> bool,
  {
    if !exists(Path::new(UDEV_RULES)) {
      scope.fail_with_fix(
        "iSCSI LUN udev rules are not installed",
        "1C8F2E07",
        format!("Install 99-iscsi-luns.rules from the deployment guide to {}", UDEV_RULES),
      );
    }
    if !exists(Path::new(SERIAL_HELPER)) {
      scope.fail_with_fix(
        "fetch_device_serial_no.sh is missing from /sbin",
        "6D03F50B",
        format!("Install fetch_device_serial_no.sh from the deployment guide to {}", SERIAL_HELPER),
      );
    }
  }
}

impl Check for UdevCheck {
  fn name(&self) -> &str {
    "UDEV"
  }

  fn tags(&self) -> BTreeSet<String> {
    tag_set(&["basic", "udev", "local"])
  }

  fn description(&self) -> &str {
    "udev rules and serial-number helper for iSCSI LUNs"
  }

  fn run(&self, scope: &CheckScope) -> anyhow::Result<()> {
    Self::evaluate(Path::exists, scope);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::config::TargetConfig;
  use crate::report::{Report, ReportSettings};
  use std::sync::Arc;

  #[test]
  fn test_reports_each_missing_file() {
    let report = Arc::new(Report::new(ReportSettings::default()));
    let scope = CheckScope::new("UDEV", UdevCheck.tags(), Arc::new(TargetConfig::default()), Arc::clone(&report));
    UdevCheck::evaluate(|p| p == Path::new(UDEV_RULES), &scope);
    assert_eq!(report.codes(), vec!["6D03F50B".to_string()]);
    assert!(report.fix_for("6D03F50B").unwrap().contains(SERIAL_HELPER));
  }
}
