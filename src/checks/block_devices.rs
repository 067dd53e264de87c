//! Block device scheduler configured on the kernel command line

use super::trait_def::{Check, CheckScope, tag_set};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

const GRUB_DEFAULTS: &str = "/etc/default/grub";

pub struct BlockDevicesCheck;

/// Validate /etc/default/grub content.
///
/// At least one of the two command-line variables must be present, and the
/// noop elevator must appear in one of them.
pub fn scan_grub(text: &str, scope: &CheckScope) {
  let find = |prefix: &str| text.lines().find(|l| l.starts_with(prefix));
  let default_line = find("GRUB_CMDLINE_LINUX_DEFAULT=");
  let linux_line = find("GRUB_CMDLINE_LINUX=");

  if default_line.is_none() && linux_line.is_none() {
    scope.fail(
      "GRUB_CMDLINE_LINUX_DEFAULT and GRUB_CMDLINE_LINUX are missing from GRUB file",
      "A65B6D97",
    );
    return;
  }

  let has_noop = [default_line, linux_line]
    .into_iter()
    .flatten()
    .any(|line| line.contains("elevator=noop"));
  if !has_noop {
    scope.fail_with_fix(
      "Scheduler is not set to noop",
      "47BB5083",
      "Add 'elevator=noop' to /etc/default/grub in the 'GRUB_CMDLINE_LINUX_DEFAULT' line",
    );
  }
}

impl Check for BlockDevicesCheck {
  fn name(&self) -> &str {
    "Block Devices"
  }

  fn tags(&self) -> BTreeSet<String> {
    tag_set(&["basic", "block_device", "local"])
  }

  fn description(&self) -> &str {
    "noop elevator on the kernel command line"
  }

  fn run(&self, scope: &CheckScope) -> anyhow::Result<()> {
    let path = Path::new(GRUB_DEFAULTS);
    if !path.exists() {
      scope.fail(format!("Could not find default grub file at {}", GRUB_DEFAULTS), "6F7B6A25");
      return Ok(());
    }
    scan_grub(&fs::read_to_string(path)?, scope);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::config::TargetConfig;
  use crate::report::{Report, ReportSettings};
  use std::sync::Arc;

  fn scan(text: &str) -> Vec<String> {
    let report = Arc::new(Report::new(ReportSettings::default()));
    let scope = CheckScope::new(
      "Block Devices",
      BlockDevicesCheck.tags(),
      Arc::new(TargetConfig::default()),
      Arc::clone(&report),
    );
    scan_grub(text, &scope);
    report.codes()
  }

  #[test]
  fn test_noop_in_either_line_passes() {
    assert!(scan("GRUB_CMDLINE_LINUX_DEFAULT=\"quiet elevator=noop\"\nGRUB_CMDLINE_LINUX=\"\"\n").is_empty());
    assert!(scan("GRUB_CMDLINE_LINUX=\"elevator=noop\"\n").is_empty());
  }

  #[test]
  fn test_missing_noop() {
    assert_eq!(scan("GRUB_CMDLINE_LINUX_DEFAULT=\"quiet splash\"\n"), vec!["47BB5083".to_string()]);
  }

  #[test]
  fn test_missing_cmdline_lines() {
    assert_eq!(scan("GRUB_TIMEOUT=5\n"), vec!["A65B6D97".to_string()]);
  }
}
