//! CPU frequency governor availability

use super::trait_def::{Check, CheckScope, tag_set};
use crate::utils::{self, OsRelease};
use std::collections::BTreeSet;

pub struct CpufreqCheck;

/// Whether `cpupower frequency-info --governors` output offers "performance"
fn offers_performance(governors: &str) -> bool {
  governors.split_whitespace().any(|g| g == "performance")
}

impl Check for CpufreqCheck {
  fn name(&self) -> &str {
    "CPUFREQ"
  }

  fn tags(&self) -> BTreeSet<String> {
    tag_set(&["basic", "cpufreq", "local"])
  }

  fn description(&self) -> &str {
    "cpupower installed and the performance governor available"
  }

  fn run(&self, scope: &CheckScope) -> anyhow::Result<()> {
    if utils::which("cpupower").is_none() {
      let fix = match OsRelease::load() {
        Some(release) if release.uses_apt() => {
          let kernel = utils::run("uname", &["-r"])?;
          format!("apt-get install linux-tools-{}", kernel.trim())
        }
        // RHEL ships cpupower in kernel-tools
        _ => "yum install kernel-tools".to_string(),
      };
      scope.fail_with_fix("cpupower is not installed", "20CEE732", fix);
      return Ok(());
    }

    let governors = utils::run("cpupower", &["frequency-info", "--governors"]).unwrap_or_default();
    if !offers_performance(&governors) {
      scope.fail_with_fix(
        "No 'performance' governor found for system",
        "333FBD45",
        "No-fix -- if this system is a VM governors might not be available and this check can be ignored",
      );
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_governor_list() {
    assert!(offers_performance("analyzing CPU 0:\n  available cpufreq governors: performance powersave\n"));
    assert!(!offers_performance("available cpufreq governors: Not Available\n"));
    assert!(!offers_performance("performance-ish"));
  }
}
