//! ARP behaviour for multi-homed initiators

use super::trait_def::{Check, CheckScope, tag_set};
use crate::utils;
use std::collections::BTreeSet;

pub const ARP_ANNOUNCE_CODE: &str = "9000C3B6";
pub const ARP_IGNORE_CODE: &str = "BDB4D5D8";
pub const GC_INTERVAL_CODE: &str = "A06CD19F";
pub const GC_INTERVAL_PATH: &str = "/proc/sys/net/ipv4/route/gc_interval";

pub struct ArpCheck;

impl ArpCheck {
  fn evaluate<F>(read: F, scope: &CheckScope) -> anyhow::Result<()>
  where
    F: Fn(&str) -> anyhow::Result<String>,
  {
    if read("net.ipv4.conf.all.arp_announce")? != "2" {
      scope.fail_with_fix(
        "net.ipv4.conf.all.arp_announce != 2 in sysctl",
        ARP_ANNOUNCE_CODE,
        "sysctl net.ipv4.conf.all.arp_announce=2",
      );
    }
    if read("net.ipv4.conf.all.arp_ignore")? != "1" {
      scope.fail_with_fix(
        "net.ipv4.conf.all.arp_ignore != 1 in sysctl",
        ARP_IGNORE_CODE,
        "sysctl net.ipv4.conf.all.arp_ignore=1",
      );
    }
    let gc = read("net.ipv4.route.gc_interval")?;
    if gc != "5" {
      scope.fail_with_fix(
        format!("{} is currently set to {}", GC_INTERVAL_PATH, gc),
        GC_INTERVAL_CODE,
        format!("echo 5 > {}", GC_INTERVAL_PATH),
      );
    }
    Ok(())
  }
}

impl Check for ArpCheck {
  fn name(&self) -> &str {
    "ARP"
  }

  fn tags(&self) -> BTreeSet<String> {
    tag_set(&["basic", "arp", "local"])
  }

  fn description(&self) -> &str {
    "arp_announce, arp_ignore and route gc_interval"
  }

  fn run(&self, scope: &CheckScope) -> anyhow::Result<()> {
    Self::evaluate(utils::sysctl_value, scope)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::config::TargetConfig;
  use crate::report::{Report, ReportSettings};
  use std::sync::Arc;

  fn scope(report: &Arc<Report>) -> CheckScope {
    CheckScope::new("ARP", ArpCheck.tags(), Arc::new(TargetConfig::default()), Arc::clone(report))
  }

  #[test]
  fn test_flags_each_setting() {
    let report = Arc::new(Report::new(ReportSettings::default()));
    ArpCheck::evaluate(
      |key| {
        Ok(match key {
          "net.ipv4.conf.all.arp_announce" => "2",
          "net.ipv4.conf.all.arp_ignore" => "0",
          _ => "30",
        }
        .to_string())
      },
      &scope(&report),
    )
    .unwrap();
    assert_eq!(report.codes(), vec![GC_INTERVAL_CODE.to_string(), ARP_IGNORE_CODE.to_string()]);
    assert_eq!(
      report.issue(GC_INTERVAL_CODE).unwrap().reason,
      "/proc/sys/net/ipv4/route/gc_interval is currently set to 30"
    );
  }

  #[test]
  fn test_unreadable_tunable_is_an_error() {
    let report = Arc::new(Report::new(ReportSettings::default()));
    let result = ArpCheck::evaluate(|_| anyhow::bail!("no /proc"), &scope(&report));
    assert!(result.is_err());
  }
}
