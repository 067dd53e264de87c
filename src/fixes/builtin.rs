//! Built-in fixes for the codes the local checks emit

use super::{Fix, FixRegistry};
use crate::checks::arp::{ARP_ANNOUNCE_CODE, ARP_IGNORE_CODE, GC_INTERVAL_CODE, GC_INTERVAL_PATH};
use crate::checks::irq::IRQBALANCE_CODE;
use crate::checks::iscsi::ISCSID_CODE;
use crate::checks::multipath::MULTIPATHD_CODE;
use crate::checks::sysctl::SYSCTL_SETTINGS;
use crate::utils;
use std::fs;

fn sysctl_write(key: &str, value: &str) -> anyhow::Result<()> {
  utils::run("sysctl", &["-w", &format!("{}={}", key, value)])?;
  Ok(())
}

/// Add every built-in fix to `registry`
pub fn register_all(registry: &mut FixRegistry) {
  for setting in SYSCTL_SETTINGS {
    let (key, value) = (setting.key, setting.value);
    registry.register(Fix::new(
      format!("sysctl:{}", key),
      &[setting.code],
      format!("sysctl -w {}=\"{}\"", key, value),
      move |_| sysctl_write(key, value),
    ));
  }

  registry.register(Fix::new(
    "arp_announce",
    &[ARP_ANNOUNCE_CODE],
    "sysctl -w net.ipv4.conf.all.arp_announce=2",
    |_| sysctl_write("net.ipv4.conf.all.arp_announce", "2"),
  ));
  registry.register(Fix::new(
    "arp_ignore",
    &[ARP_IGNORE_CODE],
    "sysctl -w net.ipv4.conf.all.arp_ignore=1",
    |_| sysctl_write("net.ipv4.conf.all.arp_ignore", "1"),
  ));
  registry.register(Fix::new(
    "route_gc_interval",
    &[GC_INTERVAL_CODE],
    format!("echo 5 > {}", GC_INTERVAL_PATH),
    |_| {
      fs::write(GC_INTERVAL_PATH, "5\n")?;
      Ok(())
    },
  ));

  registry.register(Fix::new(
    "irqbalance_stop",
    &[IRQBALANCE_CODE],
    "Stop and disable the irqbalance service",
    |_| {
      utils::service("stop", "irqbalance")?;
      if utils::which("systemctl").is_some() {
        utils::run("systemctl", &["disable", "irqbalance"])?;
      }
      Ok(())
    },
  ));
  registry.register(Fix::new(
    "multipathd_start",
    &[MULTIPATHD_CODE],
    "Start the multipathd service",
    |_| utils::service("start", "multipathd"),
  ));
  registry.register(Fix::new(
    "iscsid_start",
    &[ISCSID_CODE],
    "Start the iscsid service",
    |_| utils::service("start", "iscsid"),
  ));
}
