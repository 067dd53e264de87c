//! Jumbo-frame check shipped as the `mtu` plugin

use super::trait_def::{Check, CheckScope, tag_set};
use crate::fixes::Fix;
use crate::host::{self, Interface, SYS_CLASS_NET};
use crate::utils;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

pub const JUMBO_MTU: u32 = 9000;
pub const MTU_CODE: &str = "8E3B51C2";

/// Non-loopback interfaces whose MTU is not the jumbo size
pub fn undersized(interfaces: &[Interface]) -> Vec<&Interface> {
  interfaces
    .iter()
    .filter(|i| !i.is_loopback() && i.mtu != Some(JUMBO_MTU))
    .collect()
}

pub struct MtuCheck {
  sys_class_net: PathBuf,
}

impl Default for MtuCheck {
  fn default() -> Self {
    Self {
      sys_class_net: PathBuf::from(SYS_CLASS_NET),
    }
  }
}

impl MtuCheck {
  pub fn with_root(root: impl Into<PathBuf>) -> Self {
    Self {
      sys_class_net: root.into(),
    }
  }
}

impl Check for MtuCheck {
  fn name(&self) -> &str {
    "MTU"
  }

  fn tags(&self) -> BTreeSet<String> {
    tag_set(&["mtu", "connection", "local"])
  }

  fn description(&self) -> &str {
    "Every non-loopback interface uses MTU 9000"
  }

  fn run(&self, scope: &CheckScope) -> anyhow::Result<()> {
    let interfaces = host::read_interfaces(&self.sys_class_net);
    let bad = undersized(&interfaces);
    if bad.is_empty() {
      return Ok(());
    }
    let list: Vec<String> = bad
      .iter()
      .map(|i| match i.mtu {
        Some(mtu) => format!("{} ({})", i.name, mtu),
        None => format!("{} (unknown)", i.name),
      })
      .collect();
    scope.warn_with_fix(
      format!("Interfaces not using jumbo frames: {}", list.join(", ")),
      MTU_CODE,
      format!("ip link set dev <iface> mtu {} on each listed interface", JUMBO_MTU),
    );
    Ok(())
  }
}

/// Raise every undersized interface to the jumbo MTU
pub fn mtu_fix() -> Fix {
  Fix::new(
    "mtu_jumbo_frames",
    &[MTU_CODE],
    format!("Set MTU {} on every non-loopback interface", JUMBO_MTU),
    |_| {
      let interfaces = host::read_interfaces(Path::new(SYS_CLASS_NET));
      let mtu = JUMBO_MTU.to_string();
      for iface in undersized(&interfaces) {
        utils::run("ip", &["link", "set", "dev", &iface.name, "mtu", &mtu])?;
      }
      Ok(())
    },
  )
}
