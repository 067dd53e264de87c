//! Kernel network tunables expected on storage initiators

use super::trait_def::{Check, CheckScope, tag_set};
use crate::utils;
use std::collections::BTreeSet;

/// One expected tunable and the code reported when it differs
#[derive(Debug, Clone, Copy)]
pub struct SysctlSetting {
  pub key: &'static str,
  pub value: &'static str,
  pub code: &'static str,
}

const fn setting(key: &'static str, value: &'static str, code: &'static str) -> SysctlSetting {
  SysctlSetting { key, value, code }
}

/// Sorted by key. Multi-value entries use single spaces.
pub const SYSCTL_SETTINGS: &[SysctlSetting] = &[
  setting("net.core.netdev_max_backlog", "250000", "7656C46C"),
  setting("net.core.optmem_max", "8388608", "8FA26A66"),
  setting("net.core.rmem_default", "8388608", "FBCA17D5"),
  setting("net.core.rmem_max", "16777216", "4C4B3F0B"),
  setting("net.core.somaxconn", "1024", "34A7B822"),
  setting("net.core.wmem_default", "8388608", "68191DE5"),
  setting("net.core.wmem_max", "16777216", "7F8479C2"),
  setting("net.ipv4.tcp_adv_win_scale", "1", "1F523B04"),
  setting("net.ipv4.tcp_fin_timeout", "15", "59FD5DF7"),
  setting("net.ipv4.tcp_low_latency", "1", "6BE2899E"),
  setting("net.ipv4.tcp_max_syn_backlog", "8192", "2862CB28"),
  setting("net.ipv4.tcp_rmem", "4096 87380 16777216", "2A6057BD"),
  setting("net.ipv4.tcp_sack", "1", "7A9AB850"),
  setting("net.ipv4.tcp_synack_retries", "2", "55EF997B"),
  setting("net.ipv4.tcp_syncookies", "1", "01C594E7"),
  setting("net.ipv4.tcp_timestamps", "0", "F0D7A1AD"),
  setting("net.ipv4.tcp_tw_reuse", "1", "989229FC"),
  setting("net.ipv4.tcp_window_scaling", "1", "A8A6F381"),
  setting("net.ipv4.tcp_wmem", "4096 65536 16777216", "CD37F436"),
];

pub struct SysctlCheck;

impl SysctlCheck {
  fn evaluate<F>(read: F, scope: &CheckScope)
  where
    F: Fn(&str) -> anyhow::Result<String>,
  {
    for s in SYSCTL_SETTINGS {
      let fix = format!("sysctl -w {}=\"{}\"", s.key, s.value);
      match read(s.key) {
        Ok(current) if current == s.value => {}
        Ok(current) => scope.fail_with_fix(
          format!("{}={} is not set (currently {})", s.key, s.value, current),
          s.code,
          fix,
        ),
        Err(err) => scope.fail_with_fix(format!("{} could not be read: {:#}", s.key, err), s.code, fix),
      }
    }
  }
}

impl Check for SysctlCheck {
  fn name(&self) -> &str {
    "SYSCTL"
  }

  fn tags(&self) -> BTreeSet<String> {
    tag_set(&["basic", "sysctl", "misc", "local"])
  }

  fn description(&self) -> &str {
    "TCP and socket buffer tunables"
  }

  fn run(&self, scope: &CheckScope) -> anyhow::Result<()> {
    Self::evaluate(utils::sysctl_value, scope);
    Ok(())
  }
}
