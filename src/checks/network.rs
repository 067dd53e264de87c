//! Reachability of the storage cluster's management and access addresses

use super::trait_def::{Check, CheckScope, tag_set};
use crate::core::config::TargetConfig;
use crate::utils;
use std::collections::BTreeSet;
use std::thread;
use std::time::Duration;

const NET_FIX: &str = "Check the network connection. If this failure is intermittent check for duplicate ips. \
                       This can also be due to MTU fragmentation";

/// Neighbour-table polls before an address is declared unreachable
pub const NEIGH_RETRIES: u32 = 5;
const NEIGH_INTERVAL: Duration = Duration::from_secs(1);

/// Which configured address a check probes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
  Mgmt,
  Vip1,
  Vip2,
}

impl Endpoint {
  fn field(self) -> &'static str {
    match self {
      Endpoint::Mgmt => "mgmt_ip",
      Endpoint::Vip1 => "vip1_ip",
      Endpoint::Vip2 => "vip2_ip",
    }
  }

  fn label(self) -> &'static str {
    match self {
      Endpoint::Mgmt => "management",
      Endpoint::Vip1 => "vip1",
      Endpoint::Vip2 => "vip2",
    }
  }

  fn address(self, config: &TargetConfig) -> Option<&str> {
    match self {
      Endpoint::Mgmt => config.mgmt_ip.as_deref(),
      Endpoint::Vip1 => config.vip1_ip.as_deref(),
      Endpoint::Vip2 => config.vip2_ip.as_deref(),
    }
  }
}

/// Ping an address, then wait for its neighbour entry to become REACHABLE
pub struct ReachabilityCheck {
  name: &'static str,
  endpoint: Endpoint,
  /// Code when the address is not configured
  missing_code: &'static str,
  ping_code: &'static str,
  neigh_code: &'static str,
}

impl ReachabilityCheck {
  pub fn mgmt() -> Self {
    Self {
      name: "MGMT",
      endpoint: Endpoint::Mgmt,
      missing_code: "5B0E7A44",
      ping_code: "65FC68BB",
      neigh_code: "BF6A912A",
    }
  }

  pub fn vip1() -> Self {
    Self {
      name: "VIP1",
      endpoint: Endpoint::Vip1,
      missing_code: "2E94C6D0",
      ping_code: "1827147B",
      neigh_code: "3C33D70D",
    }
  }

  /// vip2 is optional; its absence is only a warning
  pub fn vip2() -> Self {
    Self {
      name: "VIP2",
      endpoint: Endpoint::Vip2,
      missing_code: "16EB208B",
      ping_code: "3D76CE5A",
      neigh_code: "4F6B8D91",
    }
  }

  fn evaluate<P, N>(&self, scope: &CheckScope, ping: P, mut neigh_reachable: N, interval: Duration)
  where
    P: Fn(&str) -> bool,
    N: FnMut(&str) -> bool,
  {
    let Some(address) = self.endpoint.address(scope.config()) else {
      let reason = format!("No {} found", self.endpoint.field());
      let fix = format!("Set target.{} in hostcheck.toml", self.endpoint.field());
      if self.endpoint == Endpoint::Vip2 {
        scope.warn_with_fix(reason, self.missing_code, fix);
      } else {
        scope.fail_with_fix(reason, self.missing_code, fix);
      }
      return;
    };

    if !ping(address) {
      scope.fail_with_fix(
        format!("Could not ping {} ip {}", self.endpoint.label(), address),
        self.ping_code,
        NET_FIX,
      );
    }

    if !poll(|| neigh_reachable(address), NEIGH_RETRIES, interval) {
      let reason = format!("Arp state for {} [{}] is not 'REACHABLE'", self.endpoint.label(), address);
      if self.endpoint == Endpoint::Mgmt {
        scope.fail_with_fix(reason, self.neigh_code, format!("Check the connection to {}", address));
      } else {
        scope.fail(reason, self.neigh_code);
      }
    }
  }
}

/// Try `probe` once plus up to `retries` more times, sleeping in between
fn poll<F>(mut probe: F, retries: u32, interval: Duration) -> bool
where
  F: FnMut() -> bool,
{
  for attempt in 0..=retries {
    if probe() {
      return true;
    }
    if attempt < retries {
      thread::sleep(interval);
    }
  }
  false
}

fn ping(address: &str) -> bool {
  utils::succeeds("ping", &["-c", "2", "-W", "1", address])
}

fn neigh_reachable(address: &str) -> bool {
  utils::run("ip", &["neigh", "show", address])
    .map(|out| out.contains("REACHABLE"))
    .unwrap_or(false)
}

impl Check for ReachabilityCheck {
  fn name(&self) -> &str {
    self.name
  }

  fn tags(&self) -> BTreeSet<String> {
    tag_set(&["basic", "connection", "local"])
  }

  fn description(&self) -> &str {
    match self.endpoint {
      Endpoint::Mgmt => "Management address answers ping and ARP",
      Endpoint::Vip1 => "First access VIP answers ping and ARP",
      Endpoint::Vip2 => "Second access VIP answers ping and ARP",
    }
  }

  fn run(&self, scope: &CheckScope) -> anyhow::Result<()> {
    self.evaluate(scope, ping, neigh_reachable, NEIGH_INTERVAL);
    Ok(())
  }
}
