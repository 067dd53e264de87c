//! Host-state collection
//!
//! Sources: /proc/*, /etc/os-release and /sys/class/net. Values that cannot be
//! read are recorded as empty rather than failing the run.

use crate::report::Report;
use crate::utils::{self, OsRelease};
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::fs;
use std::path::Path;

/// Default sysfs directory listing network interfaces
pub const SYS_CLASS_NET: &str = "/sys/class/net";

/// One network interface as seen in sysfs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Interface {
  pub name: String,
  pub mtu: Option<u32>,
  /// operstate: up, down, unknown
  pub state: String,
  /// MAC address
  pub address: String,
}

impl Interface {
  pub fn is_loopback(&self) -> bool {
    self.name == "lo"
  }
}

fn read_trimmed(path: &Path) -> String {
  fs::read_to_string(path).map(|s| s.trim().to_string()).unwrap_or_default()
}

/// List interfaces under a sysfs `class/net` directory, sorted by name
pub fn read_interfaces(root: &Path) -> Vec<Interface> {
  let Ok(entries) = fs::read_dir(root) else {
    tracing::debug!(path = %root.display(), "no network interfaces directory");
    return Vec::new();
  };

  let mut interfaces: Vec<Interface> = entries
    .filter_map(Result::ok)
    .map(|entry| {
      let dir = entry.path();
      Interface {
        name: entry.file_name().to_string_lossy().into_owned(),
        mtu: read_trimmed(&dir.join("mtu")).parse().ok(),
        state: read_trimmed(&dir.join("operstate")),
        address: read_trimmed(&dir.join("address")),
      }
    })
    .collect();
  interfaces.sort_by(|a, b| a.name.cmp(&b.name));
  interfaces
}

fn cpu_count() -> usize {
  fs::read_to_string("/proc/cpuinfo")
    .unwrap_or_default()
    .lines()
    .filter(|l| l.starts_with("processor"))
    .count()
}

fn memory_total_kb() -> u64 {
  fs::read_to_string("/proc/meminfo")
    .unwrap_or_default()
    .lines()
    .find(|l| l.starts_with("MemTotal:"))
    .and_then(|l| l.split_whitespace().nth(1))
    .and_then(|v| v.parse().ok())
    .unwrap_or(0)
}

/// Nested mapping `name → {mtu, state, address}`
pub fn interfaces_value(interfaces: &[Interface]) -> Value {
  let mut map = Map::new();
  for iface in interfaces {
    map.insert(
      iface.name.clone(),
      json!({
        "mtu": iface.mtu,
        "state": iface.state,
        "address": iface.address,
      }),
    );
  }
  Value::Object(map)
}

/// Record the host's identity and network layout on the report
pub fn collect(report: &Report) {
  let release = OsRelease::load().unwrap_or_default();

  report.record_host_state("hostname", json!(utils::hostname()));
  report.record_host_state("kernel", json!(read_trimmed(Path::new("/proc/sys/kernel/osrelease"))));
  report.record_host_state("os", json!(release.pretty_name));
  report.record_host_state("cpus", json!(cpu_count()));
  report.record_host_state("memory_total_kb", json!(memory_total_kb()));
  report.record_host_state("interfaces", interfaces_value(&read_interfaces(Path::new(SYS_CLASS_NET))));
  tracing::debug!("host state collected");
}
