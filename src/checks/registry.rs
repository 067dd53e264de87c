//! Ordered set of registered checks with tag-based selection

use super::plugins::PluginCatalog;
use super::trait_def::{Check, CheckScope, FnCheck};
use crate::core::error::{HostcheckResult, PluginError};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Check registry
///
/// Registration order is kept for listing and scheduling. Names may repeat.
#[derive(Default, Clone)]
pub struct CheckRegistry {
  checks: Vec<Arc<dyn Check>>,
}

impl CheckRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a closure as a check
  pub fn register<F>(&mut self, name: impl Into<String>, tags: BTreeSet<String>, body: F)
  where
    F: Fn(&CheckScope) -> anyhow::Result<()> + Send + Sync + 'static,
  {
    self.add_check(Arc::new(FnCheck::new(name, tags, body)));
  }

  /// Add a check to the registry
  pub fn add_check(&mut self, check: Arc<dyn Check>) {
    self.checks.push(check);
  }

  pub fn extend(&mut self, checks: impl IntoIterator<Item = Arc<dyn Check>>) {
    self.checks.extend(checks);
  }

  /// Append the checks of each named plugin
  pub fn load_plugins(&mut self, catalog: &PluginCatalog, names: &[String]) -> HostcheckResult<()> {
    for name in names {
      let plugin = catalog.get(name).ok_or_else(|| PluginError::Unknown {
        name: name.clone(),
        available: catalog.names(),
      })?;
      let checks = plugin.load_checks();
      tracing::debug!(plugin = %name, count = checks.len(), "loaded plugin checks");
      self.extend(checks);
    }
    Ok(())
  }

  /// Get all registered checks
  pub fn checks(&self) -> &[Arc<dyn Check>] {
    &self.checks
  }

  /// Checks matching the tag filters, in registration order.
  ///
  /// A non-empty `include` requires at least one shared tag; any tag in
  /// `exclude` removes the check, even if it is also included.
  pub fn select(&self, include: &BTreeSet<String>, exclude: &BTreeSet<String>) -> Vec<Arc<dyn Check>> {
    self
      .checks
      .iter()
      .filter(|check| {
        let tags = check.tags();
        let included = include.is_empty() || !tags.is_disjoint(include);
        let excluded = !exclude.is_empty() && !tags.is_disjoint(exclude);
        included && !excluded
      })
      .cloned()
      .collect()
  }

  /// Union of the tags of every registered check
  pub fn tags(&self) -> BTreeSet<String> {
    self.checks.iter().flat_map(|c| c.tags()).collect()
  }
}

/// Create a registry with all built-in checks
pub fn create_default_registry() -> CheckRegistry {
  let mut registry = CheckRegistry::new();

  registry.add_check(Arc::new(super::os::OsCheck));
  registry.add_check(Arc::new(super::sysctl::SysctlCheck));
  registry.add_check(Arc::new(super::iscsi::IscsiCheck));
  registry.add_check(Arc::new(super::udev::UdevCheck));
  registry.add_check(Arc::new(super::arp::ArpCheck));
  registry.add_check(Arc::new(super::irq::IrqCheck));
  registry.add_check(Arc::new(super::cpufreq::CpufreqCheck));
  registry.add_check(Arc::new(super::block_devices::BlockDevicesCheck));
  registry.add_check(Arc::new(super::multipath::MultipathCheck));
  registry.add_check(Arc::new(super::multipath::MultipathConfCheck));
  registry.add_check(Arc::new(super::network::ReachabilityCheck::mgmt()));
  registry.add_check(Arc::new(super::network::ReachabilityCheck::vip1()));
  registry.add_check(Arc::new(super::network::ReachabilityCheck::vip2()));

  registry
}
