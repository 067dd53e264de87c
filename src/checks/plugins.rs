//! Plugin catalog
//!
//! A plugin bundles extra checks (and optionally the fixes for their codes)
//! that are not part of the default run. Plugins are compiled in and looked up
//! by name; requested plugins are appended to the registries before selection.

use super::mtu::{MtuCheck, mtu_fix};
use super::trait_def::Check;
use crate::fixes::Fix;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Named bundle of checks and fixes
pub trait Plugin: Send + Sync {
  fn name(&self) -> &str;

  fn description(&self) -> &str;

  fn load_checks(&self) -> Vec<Arc<dyn Check>>;

  fn load_fixes(&self) -> Vec<Fix> {
    Vec::new()
  }
}

/// Jumbo-frame verification for storage interfaces
pub struct MtuPlugin;

impl Plugin for MtuPlugin {
  fn name(&self) -> &str {
    "mtu"
  }

  fn description(&self) -> &str {
    "Verifies every non-loopback interface uses jumbo frames (MTU 9000)"
  }

  fn load_checks(&self) -> Vec<Arc<dyn Check>> {
    vec![Arc::new(MtuCheck::default())]
  }

  fn load_fixes(&self) -> Vec<Fix> {
    vec![mtu_fix()]
  }
}

/// Name → plugin
#[derive(Default, Clone)]
pub struct PluginCatalog {
  plugins: BTreeMap<String, Arc<dyn Plugin>>,
}

impl PluginCatalog {
  /// Every plugin available in this build
  pub fn discover() -> Self {
    let mut catalog = Self::default();
    catalog.insert(Arc::new(MtuPlugin));
    catalog
  }

  pub fn insert(&mut self, plugin: Arc<dyn Plugin>) {
    self.plugins.insert(plugin.name().to_string(), plugin);
  }

  pub fn get(&self, name: &str) -> Option<&Arc<dyn Plugin>> {
    self.plugins.get(name)
  }

  /// Plugin names, ascending
  pub fn names(&self) -> Vec<String> {
    self.plugins.keys().cloned().collect()
  }

  pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Plugin>> {
    self.plugins.values()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_discover_lists_mtu() {
    let catalog = PluginCatalog::discover();
    assert_eq!(catalog.names(), vec!["mtu".to_string()]);
    let mtu = catalog.get("mtu").unwrap();
    assert_eq!(mtu.load_checks().len(), 1);
    assert_eq!(mtu.load_fixes().len(), 1);
    assert!(catalog.get("cinder").is_none());
  }
}
