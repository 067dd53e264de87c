//! List the tags checks can be selected by

use std::collections::BTreeMap;
use std::env;
use std::path::Path;

use crate::checks::{CheckRegistry, PluginCatalog, create_default_registry};
use crate::core::config::HostcheckConfig;
use crate::core::error::HostcheckResult;
use crate::report::table::grid;

/// Print every tag with the checks that carry it
pub fn run_tags(config: Option<&Path>, plugins: Vec<String>) -> HostcheckResult<()> {
  let current_dir = env::current_dir()?;
  let config = HostcheckConfig::load(config, &current_dir)?;

  let mut names = config.run.plugins;
  for plugin in plugins {
    if !names.contains(&plugin) {
      names.push(plugin);
    }
  }
  let mut registry = create_default_registry();
  registry.load_plugins(&PluginCatalog::discover(), &names)?;

  println!("{}", render_tags(&registry));
  Ok(())
}

fn render_tags(registry: &CheckRegistry) -> String {
  let mut by_tag: BTreeMap<String, Vec<String>> = BTreeMap::new();
  for check in registry.checks() {
    for tag in check.tags() {
      by_tag.entry(tag).or_default().push(check.name().to_string());
    }
  }

  let rows: Vec<_> = by_tag
    .into_iter()
    .map(|(tag, mut checks)| {
      checks.sort();
      vec![vec![tag], checks]
    })
    .collect();
  grid(&["Tag", "Checks"], &rows)
}
