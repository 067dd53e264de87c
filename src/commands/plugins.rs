//! List the plugins compiled into this build

use crate::checks::PluginCatalog;
use crate::core::error::HostcheckResult;
use crate::report::table::grid;

/// Print name, description and contributed checks of every plugin
pub fn run_plugins() -> HostcheckResult<()> {
  println!("{}", render_plugins(&PluginCatalog::discover()));
  Ok(())
}

fn render_plugins(catalog: &PluginCatalog) -> String {
  let rows: Vec<_> = catalog
    .iter()
    .map(|plugin| {
      let checks = plugin.load_checks().iter().map(|c| c.name().to_string()).collect();
      vec![vec![plugin.name().to_string()], vec![plugin.description().to_string()], checks]
    })
    .collect();
  grid(&["Plugin", "Description", "Checks"], &rows)
}
