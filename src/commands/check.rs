//! Run the selected checks and print the report
//!
//! Exits with the validation code when any failure was recorded.

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use crate::checks::{Engine, EngineOptions, PluginCatalog, create_default_registry};
use crate::core::config::HostcheckConfig;
use crate::core::error::{ExitCode, HostcheckResult, ResultExt};
use crate::host;
use crate::report::{Report, ReportSettings};

/// Flags of `hostcheck check`
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
  pub config: Option<PathBuf>,
  /// Run only checks carrying one of these tags
  pub tags: Vec<String>,
  /// Skip checks carrying any of these tags
  pub not_tags: Vec<String>,
  /// Skip every check tagged `local`
  pub no_local: bool,
  pub plugins: Vec<String>,
  pub disable_warnings: bool,
  pub no_wrap: bool,
  pub color: bool,
  pub json: bool,
  pub output: Option<PathBuf>,
  pub quiet: bool,
  pub host_state: bool,
  pub timeout: Option<u64>,
  pub jobs: Option<usize>,
}

/// Run the check command
pub fn run_check(opts: CheckOptions) -> HostcheckResult<()> {
  let current_dir = env::current_dir()?;
  let mut config = HostcheckConfig::load(opts.config.as_deref(), &current_dir)?;

  // CLI flags win over the config file
  if opts.disable_warnings {
    config.run.warnings = false;
  }
  if opts.no_wrap {
    config.run.wrap = false;
  }
  if opts.color {
    config.run.color = true;
  }
  if opts.timeout.is_some() {
    config.run.timeout_secs = opts.timeout;
  }
  if opts.jobs.is_some() {
    config.run.max_parallel = opts.jobs;
  }
  for plugin in opts.plugins {
    if !config.run.plugins.contains(&plugin) {
      config.run.plugins.push(plugin);
    }
  }
  config.run.validate()?;

  let mut registry = create_default_registry();
  registry.load_plugins(&PluginCatalog::discover(), &config.run.plugins)?;

  let include: BTreeSet<String> = opts.tags.into_iter().collect();
  let mut exclude: BTreeSet<String> = opts.not_tags.into_iter().collect();
  if opts.no_local {
    exclude.insert("local".to_string());
  }
  let selected = registry.select(&include, &exclude);
  tracing::info!(
    selected = selected.len(),
    registered = registry.checks().len(),
    "checks selected"
  );

  let report = Arc::new(Report::new(ReportSettings {
    warnings: config.run.warnings,
    wrap: config.run.wrap,
    color: config.run.color,
  }));

  if opts.host_state {
    host::collect(&report);
  }

  let engine = Engine::new(EngineOptions {
    timeout: config.run.timeout(),
    max_parallel: config.run.max_parallel,
    progress: !opts.quiet && !opts.json,
  });
  let summary = engine.run(Arc::new(config.target), &selected, &report)?;
  if summary.crashed + summary.timed_out > 0 {
    tracing::warn!(
      crashed = summary.crashed,
      timed_out = summary.timed_out,
      "some checks did not complete normally"
    );
  }

  let rendered = if opts.json {
    report.render_json()?
  } else {
    report.render_table()
  };

  if let Some(path) = &opts.output {
    fs::write(path, format!("{}\n", rendered))
      .with_context(|| format!("Failed to write report to {}", path.display()))?;
    tracing::info!(path = %path.display(), "report written");
  }
  if !opts.quiet {
    println!("{}", rendered);
  }

  if report.has_failures() {
    std::process::exit(ExitCode::Validation.as_i32());
  }
  Ok(())
}
