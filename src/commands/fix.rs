//! Replay fixes for issue codes
//!
//! Codes come from `-d` and/or a saved report (`-i`). Every fix goes through
//! the ledger, so rerunning the command on the same host is a no-op for fixes
//! that already succeeded.

use std::env;
use std::path::PathBuf;

use crate::checks::PluginCatalog;
use crate::commands::codes::report_codes;
use crate::core::config::HostcheckConfig;
use crate::core::error::{ExitCode, HostcheckError, HostcheckResult};
use crate::fixes::ledger::FixLedger;
use crate::fixes::{FixSummary, create_default_fix_registry, run_fixes};

/// Flags of `hostcheck fix`
#[derive(Debug, Clone, Default)]
pub struct FixOptions {
  pub config: Option<PathBuf>,
  /// Saved report to take codes from
  pub input: Option<PathBuf>,
  /// Codes given on the command line
  pub codes: Vec<String>,
  pub plugins: Vec<String>,
  /// Ledger location (overrides `fixes.ledger`)
  pub ledger: Option<PathBuf>,
  /// Print the collected codes and exit
  pub print_codes: bool,
  pub dry_run: bool,
}

/// Run the fix command
pub fn run_fix(opts: FixOptions) -> HostcheckResult<()> {
  let current_dir = env::current_dir()?;
  let config = HostcheckConfig::load(opts.config.as_deref(), &current_dir)?;

  let mut codes = opts.codes;
  if let Some(input) = &opts.input {
    for code in report_codes(input, !config.run.warnings)? {
      if !codes.contains(&code) {
        codes.push(code);
      }
    }
  }
  if codes.is_empty() {
    return Err(HostcheckError::with_help(
      "No issue codes to fix",
      "Pass codes with -d CODE or a saved report with -i REPORT.",
    ));
  }

  if opts.print_codes {
    for code in &codes {
      println!("{}", code);
    }
    return Ok(());
  }

  let mut plugins = config.run.plugins.clone();
  for plugin in opts.plugins {
    if !plugins.contains(&plugin) {
      plugins.push(plugin);
    }
  }
  let mut registry = create_default_fix_registry();
  registry.load_plugins(&PluginCatalog::discover(), &plugins)?;

  let ledger_path = opts.ledger.unwrap_or_else(|| config.fixes.ledger.clone());
  let mut ledger = FixLedger::load(&ledger_path)?;

  let summary = run_fixes(&codes, &registry, &mut ledger, &config.target, opts.dry_run);
  if !opts.dry_run {
    ledger.save()?;
  }
  print_summary(&summary, opts.dry_run);

  if summary.has_failures() {
    std::process::exit(ExitCode::Validation.as_i32());
  }
  Ok(())
}

fn print_summary(summary: &FixSummary, dry_run: bool) {
  let verb = if dry_run { "Would apply" } else { "Applied" };
  for name in &summary.applied {
    println!("{}: {}", verb, name);
  }
  for name in &summary.skipped {
    println!("Already applied: {}", name);
  }
  for code in &summary.unknown {
    println!("No fix for code: {}", code);
  }
  for (name, error) in &summary.failed {
    println!("Failed: {} ({})", name, error);
  }
}
