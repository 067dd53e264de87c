mod checks;
mod commands;
mod core;
mod fixes;
mod host;
mod report;
mod ui;
mod utils;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use commands::{CheckOptions, FixOptions};
use core::error::{HostcheckError, print_error};

/// Run tagged host diagnostics, report issue codes, replay fixes
#[derive(Parser)]
#[command(name = "hostcheck")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Cli {
  /// Config file (default: hostcheck.toml in the working directory)
  #[arg(long, global = true, value_name = "PATH")]
  config: Option<PathBuf>,

  /// Log progress at info level
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Log at debug level
  #[arg(long, global = true)]
  debug: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Run checks and print the report
  Check {
    /// Only run checks with any of these tags
    #[arg(short, long, num_args = 1..)]
    tags: Vec<String>,
    /// Skip checks with any of these tags
    #[arg(short = 'n', long, num_args = 1..)]
    not_tags: Vec<String>,
    /// Skip checks tagged `local`
    #[arg(short = 'a', long)]
    no_local: bool,
    /// Load these plugins in addition to the configured ones
    #[arg(short = 'u', long = "use-plugins", num_args = 1..)]
    plugins: Vec<String>,
    /// Do not record warnings
    #[arg(short = 'w', long)]
    disable_warnings: bool,
    /// Do not wrap reasons in the table
    #[arg(short = 's', long)]
    no_wrap: bool,
    /// Color status labels
    #[arg(long)]
    color: bool,
    /// Print the report as JSON
    #[arg(short, long)]
    json: bool,
    /// Also write the report to this file
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
    /// Do not print the report or a progress bar
    #[arg(short, long)]
    quiet: bool,
    /// Include host state (hostname, kernel, interfaces, ...)
    #[arg(short = 'k', long)]
    host_state: bool,
    /// Per-check timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,
    /// Maximum number of checks running at once
    #[arg(long, value_name = "N")]
    jobs: Option<usize>,
  },

  /// List tags and the checks carrying them
  Tags {
    /// Include the checks of these plugins
    #[arg(short = 'u', long = "use-plugins", num_args = 1..)]
    plugins: Vec<String>,
  },

  /// List available plugins
  Plugins,

  /// Print the issue codes of a saved report
  Codes {
    /// Report written by `hostcheck check -o`
    #[arg(short, long, value_name = "REPORT")]
    input: PathBuf,
    /// Leave out warning codes
    #[arg(short = 'w', long)]
    disable_warnings: bool,
  },

  /// Apply the fixes for issue codes
  Fix {
    /// Take codes from a saved report
    #[arg(short, long, value_name = "REPORT")]
    input: Option<PathBuf>,
    /// Issue codes to fix
    #[arg(short = 'd', long, num_args = 1..)]
    codes: Vec<String>,
    /// Load the fixes of these plugins in addition to the configured ones
    #[arg(short = 'u', long = "use-plugins", num_args = 1..)]
    plugins: Vec<String>,
    /// Ledger of applied fixes (overrides fixes.ledger)
    #[arg(long, value_name = "PATH")]
    ledger: Option<PathBuf>,
    /// Print the collected codes and exit
    #[arg(long)]
    print_codes: bool,
    /// Show which fixes would run without running them
    #[arg(long)]
    dry_run: bool,
  },
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

/// stderr logging; HOSTCHECK_LOG overrides the flag-derived level
fn init_logging(verbose: bool, debug: bool) {
  use tracing_subscriber::{EnvFilter, fmt, prelude::*};

  let level = if debug {
    "debug"
  } else if verbose {
    "info"
  } else {
    "warn"
  };
  let filter = EnvFilter::try_from_env("HOSTCHECK_LOG").unwrap_or_else(|_| EnvFilter::new(level));

  let _ = tracing_subscriber::registry()
    .with(fmt::layer().with_writer(std::io::stderr))
    .with(filter)
    .try_init();
}

fn main() {
  let cli = Cli::parse();
  init_logging(cli.verbose, cli.debug);

  let config = cli.config;
  let result = match cli.command {
    Commands::Check {
      tags,
      not_tags,
      no_local,
      plugins,
      disable_warnings,
      no_wrap,
      color,
      json,
      output,
      quiet,
      host_state,
      timeout,
      jobs,
    } => commands::run_check(CheckOptions {
      config,
      tags,
      not_tags,
      no_local,
      plugins,
      disable_warnings,
      no_wrap,
      color,
      json,
      output,
      quiet,
      host_state,
      timeout,
      jobs,
    }),
    Commands::Tags { plugins } => commands::run_tags(config.as_deref(), plugins),
    Commands::Plugins => commands::run_plugins(),
    Commands::Codes {
      input,
      disable_warnings,
    } => commands::run_codes(&input, disable_warnings),
    Commands::Fix {
      input,
      codes,
      plugins,
      ledger,
      print_codes,
      dry_run,
    } => commands::run_fix(FixOptions {
      config,
      input,
      codes,
      plugins,
      ledger,
      print_codes,
      dry_run,
    }),
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: HostcheckError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
