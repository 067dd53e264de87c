//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Scratch directory holding a hostcheck.toml
pub struct TestHost {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestHost {
  /// Create a directory with a config that keeps the ledger inside it
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();
    let host = Self { _root: root, path };
    host.write_config("")?;
    Ok(host)
  }

  /// Write hostcheck.toml, appending a `[fixes]` section pointing into the directory
  pub fn write_config(&self, extra: &str) -> Result<()> {
    let ledger = self.ledger_path();
    std::fs::write(
      self.config_path(),
      format!("{}\n[fixes]\nledger = \"{}\"\n", extra, ledger.display()),
    )?;
    Ok(())
  }

  pub fn config_path(&self) -> PathBuf {
    self.path.join("hostcheck.toml")
  }

  pub fn ledger_path(&self) -> PathBuf {
    self.path.join("state").join("fixes_run")
  }

  pub fn write_file(&self, name: &str, content: &str) -> Result<PathBuf> {
    let path = self.path.join(name);
    std::fs::write(&path, content)?;
    Ok(path)
  }

  pub fn file_exists(&self, name: &str) -> bool {
    self.path.join(name).exists()
  }

  pub fn read_file(&self, name: &str) -> Result<String> {
    Ok(std::fs::read_to_string(self.path.join(name))?)
  }
}

/// Run hostcheck and return its output whatever the exit status
pub fn hostcheck(cwd: &Path, args: &[&str]) -> Result<Output> {
  let hostcheck_bin = env!("CARGO_BIN_EXE_hostcheck");

  Command::new(hostcheck_bin)
    .current_dir(cwd)
    .args(args)
    .env_remove("HOSTCHECK_LOG")
    .output()
    .context("Failed to run hostcheck")
}

/// Run hostcheck and fail unless it exits zero
pub fn run_hostcheck(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = hostcheck(cwd, args)?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    anyhow::bail!(
      "hostcheck command failed: hostcheck {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      stdout,
      stderr
    );
  }

  Ok(output)
}

pub fn stdout(output: &Output) -> String {
  String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
  String::from_utf8_lossy(&output.stderr).into_owned()
}
