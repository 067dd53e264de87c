//! Tests for the `fix` command
//!
//! Only unknown codes and dry runs are exercised, so nothing on the test
//! machine is changed.

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_fix_without_codes_is_an_error() -> Result<()> {
  let host = TestHost::new()?;
  let output = hostcheck(&host.path, &["fix"])?;
  assert_eq!(output.status.code(), Some(1));
  let err = stderr(&output);
  assert!(err.contains("No issue codes to fix"));
  assert!(err.contains("-d CODE"));
  Ok(())
}

#[test]
fn test_unknown_code_saves_empty_ledger() -> Result<()> {
  let host = TestHost::new()?;
  let output = run_hostcheck(&host.path, &["fix", "-d", "NOPE"])?;
  assert!(stdout(&output).contains("No fix for code: NOPE"));
  assert_eq!(std::fs::read_to_string(host.ledger_path())?, "[]");
  Ok(())
}

#[test]
fn test_ledger_flag_overrides_config() -> Result<()> {
  let host = TestHost::new()?;
  run_hostcheck(&host.path, &["fix", "-d", "NOPE", "--ledger", "custom-ledger"])?;
  assert!(host.file_exists("custom-ledger"));
  assert!(!host.ledger_path().exists());
  Ok(())
}

#[test]
fn test_dry_run_lists_fix_without_touching_ledger() -> Result<()> {
  let host = TestHost::new()?;
  let output = run_hostcheck(&host.path, &["fix", "-d", "B19D9FF1", "--dry-run"])?;
  assert!(stdout(&output).contains("Would apply: irqbalance_stop"));
  assert!(!host.ledger_path().exists());
  Ok(())
}

#[test]
fn test_already_applied_fix_is_skipped() -> Result<()> {
  let host = TestHost::new()?;
  std::fs::create_dir_all(host.ledger_path().parent().unwrap())?;
  std::fs::write(host.ledger_path(), "[\"irqbalance_stop\"]")?;

  let output = run_hostcheck(&host.path, &["fix", "-d", "B19D9FF1"])?;
  assert!(stdout(&output).contains("Already applied: irqbalance_stop"));
  Ok(())
}

#[test]
fn test_print_codes_from_report() -> Result<()> {
  let host = TestHost::new()?;
  hostcheck(&host.path, &["check", "-t", "connection", "-q", "-o", "report.txt"])?;

  let output = run_hostcheck(&host.path, &["fix", "-i", "report.txt", "-d", "EXTRA", "--print-codes"])?;
  assert_eq!(stdout(&output), "EXTRA\n2E94C6D0\n5B0E7A44\n16EB208B\n");
  Ok(())
}
