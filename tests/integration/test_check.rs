//! Tests for the `check` command
//!
//! Only the reachability checks run here: with no addresses configured they
//! record their outcomes without touching the network.

use crate::helpers::*;
use anyhow::Result;
use serde_json::Value;

#[test]
fn test_unmatched_tag_gives_empty_report() -> Result<()> {
  let host = TestHost::new()?;
  let output = run_hostcheck(&host.path, &["check", "-t", "no-such-tag", "-j"])?;

  let doc: Value = serde_json::from_str(&stdout(&output))?;
  assert_eq!(doc["success"], serde_json::json!([]));
  assert_eq!(doc["failures"], serde_json::json!({}));
  assert_eq!(doc["warnings"], serde_json::json!({}));
  assert!(doc["host"].as_str().is_some_and(|h| !h.is_empty()));
  Ok(())
}

#[test]
fn test_missing_addresses_fail_with_validation_exit() -> Result<()> {
  let host = TestHost::new()?;
  let output = hostcheck(&host.path, &["check", "-t", "connection", "-j"])?;
  assert_eq!(output.status.code(), Some(3));

  let doc: Value = serde_json::from_str(&stdout(&output))?;
  assert_eq!(doc["failures"]["5B0E7A44"][0], "MGMT");
  assert_eq!(doc["failures"]["2E94C6D0"][0], "VIP1");
  assert_eq!(doc["warnings"]["16EB208B"][0], "VIP2");
  assert_eq!(doc["tags"]["VIP2"], serde_json::json!(["basic", "connection", "local"]));
  Ok(())
}

#[test]
fn test_disabled_warnings_are_dropped() -> Result<()> {
  let host = TestHost::new()?;
  let output = hostcheck(&host.path, &["check", "-t", "connection", "-j", "-w"])?;
  let doc: Value = serde_json::from_str(&stdout(&output))?;
  assert_eq!(doc["warnings"], serde_json::json!({}));
  assert!(doc["failures"]["5B0E7A44"].is_array());
  Ok(())
}

#[test]
fn test_no_local_excludes_everything_builtin() -> Result<()> {
  let host = TestHost::new()?;
  let output = run_hostcheck(&host.path, &["check", "-a", "-j"])?;
  let doc: Value = serde_json::from_str(&stdout(&output))?;
  assert_eq!(doc["success"], serde_json::json!([]));
  assert_eq!(doc["failures"], serde_json::json!({}));
  Ok(())
}

#[test]
fn test_table_written_to_file_and_codes_read_back() -> Result<()> {
  let host = TestHost::new()?;
  let output = hostcheck(&host.path, &["check", "-t", "connection", "-q", "-o", "report.txt"])?;
  assert_eq!(output.status.code(), Some(3));
  assert!(stdout(&output).is_empty());

  let table = host.read_file("report.txt")?;
  assert!(table.contains("| Test"));
  assert!(table.contains("ISSUE 5B0E7A44: No mgmt_ip found"));
  assert!(table.contains("FIX 5B0E7A44: Set target.mgmt_ip in hostcheck.toml"));

  let output = run_hostcheck(&host.path, &["codes", "-i", "report.txt"])?;
  assert_eq!(stdout(&output), "2E94C6D0\n5B0E7A44\n16EB208B\n");
  Ok(())
}

#[test]
fn test_configured_addresses_are_validated() -> Result<()> {
  let host = TestHost::new()?;
  host.write_config("[target]\nmgmt_ip = \"not-an-ip\"\n")?;
  let output = hostcheck(&host.path, &["check", "-t", "no-such-tag"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("target.mgmt_ip"));
  Ok(())
}

#[test]
fn test_explicit_config_must_exist() -> Result<()> {
  let host = TestHost::new()?;
  let output = hostcheck(&host.path, &["--config", "missing.toml", "check"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("Config file not found"));
  Ok(())
}

#[test]
fn test_zero_jobs_rejected() -> Result<()> {
  let host = TestHost::new()?;
  let output = hostcheck(&host.path, &["check", "--jobs", "0"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("run.max_parallel"));
  Ok(())
}
