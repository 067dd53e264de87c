//! Tests for the `tags`, `plugins` and `codes` commands

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_tags_lists_builtin_tags() -> Result<()> {
  let host = TestHost::new()?;
  let output = run_hostcheck(&host.path, &["tags"])?;
  let table = stdout(&output);

  assert!(table.contains("| Tag"));
  for tag in ["basic", "connection", "local", "multipath", "sysctl"] {
    assert!(table.contains(&format!("| {} ", tag)), "missing tag {}", tag);
  }
  assert!(!table.contains("| mtu "));
  Ok(())
}

#[test]
fn test_tags_with_plugin() -> Result<()> {
  let host = TestHost::new()?;
  let output = run_hostcheck(&host.path, &["tags", "-u", "mtu"])?;
  assert!(stdout(&output).contains("| mtu "));
  Ok(())
}

#[test]
fn test_unknown_plugin_is_a_user_error() -> Result<()> {
  let host = TestHost::new()?;
  let output = hostcheck(&host.path, &["tags", "-u", "nope"])?;
  assert_eq!(output.status.code(), Some(1));
  let err = stderr(&output);
  assert!(err.contains("Unrecognized plugin requested: nope"));
  assert!(err.contains("Available plugins: mtu"));
  Ok(())
}

#[test]
fn test_plugins_lists_mtu() -> Result<()> {
  let host = TestHost::new()?;
  let output = run_hostcheck(&host.path, &["plugins"])?;
  let table = stdout(&output);
  assert!(table.contains("| mtu "));
  assert!(table.contains("jumbo frames"));
  Ok(())
}

#[test]
fn test_codes_from_saved_json_report() -> Result<()> {
  let host = TestHost::new()?;
  host.write_file(
    "report.json",
    r#"{
  "host": "node1",
  "success": ["OS"],
  "warnings": { "8E3B51C2": ["MTU", "Interfaces not using jumbo frames: eth1 (1500)"] },
  "failures": { "BDB4D5D8": ["ARP", "net.ipv4.conf.all.arp_ignore is 0, expected 1"] },
  "tags": { "ARP": ["arp", "basic"], "MTU": ["mtu"], "OS": ["basic", "os"] }
}"#,
  )?;

  let output = run_hostcheck(&host.path, &["codes", "-i", "report.json"])?;
  assert_eq!(stdout(&output), "BDB4D5D8\n8E3B51C2\n");

  let output = run_hostcheck(&host.path, &["codes", "-i", "report.json", "-w"])?;
  assert_eq!(stdout(&output), "BDB4D5D8\n");
  Ok(())
}

#[test]
fn test_codes_from_missing_report_fails() -> Result<()> {
  let host = TestHost::new()?;
  let output = hostcheck(&host.path, &["codes", "-i", "missing.txt"])?;
  assert!(!output.status.success());
  assert!(stderr(&output).contains("Failed to read report"));
  Ok(())
}
