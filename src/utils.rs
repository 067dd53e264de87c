//! Host inspection helpers shared by checks and fixes

use anyhow::{Context, bail};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Platforms the built-in checks know how to inspect
pub const SUPPORTED_PLATFORMS: [&str; 5] = ["ubuntu", "debian", "centos7", "centos6", "rhel"];

/// Locate an executable on PATH
pub fn which(program: &str) -> Option<PathBuf> {
  let path = env::var_os("PATH")?;
  env::split_paths(&path)
    .map(|dir| dir.join(program))
    .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
  use std::os::unix::fs::PermissionsExt;
  fs::metadata(path)
    .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
    .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
  path.is_file()
}

/// Run a program and return its stdout; a non-zero exit is an error
pub fn run(program: &str, args: &[&str]) -> anyhow::Result<String> {
  tracing::debug!(program, ?args, "running command");
  let output = Command::new(program)
    .args(args)
    .output()
    .with_context(|| format!("failed to execute {}", program))?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    bail!("{} {} exited with {}: {}", program, args.join(" "), output.status, stderr.trim());
  }
  Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Whether a program runs and exits zero
pub fn succeeds(program: &str, args: &[&str]) -> bool {
  run(program, args).is_ok()
}

/// Whether a service is active, via systemd when available
pub fn service_active(name: &str) -> bool {
  if which("systemctl").is_some() {
    return succeeds("systemctl", &["is-active", "--quiet", name]);
  }
  run("service", &[name, "status"])
    .map(|out| out.contains("Active: active") || out.contains("is running"))
    .unwrap_or(false)
}

/// Start, stop or disable a service, via systemd when available
pub fn service(action: &str, name: &str) -> anyhow::Result<()> {
  if which("systemctl").is_some() {
    run("systemctl", &[action, name])?;
  } else {
    run("service", &[name, action])?;
  }
  Ok(())
}

/// Read a kernel tunable from /proc/sys, normalizing inner whitespace
pub fn sysctl_value(key: &str) -> anyhow::Result<String> {
  let path = Path::new("/proc/sys").join(key.replace('.', "/"));
  let raw = fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?;
  Ok(raw.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Hostname of this machine, or "localhost" when it cannot be read
pub fn hostname() -> String {
  fs::read_to_string("/proc/sys/kernel/hostname")
    .or_else(|_| fs::read_to_string("/etc/hostname"))
    .map(|h| h.trim().to_string())
    .ok()
    .filter(|h| !h.is_empty())
    .unwrap_or_else(|| "localhost".to_string())
}

/// Fields of /etc/os-release the checks care about
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OsRelease {
  pub id: String,
  pub version_id: String,
  pub pretty_name: String,
}

impl OsRelease {
  /// Load /etc/os-release
  pub fn load() -> Option<Self> {
    fs::read_to_string("/etc/os-release")
      .ok()
      .map(|text| Self::parse(&text))
  }

  pub fn parse(text: &str) -> Self {
    let mut release = Self::default();
    for line in text.lines() {
      let Some((key, value)) = line.split_once('=') else {
        continue;
      };
      let value = value.trim().trim_matches('"').to_string();
      match key.trim() {
        "ID" => release.id = value.to_lowercase(),
        "VERSION_ID" => release.version_id = value,
        "PRETTY_NAME" => release.pretty_name = value,
        _ => {}
      }
    }
    release
  }

  /// Platform identifier; CentOS is split by major version
  pub fn platform(&self) -> String {
    if self.id == "centos" {
      if self.version_id.starts_with('7') {
        return "centos7".to_string();
      }
      if self.version_id.starts_with('6') {
        return "centos6".to_string();
      }
    }
    self.id.clone()
  }

  pub fn is_supported(&self) -> bool {
    SUPPORTED_PLATFORMS.contains(&self.platform().as_str())
  }

  /// Debian and Ubuntu use apt, everything else yum
  pub fn uses_apt(&self) -> bool {
    matches!(self.id.as_str(), "ubuntu" | "debian")
  }
}
