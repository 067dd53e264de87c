use crate::core::error::{ConfigError, HostcheckError, HostcheckResult, ResultExt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// System-wide config location, consulted after the working directory
pub const SYSTEM_CONFIG_PATH: &str = "/etc/hostcheck/hostcheck.toml";

/// Default on-disk location of the fix ledger
pub const DEFAULT_LEDGER_PATH: &str = "/tmp/.hostcheck/fixes_run";

/// Configuration for hostcheck
/// Searched in order: hostcheck.toml, .hostcheck.toml, .config/hostcheck.toml, /etc/hostcheck/hostcheck.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostcheckConfig {
  #[serde(default)]
  pub target: TargetConfig,
  #[serde(default)]
  pub run: RunConfig,
  #[serde(default)]
  pub fixes: FixesConfig,
}

/// The context handed to every check and fix
///
/// The core never looks inside it; only the check bodies do.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetConfig {
  /// Management address of the storage cluster
  #[serde(default)]
  pub mgmt_ip: Option<String>,

  /// First access VIP
  #[serde(default)]
  pub vip1_ip: Option<String>,

  /// Second access VIP (optional in single-path setups)
  #[serde(default)]
  pub vip2_ip: Option<String>,

  /// Expected multipath device identity
  #[serde(default)]
  pub multipath: MultipathPolicy,

  /// Free-form keys for plugins
  #[serde(flatten)]
  pub extra: BTreeMap<String, serde_json::Value>,
}

/// Vendor/product strings the multipath config must carry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultipathPolicy {
  #[serde(default = "default_vendor")]
  pub vendor: String,
  #[serde(default = "default_product")]
  pub product: String,
}

fn default_vendor() -> String {
  "DATERA".to_string()
}

fn default_product() -> String {
  "IBLOCK".to_string()
}

impl Default for MultipathPolicy {
  fn default() -> Self {
    Self {
      vendor: default_vendor(),
      product: default_product(),
    }
  }
}

/// How a check run behaves
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
  /// Record warnings (false drops them from the report and from code lists)
  #[serde(default = "default_true")]
  pub warnings: bool,

  /// Word-wrap reasons in the table output
  #[serde(default = "default_true")]
  pub wrap: bool,

  /// Color status labels in the table output
  #[serde(default)]
  pub color: bool,

  /// Per-check timeout in seconds (unset = wait forever)
  #[serde(default)]
  pub timeout_secs: Option<u64>,

  /// Maximum number of checks running at once (unset = one worker per check)
  #[serde(default)]
  pub max_parallel: Option<usize>,

  /// Plugins to load for every run
  #[serde(default)]
  pub plugins: Vec<String>,
}

fn default_true() -> bool {
  true
}

impl Default for RunConfig {
  fn default() -> Self {
    Self {
      warnings: true,
      wrap: true,
      color: false,
      timeout_secs: None,
      max_parallel: None,
      plugins: Vec::new(),
    }
  }
}

impl RunConfig {
  pub fn timeout(&self) -> Option<Duration> {
    self.timeout_secs.map(Duration::from_secs)
  }
}

/// Fix replay settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixesConfig {
  /// Where the ledger of applied fixes lives
  #[serde(default = "default_ledger")]
  pub ledger: PathBuf,
}

fn default_ledger() -> PathBuf {
  PathBuf::from(DEFAULT_LEDGER_PATH)
}

impl Default for FixesConfig {
  fn default() -> Self {
    Self { ledger: default_ledger() }
  }
}

impl TargetConfig {
  /// Validate addresses that are set
  pub fn validate(&self) -> HostcheckResult<()> {
    for (field, value) in [
      ("target.mgmt_ip", &self.mgmt_ip),
      ("target.vip1_ip", &self.vip1_ip),
      ("target.vip2_ip", &self.vip2_ip),
    ] {
      if let Some(ip) = value
        && ip.parse::<IpAddr>().is_err()
      {
        return Err(HostcheckError::Config(ConfigError::InvalidValue {
          field: field.to_string(),
          value: ip.clone(),
          reason: "not an IPv4 or IPv6 address".to_string(),
        }));
      }
    }
    Ok(())
  }
}

impl RunConfig {
  /// Reject settings that would stall a run
  pub fn validate(&self) -> HostcheckResult<()> {
    if self.max_parallel == Some(0) {
      return Err(HostcheckError::Config(ConfigError::InvalidValue {
        field: "run.max_parallel".to_string(),
        value: "0".to_string(),
        reason: "at least one worker is required".to_string(),
      }));
    }
    if self.timeout_secs == Some(0) {
      return Err(HostcheckError::Config(ConfigError::InvalidValue {
        field: "run.timeout_secs".to_string(),
        value: "0".to_string(),
        reason: "a zero timeout would fail every check".to_string(),
      }));
    }
    Ok(())
  }
}

impl HostcheckConfig {
  /// Find config file in search order
  pub fn find_config_path(dir: &Path) -> Option<PathBuf> {
    let candidates = vec![
      dir.join("hostcheck.toml"),
      dir.join(".hostcheck.toml"),
      dir.join(".config").join("hostcheck.toml"),
      PathBuf::from(SYSTEM_CONFIG_PATH),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load config from an explicit path, or search from `dir`.
  ///
  /// Without an explicit path a missing file is not an error: the defaults
  /// are enough to run every local check.
  pub fn load(explicit: Option<&Path>, dir: &Path) -> HostcheckResult<Self> {
    let config_path = match explicit {
      Some(path) => {
        if !path.exists() {
          return Err(HostcheckError::Config(ConfigError::NotFound {
            path: path.to_path_buf(),
          }));
        }
        path.to_path_buf()
      }
      None => match Self::find_config_path(dir) {
        Some(path) => path,
        None => {
          tracing::debug!(dir = %dir.display(), "no hostcheck.toml found, using defaults");
          return Ok(Self::default());
        }
      },
    };

    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config = Self::from_toml(&content).with_context(|| format!("Invalid config in {}", config_path.display()))?;
    tracing::debug!(path = %config_path.display(), "loaded config");
    Ok(config)
  }

  /// Parse and validate config text
  pub fn from_toml(content: &str) -> HostcheckResult<Self> {
    let config: HostcheckConfig = toml_edit::de::from_str(content)?;
    config.target.validate()?;
    config.run.validate()?;
    Ok(config)
  }
}
