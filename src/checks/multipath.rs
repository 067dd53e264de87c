//! device-mapper multipath daemon and configuration checks

use super::trait_def::{Check, CheckScope, tag_set};
use crate::core::block::{self, ConfigBlock};
use crate::core::config::MultipathPolicy;
use crate::utils::{self, OsRelease};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

pub const MULTIPATHD_CODE: &str = "541C10BF";
pub const MULTIPATH_CONF_PARSE_CODE: &str = "7E1C0B35";

const MULTIPATH_CONF: &str = "/etc/multipath.conf";
const CONF_FIX: &str = "Check the example multipath.conf file from the deployment guide";

pub struct MultipathCheck;

impl Check for MultipathCheck {
  fn name(&self) -> &str {
    "Multipath"
  }

  fn tags(&self) -> BTreeSet<String> {
    tag_set(&["basic", "multipath", "local"])
  }

  fn description(&self) -> &str {
    "multipath tools installed and multipathd running"
  }

  fn run(&self, scope: &CheckScope) -> anyhow::Result<()> {
    if utils::which("multipath").is_none() {
      scope.fail("Multipath binary could not be found, is it installed?", "2D18685C");
    }
    if !utils::service_active("multipathd") {
      let fix = if utils::which("systemctl").is_some() {
        "systemctl start multipathd"
      } else {
        "service multipathd start"
      };
      scope.fail_with_fix("multipathd not enabled", MULTIPATHD_CODE, fix);
    }
    Ok(())
  }
}

/// `device` blocks inside `section`
fn devices<'a>(section: &'a ConfigBlock) -> impl Iterator<Item = &'a ConfigBlock> {
  section.children().iter().filter(|c| c.key == "device")
}

/// Validate a parsed multipath.conf against the expected device identity
pub fn validate_multipath_conf(blocks: &[ConfigBlock], policy: &MultipathPolicy, platform: &str, scope: &CheckScope) {
  match block::find(blocks, "defaults") {
    None => scope.fail_with_fix("Missing defaults section", "1D8C438C", CONF_FIX),
    Some(defaults) => {
      // Ubuntu's multipath-tools spells the option differently
      let (key, code) = if platform == "ubuntu" {
        ("checker_timer", "FCFE3444")
      } else {
        ("checker_timeout", "70191A9A")
      };
      if !defaults.has(key) {
        scope.fail_with_fix(format!("defaults section missing '{}'", key), code, CONF_FIX);
      }
    }
  }

  match block::find(blocks, "devices") {
    None => scope.fail_with_fix("Missing devices section", "797A6031", CONF_FIX),
    Some(section) => match devices(section).find(|d| d.get("vendor") == Some(policy.vendor.as_str())) {
      None => scope.fail_with_fix(
        format!("No {} device section found", policy.vendor),
        "99B9D136",
        CONF_FIX,
      ),
      Some(device) => {
        if device.get("product") != Some(policy.product.as_str()) {
          scope.fail_with_fix(
            format!("{} 'product' entry should be \"{}\"", policy.vendor, policy.product),
            "A9DF3F8C",
            CONF_FIX,
          );
        }
      }
    },
  }

  let Some(exceptions) = block::find(blocks, "blacklist_exceptions") else {
    scope.fail("Missing blacklist_exceptions section", "B8C8A19C");
    return;
  };
  let vendor_pattern = format!("{}.*", policy.vendor);
  let product_pattern = format!("{}.*", policy.product);
  let entry = devices(exceptions).find(|d| {
    d.get("vendor")
      .is_some_and(|v| v.trim_end_matches(".*").trim_end_matches('*') == policy.vendor)
  });
  let Some(entry) = entry else {
    scope.fail_with_fix(
      format!("No {} blacklist_exceptions section found", policy.vendor),
      "09E37E51",
      CONF_FIX,
    );
    return;
  };
  if entry.get("vendor") != Some(vendor_pattern.as_str()) {
    scope.fail_with_fix(
      format!("{} blacklist_exceptions vendor entry malformed, expected \"{}\"", policy.vendor, vendor_pattern),
      "9990F32F",
      CONF_FIX,
    );
  }
  if entry.get("product") != Some(product_pattern.as_str()) {
    scope.fail_with_fix(
      format!("{} blacklist_exceptions product entry malformed, expected \"{}\"", policy.vendor, product_pattern),
      "642753A0",
      CONF_FIX,
    );
  }
}

pub struct MultipathConfCheck;

impl Check for MultipathConfCheck {
  fn name(&self) -> &str {
    "Multipath Conf"
  }

  fn tags(&self) -> BTreeSet<String> {
    tag_set(&["basic", "multipath", "local"])
  }

  fn description(&self) -> &str {
    "multipath.conf defaults, device and blacklist exception sections"
  }

  fn run(&self, scope: &CheckScope) -> anyhow::Result<()> {
    let path = Path::new(MULTIPATH_CONF);
    if !path.exists() {
      scope.fail_with_fix(
        "/etc/multipath.conf file not found",
        "1D506D89",
        "Copy the multipath.conf file from the deployment guide",
      );
      return Ok(());
    }

    let text = fs::read_to_string(path)?;
    let blocks = match block::parse_blocks(&text) {
      Ok(blocks) => blocks,
      Err(err) => {
        tracing::debug!(error = %err, "multipath.conf did not parse");
        scope.fail_with_fix(
          format!("{} could not be parsed: {}", MULTIPATH_CONF, err),
          MULTIPATH_CONF_PARSE_CODE,
          CONF_FIX,
        );
        return Ok(());
      }
    };

    let platform = OsRelease::load().map(|r| r.platform()).unwrap_or_default();
    validate_multipath_conf(&blocks, &scope.config().multipath, &platform, scope);
    Ok(())
  }
}
