//! Operating system support check

use super::trait_def::{Check, CheckScope, tag_set};
use crate::utils::{OsRelease, SUPPORTED_PLATFORMS};
use std::collections::BTreeSet;

pub const UNSUPPORTED_OS_CODE: &str = "3C47368";

/// Fails on distributions the other checks cannot inspect
pub struct OsCheck;

impl OsCheck {
  fn evaluate(release: Option<&OsRelease>, scope: &CheckScope) {
    let supported = release.is_some_and(OsRelease::is_supported);
    if !supported {
      let found = release.map(|r| r.platform()).unwrap_or_else(|| "unknown".to_string());
      scope.fail(
        format!(
          "Unsupported Operating System '{}'. Supported operating systems: {}",
          found,
          SUPPORTED_PLATFORMS.join(", ")
        ),
        UNSUPPORTED_OS_CODE,
      );
    }
  }
}

impl Check for OsCheck {
  fn name(&self) -> &str {
    "OS"
  }

  fn tags(&self) -> BTreeSet<String> {
    tag_set(&["basic", "os", "local"])
  }

  fn description(&self) -> &str {
    "Host runs a supported Linux distribution"
  }

  fn run(&self, scope: &CheckScope) -> anyhow::Result<()> {
    Self::evaluate(OsRelease::load().as_ref(), scope);
    Ok(())
  }
}
