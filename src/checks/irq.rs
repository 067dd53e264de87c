//! irqbalance must be off so interrupt affinity stays where it was pinned

use super::trait_def::{Check, CheckScope, tag_set};
use crate::utils;
use std::collections::BTreeSet;

pub const IRQBALANCE_CODE: &str = "B19D9FF1";

pub struct IrqCheck;

impl Check for IrqCheck {
  fn name(&self) -> &str {
    "IRQ"
  }

  fn tags(&self) -> BTreeSet<String> {
    tag_set(&["basic", "irq", "local"])
  }

  fn description(&self) -> &str {
    "irqbalance service is stopped"
  }

  fn run(&self, scope: &CheckScope) -> anyhow::Result<()> {
    if utils::service_active("irqbalance") {
      let fix = if utils::which("systemctl").is_some() {
        "systemctl stop irqbalance && systemctl disable irqbalance"
      } else {
        "service irqbalance stop"
      };
      scope.fail_with_fix("irqbalance is active", IRQBALANCE_CODE, fix);
    }
    Ok(())
  }
}
