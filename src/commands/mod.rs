//! CLI commands for hostcheck
//!
//! - **check**: run the selected checks and print the report
//! - **tags**: list the tags checks can be selected by
//! - **plugins**: list the plugins compiled into this build
//! - **codes**: print the issue codes of a saved report
//! - **fix**: replay fixes for issue codes through the ledger

pub mod check;
pub mod codes;
pub mod fix;
pub mod plugins;
pub mod tags;

pub use check::{CheckOptions, run_check};
pub use codes::run_codes;
pub use fix::{FixOptions, run_fix};
pub use plugins::run_plugins;
pub use tags::run_tags;
