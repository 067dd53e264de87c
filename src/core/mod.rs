//! Core building blocks shared by every command
//!
//! - **block**: parser for brace-nested `key value` config files (multipath.conf style)
//! - **config**: hostcheck.toml loading and validation, including the target context handed to checks
//! - **error**: error types with contextual help messages and exit codes

pub mod block;
pub mod config;
pub mod error;
