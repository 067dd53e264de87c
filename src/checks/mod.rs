//! Host checks and the machinery that runs them
//!
//! All checks implement the `Check` trait and record outcomes through the
//! `CheckScope` the engine hands them. The registry decides which checks run;
//! the engine runs them concurrently against one shared report.
//!
//! # Built-in Checks
//!
//! - **OS**: supported distribution
//! - **SYSCTL**: TCP and socket buffer tunables
//! - **ISCSI**: open-iscsi installed, iscsid running, noop timeouts
//! - **UDEV**: LUN naming rules installed
//! - **ARP**: arp_announce / arp_ignore / route gc_interval
//! - **IRQ**: irqbalance stopped
//! - **CPUFREQ**: performance governor available
//! - **Block Devices**: noop elevator on the kernel command line
//! - **Multipath** / **Multipath Conf**: daemon running and config sections valid
//! - **MGMT** / **VIP1** / **VIP2**: cluster addresses reachable
//!
//! The `mtu` plugin adds **MTU** (jumbo frames on every interface).
//!
//! # Example
//!
//! ```rust,ignore
//! let registry = create_default_registry();
//! let selected = registry.select(&tag_set(&["local"]), &tag_set(&["connection"]));
//! let report = Arc::new(Report::new(ReportSettings::default()));
//! Engine::new(EngineOptions::default()).run(Arc::new(config.target), &selected, &report)?;
//! println!("{}", report.render_table());
//! ```

pub mod arp;
pub mod block_devices;
pub mod cpufreq;
pub mod engine;
pub mod iscsi;
pub mod irq;
pub mod mtu;
pub mod multipath;
pub mod network;
pub mod os;
pub mod plugins;
pub mod registry;
pub mod sysctl;
pub mod trait_def;
pub mod udev;

// Re-export public API
pub use engine::{Engine, EngineOptions, RunSummary};
pub use plugins::PluginCatalog;
pub use registry::{CheckRegistry, create_default_registry};
pub use trait_def::{Check, CheckScope, tag_set};
