//! modupdate-core: one self-update pass over a directory of plugin binaries.
//!
//! Layout:
//! - `inventory` scans the mods directory and reads each binary's metadata.
//! - `plan` groups items by update source and decides per item / dependency.
//! - `manifest` fetches `updater.json` and GitHub release listings.
//! - `install` owns backups, downloads into scratch space and promotion.
//! - `orchestrator` drives a pass and produces an `UpdateReport`.
//!
//! All IO is blocking. A pass is sequential so that at most one write to a
//! given live file is ever in flight.

pub mod config;
pub mod errors;
pub mod install;
pub mod inventory;
pub mod manifest;
pub mod net;
pub mod orchestrator;
pub mod paths;
pub mod plan;
pub mod source;
pub mod types;
pub mod version;

#[cfg(test)]
mod testing;

pub use config::UpdaterConfig;
pub use errors::{Result, SkipReason, UpdateError};
pub use net::{Remote, UpdaterClient};
pub use orchestrator::{run_update_pass, run_with_client, Orchestrator};
pub use types::*;
pub use version::{is_newer, Version};
