//! CLI command implementations.

use std::path::Path;

use anyhow::{Context, Result};
use vigil_abac::MemoryPolicyStore;
use vigil_config::VigilConfig;

pub mod check;
pub mod config;
pub mod policy;
pub mod version;

/// Loads the policy snapshot named on the command line, or the configured one.
fn open_store(config: &VigilConfig, policies: Option<&Path>) -> Result<MemoryPolicyStore> {
    let path = policies
        .or(config.store.policy_file.as_deref())
        .context("No policy file given. Pass --policies or set store.policy_file in vigil.toml")?;

    MemoryPolicyStore::load_from_path(path)
        .with_context(|| format!("Failed to load policies from {}", path.display()))
}
