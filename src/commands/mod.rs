// src/commands/mod.rs
//! Command handlers for the rezlaunch CLI

mod build;
mod env;
mod launch;
mod list;
mod resolve;

pub use build::cmd_build;
pub use env::cmd_env;
pub use launch::cmd_launch;
pub use list::cmd_list;
pub use resolve::cmd_resolve;

use anyhow::{Context, Result};
use rezlaunch::{LauncherConfig, PackageSpecifier};
use std::path::Path;
use tracing::debug;

/// Load the configuration with command-line overrides applied
///
/// `--config` takes precedence over `$REZLAUNCH_CONFIG`, and
/// `--packages-path` over everything else.
pub fn load_config(config: Option<&Path>, packages_path: Option<&Path>) -> Result<LauncherConfig> {
    let mut config = match config {
        Some(path) => {
            let mut config = LauncherConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?;
            config.apply_env(|key| std::env::var(key).ok())?;
            config
        }
        None => LauncherConfig::from_env().context("Failed to load configuration")?,
    };

    if let Some(path) = packages_path {
        config.packages_path = path.to_path_buf();
    }

    debug!(
        "Packages path {}, install root {}, platform {}",
        config.packages_path.display(),
        config.install_root().display(),
        config.platform()
    );
    Ok(config)
}

/// Parse specifiers given on the command line
fn parse_specifiers(specs: &[String]) -> Result<Vec<PackageSpecifier>> {
    specs
        .iter()
        .map(|s| PackageSpecifier::parse(s).with_context(|| format!("Invalid specifier '{}'", s)))
        .collect()
}
