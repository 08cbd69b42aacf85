// src/commands/build.rs

//! Build command - build a package from its descriptor

use anyhow::{Context, Result};
use rezlaunch::{DescriptorStore, EnvironmentBuilder, LauncherConfig};
use std::path::Path;

pub fn cmd_build(
    config: &LauncherConfig,
    name: &str,
    version: &str,
    install_root: Option<&Path>,
) -> Result<()> {
    let store = DescriptorStore::new(&config.packages_path);
    let descriptor = store
        .load(name, version)
        .with_context(|| format!("Failed to load descriptor for {}-{}", name, version))?;

    let install_root = install_root.unwrap_or_else(|| config.install_root());
    println!(
        "Building {} ({} steps) into {}",
        descriptor.qualified_name(),
        descriptor.build.len(),
        install_root.display()
    );

    let package = EnvironmentBuilder::from_config(config)
        .build(&descriptor, install_root)
        .with_context(|| format!("Failed to build {}", descriptor.qualified_name()))?;

    println!(
        "[OK] {} installed at {} ({} files)",
        package.qualified_name(),
        package.install_path.display(),
        package.manifest.files.len()
    );
    Ok(())
}
