// src/commands/resolve.rs

//! Resolve command - show what a set of specifiers resolves to

use super::parse_specifiers;
use anyhow::{Context, Result};
use rezlaunch::{ContextResolver, LauncherConfig};
use serde_json::json;

pub fn cmd_resolve(config: &LauncherConfig, specs: &[String], as_json: bool) -> Result<()> {
    let specifiers = parse_specifiers(specs)?;
    let mut resolver = ContextResolver::from_config(config);
    let context = resolver
        .resolve(&specifiers)
        .context("Cannot resolve context")?;

    if as_json {
        let packages: Vec<_> = context
            .packages()
            .iter()
            .map(|p| {
                json!({
                    "name": p.name,
                    "version": p.version,
                    "install_path": p.install_path,
                    "root": p.root(),
                    "executable": p.executable(),
                })
            })
            .collect();
        let output = json!({
            "packages": packages,
            "resolve": context.resolve_string(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{:<24} {:<16} ROOT", "PACKAGE", "VERSION");
    for package in context.packages() {
        println!(
            "{:<24} {:<16} {}",
            package.name,
            package.version,
            package.root().display()
        );
    }

    Ok(())
}
