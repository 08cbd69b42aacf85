// src/commands/env.rs

//! Env command - print a context's environment

use super::parse_specifiers;
use anyhow::{Context, Result};
use rezlaunch::{ContextResolver, LauncherConfig};

pub fn cmd_env(config: &LauncherConfig, specs: &[String]) -> Result<()> {
    let specifiers = parse_specifiers(specs)?;
    let context = ContextResolver::from_config(config)
        .resolve(&specifiers)
        .context("Cannot resolve context")?;

    print!("{}", context.to_shell());
    Ok(())
}
