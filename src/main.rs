// src/main.rs

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so `env` output can be sourced
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = commands::load_config(cli.config.as_deref(), cli.packages_path.as_deref())?;

    match cli.command {
        Commands::Launch {
            package,
            version,
            wait,
            args,
        } => {
            let code = commands::cmd_launch(config, &package, version.as_deref(), args, wait)?;
            if let Some(code) = code {
                std::process::exit(code);
            }
        }
        Commands::Resolve { specs, json } => commands::cmd_resolve(&config, &specs, json)?,
        Commands::Env { specs } => commands::cmd_env(&config, &specs)?,
        Commands::Build {
            name,
            version,
            install_root,
        } => commands::cmd_build(&config, &name, &version, install_root.as_deref())?,
        Commands::List { name } => commands::cmd_list(&config, name.as_deref())?,
    }

    Ok(())
}
