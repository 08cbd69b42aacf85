// src/cli/mod.rs
//! CLI definitions for rezlaunch
//!
//! The command implementations live in the `commands` module.
//!
//! - `launch` - Resolve (building on demand) and start an application
//! - `resolve` - Show the packages a set of specifiers resolves to
//! - `env` - Print a resolved context's environment
//! - `build` - Build one package from its descriptor
//! - `list` - List descriptors and installed versions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rezlaunch")]
#[command(version)]
#[command(
    about = "Resolve package environments and launch applications inside them",
    long_about = None
)]
pub struct Cli {
    /// Configuration file (default: $REZLAUNCH_CONFIG or the user config dir)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Root holding package descriptors (overrides config and environment)
    #[arg(long, global = true, value_name = "PATH")]
    pub packages_path: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch an application inside its resolved environment
    Launch {
        /// Package providing the application
        package: String,

        /// Exact version (latest when omitted)
        #[arg(long)]
        version: Option<String>,

        /// Wait for the application and exit with its return code
        #[arg(long)]
        wait: bool,

        /// Arguments passed to the application
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Resolve package specifiers (name or name-version)
    Resolve {
        #[arg(required = true)]
        specs: Vec<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print the environment of a resolved context as shell assignments
    Env {
        #[arg(required = true)]
        specs: Vec<String>,
    },

    /// Build a package from its descriptor
    Build {
        name: String,
        version: String,

        /// Install root (default: from config)
        #[arg(long, value_name = "PATH")]
        install_root: Option<PathBuf>,
    },

    /// List packages with descriptors or installs
    List {
        /// Only list this package
        name: Option<String>,
    },
}
