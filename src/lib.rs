// src/lib.rs

//! rezlaunch: package resolution and launch core
//!
//! Maps a request to start an application (name plus optional version) onto
//! an isolated runtime environment built from installed packages, building
//! missing packages from declarative descriptors on demand.
//!
//! # Architecture
//!
//! - Descriptor store: TOML descriptors at `<root>/<name>/<version>/descriptor`
//! - Environment builder: runs descriptor steps into `<name>/<version>/install`
//! - Context resolver: all-or-nothing selection of installed packages plus
//!   the merged environment
//! - Launch orchestrator: resolve, build what is missing, resolve once more,
//!   then start the executable through the platform adapter

pub mod builder;
pub mod config;
pub mod descriptor;
mod error;
pub mod launcher;
pub mod package;
pub mod platform;
pub mod resolver;
pub mod version;

pub use builder::EnvironmentBuilder;
pub use config::LauncherConfig;
pub use descriptor::{BuildStep, DescriptorStore, EnvAction, PackageDescriptor};
pub use error::{Error, Result, StepError};
pub use launcher::{
    LaunchFailure, LaunchHandle, LaunchOrchestrator, LaunchReport, LaunchRequest, LaunchState,
};
pub use package::{InstalledPackage, PackageSpecifier};
pub use platform::Platform;
pub use resolver::{ContextResolver, ResolutionFailure, ResolveCache, ResolvedContext};
pub use version::PackageVersion;
