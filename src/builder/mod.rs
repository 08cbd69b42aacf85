// src/builder/mod.rs

//! Environment Builder: turns a descriptor into an installed package
//!
//! A build runs the descriptor's steps in order into a fresh
//! `<install_root>/<name>/<version>/install` directory:
//!
//! 1. Take the per-package build lock
//! 2. Remove any previous install (no incremental builds)
//! 3. Run each step; the first failure aborts the build
//! 4. Hash the installed files and write the install manifest
//!
//! A failed build leaves no install directory behind (or, with
//! `keep_failed`, moves it to `install.failed`), so the resolver never
//! mistakes a partial build for an installed package.

mod lock;
mod step;

pub use lock::{BuildLock, LOCK_FILE};

use crate::config::LauncherConfig;
use crate::descriptor::{PackageDescriptor, Placeholders};
use crate::error::{Error, Result};
use crate::package::{InstallManifest, InstalledPackage, PackageSpecifier};
use crate::platform::Platform;
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use step::StepRunner;

/// Install directory name inside a version directory
pub const INSTALL_DIR: &str = "install";
/// Where a failed install is kept when `keep_failed` is set
pub const FAILED_INSTALL_DIR: &str = "install.failed";
/// Build log name inside a version directory
pub const BUILD_LOG: &str = "build.log";

/// `<install_root>/<name>/<version>/install`
pub fn install_path(install_root: &Path, name: &str, version: &str) -> PathBuf {
    install_root.join(name).join(version).join(INSTALL_DIR)
}

/// Builds packages from descriptors
#[derive(Debug, Clone)]
pub struct EnvironmentBuilder {
    platform: Platform,
    step_timeout: Duration,
    keep_failed: bool,
}

impl EnvironmentBuilder {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            step_timeout: LauncherConfig::default().step_timeout(),
            keep_failed: false,
        }
    }

    /// Builder configured from launcher settings
    pub fn from_config(config: &LauncherConfig) -> Self {
        Self {
            platform: config.platform(),
            step_timeout: config.step_timeout(),
            keep_failed: config.build.keep_failed,
        }
    }

    /// Timeout for steps that do not declare one
    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = timeout;
        self
    }

    /// Keep failed installs for inspection
    pub fn with_keep_failed(mut self, keep: bool) -> Self {
        self.keep_failed = keep;
        self
    }

    /// Build `descriptor` into `install_root`
    ///
    /// On failure no `InstalledPackage` is produced; a failing step is
    /// reported as `Error::BuildStep` with its zero-based index.
    pub fn build(
        &self,
        descriptor: &PackageDescriptor,
        install_root: &Path,
    ) -> Result<InstalledPackage> {
        let name = descriptor.name();
        let version = descriptor.version();
        let package = descriptor.qualified_name();

        PackageSpecifier::pinned(name, version)?;

        let version_dir = install_root.join(name).join(version);
        fs::create_dir_all(&version_dir)?;
        let lock_path = version_dir.join(LOCK_FILE);
        let _lock = match BuildLock::try_acquire(&lock_path)? {
            Some(lock) => lock,
            None => {
                info!("Waiting for another build of {} to finish", package);
                BuildLock::acquire(&lock_path)?
            }
        };

        let install_path = version_dir.join(INSTALL_DIR);
        if install_path.exists() {
            info!("Removing previous install of {}", package);
            fs::remove_dir_all(&install_path)?;
        }
        fs::create_dir_all(&install_path)?;

        let root = match &descriptor.package.prebuilt {
            Some(prebuilt) => {
                if !prebuilt.exists() {
                    self.discard(&install_path, &package);
                    return Err(Error::NotFound(format!(
                        "prebuilt install {} for {}",
                        prebuilt.display(),
                        package
                    )));
                }
                Some(prebuilt.clone())
            }
            None => None,
        };

        let vars = Placeholders {
            name: name.to_string(),
            version: version.to_string(),
            root: Some(root.clone().unwrap_or_else(|| install_path.clone())),
            install: Some(install_path.clone()),
            source: Some(descriptor.source_dir.clone()),
        };

        let log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(version_dir.join(BUILD_LOG))?;

        let workdir = if descriptor.source_dir.as_os_str().is_empty() {
            install_path.as_path()
        } else {
            descriptor.source_dir.as_path()
        };

        let runner = StepRunner {
            platform: self.platform,
            default_timeout: self.step_timeout,
            workdir,
            vars: &vars,
            env: vec![
                (
                    "REZLAUNCH_BUILD_INSTALL_PATH".to_string(),
                    install_path.to_string_lossy().into_owned(),
                ),
                (
                    "REZLAUNCH_BUILD_SOURCE_PATH".to_string(),
                    descriptor.source_dir.to_string_lossy().into_owned(),
                ),
                ("REZLAUNCH_BUILD_NAME".to_string(), name.to_string()),
                ("REZLAUNCH_BUILD_VERSION".to_string(), version.to_string()),
            ],
            log: &log,
        };

        let total = descriptor.build.len();
        info!("Building {} ({} steps)", package, total);

        for (index, step) in descriptor.build.iter().enumerate() {
            info!("[{}] step {}/{}: {}", package, index + 1, total, step.kind());
            if let Err(cause) = runner.run(step) {
                warn!("[{}] step {} failed: {}", package, index + 1, cause);
                self.discard(&install_path, &package);
                return Err(Error::BuildStep {
                    package,
                    step_index: index,
                    cause,
                });
            }
        }

        let manifest = match self.write_manifest(descriptor, &install_path, root) {
            Ok(manifest) => manifest,
            Err(e) => {
                self.discard(&install_path, &package);
                return Err(e);
            }
        };

        info!(
            "Built {} into {} ({} files)",
            package,
            install_path.display(),
            manifest.files.len()
        );

        Ok(InstalledPackage {
            name: name.to_string(),
            version: crate::version::PackageVersion::parse(version),
            install_path,
            manifest,
        })
    }

    fn write_manifest(
        &self,
        descriptor: &PackageDescriptor,
        install_path: &Path,
        root: Option<PathBuf>,
    ) -> Result<InstallManifest> {
        let mut manifest = InstallManifest::new(descriptor.name(), descriptor.version());
        manifest.root = root;
        manifest.executable = descriptor.package.executable.clone();
        manifest.requires = descriptor.package.requires.clone();
        manifest.environment = descriptor.environment.clone();
        manifest.built_at = Some(Utc::now());
        manifest.descriptor_digest = Some(descriptor_digest(descriptor));
        manifest.files = InstallManifest::scan_files(install_path)?;
        manifest.write(install_path)?;
        Ok(manifest)
    }

    /// Remove (or set aside) a failed install
    fn discard(&self, install_path: &Path, package: &str) {
        let result = if self.keep_failed {
            let failed = install_path.with_file_name(FAILED_INSTALL_DIR);
            if failed.exists() {
                let _ = fs::remove_dir_all(&failed);
            }
            info!("Keeping failed install of {} at {}", package, failed.display());
            fs::rename(install_path, &failed)
        } else {
            fs::remove_dir_all(install_path)
        };

        if let Err(e) = result {
            warn!(
                "Failed to clean up install {} of {}: {}",
                install_path.display(),
                package,
                e
            );
        }
    }
}

/// sha256 over the normalized descriptor
fn descriptor_digest(descriptor: &PackageDescriptor) -> String {
    let normalized = toml::to_string(descriptor).unwrap_or_else(|_| descriptor.qualified_name());
    hex::encode(Sha256::digest(normalized.as_bytes()))
}
