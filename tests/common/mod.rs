// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use rezlaunch::builder::INSTALL_DIR;
use rezlaunch::descriptor::DESCRIPTOR_FILE;
use rezlaunch::package::InstallManifest;
use rezlaunch::{LaunchOrchestrator, LauncherConfig, PackageSpecifier};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary package root holding descriptors and installs.
///
/// Keep the value alive for the duration of the test to prevent cleanup.
pub struct PackageRoot {
    dir: TempDir,
}

impl PackageRoot {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `<root>/<name>/<version>/descriptor`.
    ///
    /// `top` holds top-level keys and tables (`build`, `environment`);
    /// `package_keys` lands in the `[package]` table.
    pub fn write_descriptor(
        &self,
        name: &str,
        version: &str,
        package_keys: &str,
        top: &str,
    ) -> PathBuf {
        let dir = self.path().join(name).join(version);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(DESCRIPTOR_FILE);
        fs::write(
            &path,
            format!(
                "{top}\n\n[package]\nname = \"{name}\"\nversion = \"{version}\"\n{package_keys}\n"
            ),
        )
        .unwrap();
        path
    }

    /// Descriptor with a single step writing a marker file.
    pub fn simple_descriptor(&self, name: &str, version: &str) -> PathBuf {
        self.write_descriptor(
            name,
            version,
            "",
            r#"build = [{ op = "write", path = "{install}/marker", contents = "{name}-{version}" }]"#,
        )
    }

    /// Descriptor whose build installs `bin/<name>` as a POSIX shell script
    /// exiting with `exit_code`, with `bin` prepended to `PATH`.
    pub fn app_descriptor(&self, name: &str, version: &str, exit_code: i32) -> PathBuf {
        let top = format!(
            r##"
[[build]]
op = "mkdir"
path = "{{install}}/bin"

[[build]]
op = "write"
path = "{{install}}/bin/{name}"
contents = "#!/bin/sh\nexit {exit_code}\n"
mode = 493

[[environment]]
action = "prepend"
var = "PATH"
value = "{{root}}/bin"
"##
        );
        self.write_descriptor(name, version, &format!("executable = \"{name}\""), &top)
    }

    /// Populate an install directory directly, bypassing the builder.
    pub fn install(&self, name: &str, version: &str, requires: &[&str]) -> PathBuf {
        let path = self.install_path(name, version);
        fs::create_dir_all(&path).unwrap();
        let mut manifest = InstallManifest::new(name, version);
        manifest.requires = requires.iter().map(|r| r.to_string()).collect();
        manifest.write(&path).unwrap();
        path
    }

    pub fn install_path(&self, name: &str, version: &str) -> PathBuf {
        self.path().join(name).join(version).join(INSTALL_DIR)
    }

    pub fn config(&self) -> LauncherConfig {
        LauncherConfig::with_packages_path(self.path())
    }

    pub fn orchestrator(&self) -> LaunchOrchestrator {
        LaunchOrchestrator::new(self.config())
    }
}

pub fn spec(s: &str) -> PackageSpecifier {
    PackageSpecifier::parse(s).unwrap()
}
