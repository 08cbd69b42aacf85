// src/descriptor/format.rs

//! Descriptor file format definitions
//!
//! Descriptors are TOML files describing how to build a package and how it
//! contributes to a runtime environment. Build logic is plain data: a closed
//! set of step kinds, never executable code loaded at runtime.

use crate::error::Result;
use crate::package::PackageSpecifier;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A complete package descriptor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageDescriptor {
    /// Package metadata
    pub package: PackageSection,

    /// Ordered build steps (may be empty, but must be declared)
    pub build: Vec<BuildStep>,

    /// Environment the package contributes to a resolved context
    #[serde(default)]
    pub environment: Vec<EnvAction>,

    /// Directory the descriptor was loaded from
    #[serde(skip)]
    pub source_dir: PathBuf,
}

impl PackageDescriptor {
    pub fn name(&self) -> &str {
        &self.package.name
    }

    pub fn version(&self) -> &str {
        &self.package.version
    }

    /// `name-version`
    pub fn qualified_name(&self) -> String {
        format!("{}-{}", self.package.name, self.package.version)
    }

    /// Runtime requirements as specifiers
    pub fn requires(&self) -> Result<Vec<PackageSpecifier>> {
        self.package
            .requires
            .iter()
            .map(|r| PackageSpecifier::parse(r))
            .collect()
    }
}

/// Package metadata section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageSection {
    /// Package name
    pub name: String,

    /// Package version
    pub version: String,

    /// Short description
    #[serde(default)]
    pub description: Option<String>,

    /// Program to start on launch (defaults to the package name)
    #[serde(default)]
    pub executable: Option<String>,

    /// Runtime requirements (`name` or `name-version`)
    #[serde(default)]
    pub requires: Vec<String>,

    /// Pre-existing install this package points at instead of its own
    /// install directory
    #[serde(default)]
    pub prebuilt: Option<PathBuf>,
}

/// A single build step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum BuildStep {
    /// Run a program directly with arguments
    Command {
        program: String,
        #[serde(default)]
        args: Vec<String>,
        /// Seconds before the step is killed
        #[serde(default)]
        timeout: Option<u64>,
    },
    /// Run a script through the platform shell
    Shell {
        script: String,
        #[serde(default)]
        timeout: Option<u64>,
    },
    /// Create a directory and its parents
    Mkdir { path: String },
    /// Copy a file
    Copy { from: String, to: String },
    /// Write a file with literal contents
    Write {
        path: String,
        contents: String,
        /// Unix permission bits
        #[serde(default)]
        mode: Option<u32>,
    },
    /// Create a symbolic link (Unix only)
    Symlink { target: String, link: String },
}

impl BuildStep {
    /// Short label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            BuildStep::Command { .. } => "command",
            BuildStep::Shell { .. } => "shell",
            BuildStep::Mkdir { .. } => "mkdir",
            BuildStep::Copy { .. } => "copy",
            BuildStep::Write { .. } => "write",
            BuildStep::Symlink { .. } => "symlink",
        }
    }
}

/// An environment change applied when a package joins a context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum EnvAction {
    /// Replace the variable
    Set { var: String, value: String },
    /// Put the value in front of the current path list
    Prepend { var: String, value: String },
    /// Put the value after the current path list
    Append { var: String, value: String },
}

impl EnvAction {
    pub fn var(&self) -> &str {
        match self {
            EnvAction::Set { var, .. }
            | EnvAction::Prepend { var, .. }
            | EnvAction::Append { var, .. } => var,
        }
    }
}

/// Values substituted for `{key}` placeholders
///
/// Recognised keys: `name`, `version`, `root`, `install`, `source`.
/// Unknown placeholders are left untouched.
#[derive(Debug, Clone, Default)]
pub struct Placeholders {
    pub name: String,
    pub version: String,
    pub root: Option<PathBuf>,
    pub install: Option<PathBuf>,
    pub source: Option<PathBuf>,
}

impl Placeholders {
    /// Placeholders for a package rooted at `root`
    pub fn for_package(name: &str, version: &str, root: &Path) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            root: Some(root.to_path_buf()),
            ..Self::default()
        }
    }

    /// Substitute placeholders in `template`
    pub fn expand(&self, template: &str) -> String {
        let mut result = template.replace("{name}", &self.name);
        result = result.replace("{version}", &self.version);

        let paths = [
            ("{root}", &self.root),
            ("{install}", &self.install),
            ("{source}", &self.source),
        ];
        for (key, value) in paths {
            if let Some(path) = value {
                result = result.replace(key, &path.to_string_lossy());
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_placeholders() {
        let vars = Placeholders {
            name: "nuke".to_string(),
            version: "11.2v3".to_string(),
            root: Some(PathBuf::from("/opt/nuke")),
            install: Some(PathBuf::from("/pkgs/nuke/11.2v3/install")),
            source: None,
        };

        assert_eq!(vars.expand("{root}/bin"), "/opt/nuke/bin");
        assert_eq!(
            vars.expand("PREFIX={install} V={version}"),
            "PREFIX=/pkgs/nuke/11.2v3/install V=11.2v3"
        );
        // Unset and unknown placeholders survive
        assert_eq!(vars.expand("{source}/{other}"), "{source}/{other}");
    }

    #[test]
    fn test_step_kind() {
        let step = BuildStep::Mkdir {
            path: "{install}/bin".to_string(),
        };
        assert_eq!(step.kind(), "mkdir");
    }

    #[test]
    fn test_env_action_var() {
        let action = EnvAction::Append {
            var: "PYTHONPATH".to_string(),
            value: "{root}/python".to_string(),
        };
        assert_eq!(action.var(), "PYTHONPATH");
    }
}
