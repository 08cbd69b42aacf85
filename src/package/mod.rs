// src/package/mod.rs

//! Package identities: requested specifiers and installed instances

mod manifest;

pub use manifest::{InstallManifest, ManifestFile, MANIFEST_FILE};

use crate::error::{Error, Result};
use crate::version::PackageVersion;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// A request for a package, optionally pinned to an exact version
///
/// Textual form is `name` or `name-version`. The version begins after the
/// first `-` that is followed by a digit, so hyphenated names survive:
/// - "nuke-11.2v3" → nuke, pinned 11.2v3
/// - "my-tool" → my-tool, latest
/// - "my-tool-2.0" → my-tool, pinned 2.0
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageSpecifier {
    name: String,
    version: Option<String>,
}

impl PackageSpecifier {
    /// Build a specifier from parts, validating the name
    pub fn new(name: &str, version: Option<&str>) -> Result<Self> {
        if !is_valid_name(name) {
            return Err(Error::InvalidSpecifier(name.to_string()));
        }
        if let Some(v) = version {
            if !is_valid_version(v) {
                return Err(Error::InvalidSpecifier(format!("{}-{}", name, v)));
            }
        }
        Ok(Self {
            name: name.to_string(),
            version: version.map(str::to_string),
        })
    }

    /// Specifier accepting the latest installed version
    pub fn latest(name: &str) -> Result<Self> {
        Self::new(name, None)
    }

    /// Specifier pinned to exactly `version`
    pub fn pinned(name: &str, version: &str) -> Result<Self> {
        Self::new(name, Some(version))
    }

    /// Parse `name` or `name-version`
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let split = s
            .char_indices()
            .find(|&(i, c)| {
                c == '-' && s[i + 1..].starts_with(|n: char| n.is_ascii_digit())
            })
            .map(|(i, _)| i);

        match split {
            Some(i) => Self::new(&s[..i], Some(&s[i + 1..])),
            None => Self::new(s, None),
        }
        .map_err(|_| Error::InvalidSpecifier(s.to_string()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pinned version, if any
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn is_pinned(&self) -> bool {
        self.version.is_some()
    }

    /// Whether an installed `(name, version)` satisfies this specifier
    pub fn matches(&self, name: &str, version: &PackageVersion) -> bool {
        self.name == name
            && self
                .version
                .as_deref()
                .is_none_or(|pinned| pinned == version.as_str())
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with(['-', '.'])
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// Whether `version` can name a directory directly under a package dir
///
/// Separators and leading dots are rejected: the former would escape the
/// package root and the latter are hidden from version scans.
pub(crate) fn is_valid_version(version: &str) -> bool {
    !version.is_empty()
        && !version.starts_with('.')
        && !version
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '/' | '\\'))
}

impl fmt::Display for PackageSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{}-{}", self.name, v),
            None => write!(f, "{}", self.name),
        }
    }
}

impl FromStr for PackageSpecifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A package built and present on disk
#[derive(Debug, Clone, PartialEq)]
pub struct InstalledPackage {
    pub name: String,
    pub version: PackageVersion,
    /// `<install_root>/<name>/<version>/install`
    pub install_path: PathBuf,
    pub manifest: InstallManifest,
}

impl InstalledPackage {
    /// Load the package installed at `install_path`
    ///
    /// An install without a manifest (for example one populated by hand) is
    /// accepted with an empty manifest.
    pub fn open(name: &str, version: &str, install_path: &Path) -> Result<Self> {
        let manifest = InstallManifest::load(install_path)?
            .unwrap_or_else(|| InstallManifest::new(name, version));

        Ok(Self {
            name: name.to_string(),
            version: PackageVersion::parse(version),
            install_path: install_path.to_path_buf(),
            manifest,
        })
    }

    /// Directory the package's environment points at
    ///
    /// This is the pre-existing install for prebuilt packages.
    pub fn root(&self) -> &Path {
        self.manifest.root.as_deref().unwrap_or(&self.install_path)
    }

    /// Whether the builder finished this install
    ///
    /// The manifest is written last, so an install without one was either
    /// populated by hand or left behind by an interrupted build.
    pub fn has_manifest(&self) -> bool {
        self.install_path.join(MANIFEST_FILE).is_file()
    }

    /// `name-version`
    pub fn qualified_name(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }

    /// Program started when this package is launched
    pub fn executable(&self) -> &str {
        self.manifest.executable.as_deref().unwrap_or(&self.name)
    }

    /// Runtime requirements recorded at build time
    pub fn requires(&self) -> Result<Vec<PackageSpecifier>> {
        self.manifest
            .requires
            .iter()
            .map(|r| PackageSpecifier::parse(r))
            .collect()
    }
}
