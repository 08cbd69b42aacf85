// src/descriptor/store.rs

//! Descriptor lookup in the `<root>/<name>/<version>/descriptor` layout

use crate::descriptor::format::PackageDescriptor;
use crate::descriptor::parser::{parse_descriptor, validate_descriptor};
use crate::error::{Error, Result};
use crate::package::PackageSpecifier;
use crate::version::PackageVersion;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Descriptor file name inside a version directory
pub const DESCRIPTOR_FILE: &str = "descriptor";

/// Read-only access to package descriptors under a root directory
#[derive(Debug, Clone)]
pub struct DescriptorStore {
    root: PathBuf,
}

impl DescriptorStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where the descriptor for `(name, version)` is expected
    pub fn descriptor_path(&self, name: &str, version: &str) -> PathBuf {
        self.root.join(name).join(version).join(DESCRIPTOR_FILE)
    }

    /// Load and validate the descriptor for `(name, version)`
    ///
    /// Fails with `NotFound` when no descriptor exists and with
    /// `MalformedDescriptor` when it cannot be parsed or disagrees with the
    /// key it was stored under. A key that is not a valid specifier is
    /// rejected before touching the filesystem.
    pub fn load(&self, name: &str, version: &str) -> Result<PackageDescriptor> {
        PackageSpecifier::pinned(name, version)?;
        let path = self.descriptor_path(name, version);

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::NotFound(format!(
                    "descriptor for {}-{} ({})",
                    name,
                    version,
                    path.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };

        let descriptor = parse_descriptor(&content, &path)?;

        for warning in validate_descriptor(&descriptor, &path)? {
            debug!("{}: {}", descriptor.qualified_name(), warning);
        }

        if descriptor.name() != name || descriptor.version() != version {
            return Err(Error::MalformedDescriptor {
                path,
                reason: format!(
                    "declares {} but is stored as {}-{}",
                    descriptor.qualified_name(),
                    name,
                    version
                ),
            });
        }

        Ok(descriptor)
    }

    /// Versions of `name` that have a descriptor, oldest first
    pub fn versions(&self, name: &str) -> Result<Vec<PackageVersion>> {
        let dir = self.root.join(name);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut versions = Vec::new();
        for entry in entries {
            let entry = entry?;
            let Some(version) = entry.file_name().to_str().map(str::to_string) else {
                warn!("Skipping non UTF-8 entry in {}", dir.display());
                continue;
            };
            if version.starts_with('.') {
                continue;
            }
            if entry.path().join(DESCRIPTOR_FILE).is_file() {
                versions.push(PackageVersion::parse(&version));
            }
        }

        versions.sort();
        Ok(versions)
    }

    /// Newest version of `name` with a descriptor
    pub fn latest(&self, name: &str) -> Result<Option<PackageVersion>> {
        Ok(self.versions(name)?.pop())
    }

    /// Package names that have at least one version directory, sorted
    pub fn names(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if !name.starts_with('.') {
                    names.push(name.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_descriptor(root: &Path, name: &str, version: &str, content: &str) {
        let dir = root.join(name).join(version);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(DESCRIPTOR_FILE), content).unwrap();
    }

    fn simple(name: &str, version: &str) -> String {
        format!("build = []\n\n[package]\nname = \"{name}\"\nversion = \"{version}\"\n")
    }

    #[test]
    fn test_load_missing_is_not_found() {
        let temp = tempfile::tempdir().unwrap();
        let store = DescriptorStore::new(temp.path());
        let err = store.load("nuke", "11.2v3").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_load_is_repeatable() {
        let temp = tempfile::tempdir().unwrap();
        write_descriptor(temp.path(), "nuke", "11.2v3", &simple("nuke", "11.2v3"));
        let store = DescriptorStore::new(temp.path());

        let first = store.load("nuke", "11.2v3").unwrap();
        let second = store.load("nuke", "11.2v3").unwrap();
        assert_eq!(first.qualified_name(), second.qualified_name());
        assert_eq!(first.build, second.build);
        assert_eq!(first.source_dir, temp.path().join("nuke").join("11.2v3"));
    }

    #[test]
    fn test_load_rejects_mismatched_key() {
        let temp = tempfile::tempdir().unwrap();
        write_descriptor(temp.path(), "nuke", "11.2v3", &simple("nuke", "12.0v1"));
        let store = DescriptorStore::new(temp.path());
        let err = store.load("nuke", "11.2v3").unwrap_err();
        assert!(matches!(err, Error::MalformedDescriptor { .. }));
    }

    #[test]
    fn test_load_rejects_key_outside_root() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("pkgs");
        write_descriptor(temp.path(), "outside", "descriptor-dir", &simple("x", "1.0"));

        let store = DescriptorStore::new(&root);
        let err = store.load("x", "../../outside/descriptor-dir").unwrap_err();
        assert!(matches!(err, Error::InvalidSpecifier(_)));
        assert!(matches!(store.load("x", ".v1").unwrap_err(), Error::InvalidSpecifier(_)));
    }

    #[test]
    fn test_load_garbage_is_malformed() {
        let temp = tempfile::tempdir().unwrap();
        write_descriptor(temp.path(), "nuke", "1.0", "this is {{ not toml");
        let store = DescriptorStore::new(temp.path());
        let err = store.load("nuke", "1.0").unwrap_err();
        assert!(matches!(err, Error::MalformedDescriptor { .. }));
    }

    #[test]
    fn test_versions_sorted() {
        let temp = tempfile::tempdir().unwrap();
        for version in ["1.2", "2.0", "1.0"] {
            write_descriptor(temp.path(), "x", version, &simple("x", version));
        }
        // Version directory without a descriptor is ignored
        fs::create_dir_all(temp.path().join("x").join("3.0")).unwrap();

        let store = DescriptorStore::new(temp.path());
        let versions: Vec<String> = store
            .versions("x")
            .unwrap()
            .iter()
            .map(|v| v.to_string())
            .collect();
        assert_eq!(versions, vec!["1.0", "1.2", "2.0"]);
        assert_eq!(store.latest("x").unwrap().unwrap().as_str(), "2.0");
        assert!(store.versions("missing").unwrap().is_empty());
    }

    #[test]
    fn test_names() {
        let temp = tempfile::tempdir().unwrap();
        write_descriptor(temp.path(), "nuke", "1.0", &simple("nuke", "1.0"));
        write_descriptor(temp.path(), "maya", "2024", &simple("maya", "2024"));
        let store = DescriptorStore::new(temp.path());
        assert_eq!(store.names().unwrap(), vec!["maya", "nuke"]);
    }
}
