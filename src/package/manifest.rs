// src/package/manifest.rs

//! Install manifest written into every built package
//!
//! The manifest records what the builder produced so the resolver can set
//! up a context without re-reading the descriptor: the package root,
//! runtime requirements, environment actions and the installed files.

use crate::descriptor::EnvAction;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Manifest file name inside an install directory
pub const MANIFEST_FILE: &str = ".manifest.toml";

/// Metadata for an installed package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallManifest {
    pub name: String,
    pub version: String,

    /// Pre-existing install the package points at, when not the install dir
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable: Option<String>,

    #[serde(default)]
    pub requires: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub built_at: Option<DateTime<Utc>>,

    /// sha256 of the descriptor the package was built from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descriptor_digest: Option<String>,

    #[serde(default)]
    pub environment: Vec<EnvAction>,

    #[serde(default)]
    pub files: Vec<ManifestFile>,
}

/// One file under the install directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestFile {
    /// Path relative to the install directory, `/`-separated
    pub path: String,
    pub size: u64,
    pub sha256: String,
}

impl InstallManifest {
    /// Empty manifest for `name-version`
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            root: None,
            executable: None,
            requires: Vec::new(),
            environment: Vec::new(),
            built_at: None,
            descriptor_digest: None,
            files: Vec::new(),
        }
    }

    /// Read the manifest of an install directory, if it has one
    pub fn load(install_path: &Path) -> Result<Option<Self>> {
        let path = install_path.join(MANIFEST_FILE);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        toml::from_str(&content)
            .map(Some)
            .map_err(|e| Error::Manifest {
                path,
                reason: e.to_string(),
            })
    }

    /// Write the manifest into `install_path`
    pub fn write(&self, install_path: &Path) -> Result<()> {
        let path = install_path.join(MANIFEST_FILE);
        let content = toml::to_string_pretty(self).map_err(|e| Error::Manifest {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Hash every regular file under `install_path`, excluding the manifest
    ///
    /// Entries are sorted by path.
    pub fn scan_files(install_path: &Path) -> Result<Vec<ManifestFile>> {
        let mut files = Vec::new();

        for entry in WalkDir::new(install_path).sort_by_file_name() {
            let entry = entry.map_err(|e| Error::Io(io::Error::other(e)))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = match entry.path().strip_prefix(install_path) {
                Ok(rel) => rel,
                Err(_) => continue,
            };
            if relative == Path::new(MANIFEST_FILE) {
                continue;
            }

            let mut hasher = Sha256::new();
            let mut file = File::open(entry.path())?;
            let size = io::copy(&mut file, &mut hasher)?;

            files.push(ManifestFile {
                path: relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/"),
                size,
                sha256: hex::encode(hasher.finalize()),
            });
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_manifest() {
        let temp = tempfile::tempdir().unwrap();
        assert!(InstallManifest::load(temp.path()).unwrap().is_none());
    }

    #[test]
    fn test_write_then_load() {
        let temp = tempfile::tempdir().unwrap();
        let mut manifest = InstallManifest::new("nuke", "11.2v3");
        manifest.executable = Some("Nuke11.2".to_string());
        manifest.requires = vec!["ocio-2.1".to_string()];
        manifest.environment = vec![EnvAction::Prepend {
            var: "PATH".to_string(),
            value: "{root}/bin".to_string(),
        }];
        manifest.built_at = Some(Utc::now());
        manifest.write(temp.path()).unwrap();

        let loaded = InstallManifest::load(temp.path()).unwrap().unwrap();
        assert_eq!(loaded, manifest);
    }

    #[test]
    fn test_corrupt_manifest_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join(MANIFEST_FILE), "name = ").unwrap();
        let err = InstallManifest::load(temp.path()).unwrap_err();
        assert!(matches!(err, Error::Manifest { .. }));
    }

    #[test]
    fn test_scan_files_skips_manifest() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir_all(temp.path().join("bin")).unwrap();
        fs::write(temp.path().join("bin/nuke"), b"#!/bin/sh\n").unwrap();
        fs::write(temp.path().join("README"), b"hello").unwrap();
        InstallManifest::new("nuke", "1.0").write(temp.path()).unwrap();

        let files = InstallManifest::scan_files(temp.path()).unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["README", "bin/nuke"]);
        assert_eq!(files[0].size, 5);
        assert_eq!(
            files[0].sha256,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }
}
