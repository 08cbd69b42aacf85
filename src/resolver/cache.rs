// src/resolver/cache.rs

//! Memoized installed-version scans
//!
//! Scanning a package directory means a `read_dir` plus a non-empty check
//! per version. The cache keeps the result per package name together with
//! a fingerprint of modification times, and reuses it only while the
//! fingerprint is unchanged:
//! - the package directory (versions added or removed)
//! - each version directory (`install/` created or replaced)
//! - each `install/` directory (contents populated or emptied)

use crate::builder::INSTALL_DIR;
use crate::version::PackageVersion;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;
use std::time::SystemTime;
use tracing::debug;

/// Modification times identifying one state of a package directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    package_dir: Option<SystemTime>,
    versions: Vec<(String, Option<SystemTime>, Option<SystemTime>)>,
}

impl Fingerprint {
    /// Fingerprint `<root>/<name>`; a missing directory is a valid state
    pub fn of(package_dir: &Path) -> io::Result<Self> {
        let Some(package_mtime) = mtime(package_dir) else {
            return Ok(Self {
                package_dir: None,
                versions: Vec::new(),
            });
        };

        let mut versions = Vec::new();
        for entry in fs::read_dir(package_dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            let path = entry.path();
            versions.push((name, mtime(&path), mtime(&path.join(INSTALL_DIR))));
        }
        versions.sort();

        Ok(Self {
            package_dir: Some(package_mtime),
            versions,
        })
    }
}

fn mtime(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[derive(Debug, Clone)]
struct CacheEntry {
    fingerprint: Fingerprint,
    versions: Vec<PackageVersion>,
}

/// Cache of installed versions per package name
#[derive(Debug, Default)]
pub struct ResolveCache {
    entries: HashMap<String, CacheEntry>,
    hits: u64,
    misses: u64,
}

impl ResolveCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached versions for `name`, if recorded under `fingerprint`
    pub fn get(&mut self, name: &str, fingerprint: &Fingerprint) -> Option<Vec<PackageVersion>> {
        match self.entries.get(name) {
            Some(entry) if entry.fingerprint == *fingerprint => {
                self.hits += 1;
                Some(entry.versions.clone())
            }
            Some(_) => {
                debug!("Resolve cache entry for {} is stale", name);
                self.misses += 1;
                None
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, name: &str, fingerprint: Fingerprint, versions: Vec<PackageVersion>) {
        self.entries.insert(
            name.to_string(),
            CacheEntry {
                fingerprint,
                versions,
            },
        );
    }

    /// Drop the entry for `name`; returns whether one existed
    pub fn invalidate(&mut self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(hits, misses)` since creation
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_of_missing_dir() {
        let temp = tempfile::tempdir().unwrap();
        let a = Fingerprint::of(&temp.path().join("nothing")).unwrap();
        let b = Fingerprint::of(&temp.path().join("nothing")).unwrap();
        assert_eq!(a, b);
        assert!(a.versions.is_empty());
    }

    #[test]
    fn test_fingerprint_tracks_new_versions() {
        let temp = tempfile::tempdir().unwrap();
        let pkg = temp.path().join("x");
        fs::create_dir_all(pkg.join("1.0").join(INSTALL_DIR)).unwrap();
        let before = Fingerprint::of(&pkg).unwrap();

        fs::create_dir_all(pkg.join("2.0").join(INSTALL_DIR)).unwrap();
        let after = Fingerprint::of(&pkg).unwrap();

        assert_ne!(before, after);
        assert_eq!(after.versions.len(), 2);
    }

    #[test]
    fn test_get_requires_matching_fingerprint() {
        let temp = tempfile::tempdir().unwrap();
        let pkg = temp.path().join("x");
        fs::create_dir_all(pkg.join("1.0").join(INSTALL_DIR)).unwrap();
        let fingerprint = Fingerprint::of(&pkg).unwrap();

        let mut cache = ResolveCache::new();
        cache.insert("x", fingerprint.clone(), vec![PackageVersion::parse("1.0")]);
        assert_eq!(cache.get("x", &fingerprint).unwrap().len(), 1);

        let other = Fingerprint::of(&temp.path().join("missing")).unwrap();
        assert!(cache.get("x", &other).is_none());
        assert_eq!(cache.stats(), (1, 1));
    }

    #[test]
    fn test_invalidate_and_clear() {
        let mut cache = ResolveCache::new();
        let empty = Fingerprint {
            package_dir: None,
            versions: Vec::new(),
        };
        cache.insert("x", empty.clone(), Vec::new());
        cache.insert("y", empty, Vec::new());

        assert!(cache.invalidate("x"));
        assert!(!cache.invalidate("x"));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }
}
