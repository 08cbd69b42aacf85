// src/resolver/mod.rs

//! Context resolution against installed packages
//!
//! The resolver maps an ordered list of specifiers onto packages already
//! installed under the install root (`<root>/<name>/<version>/install`):
//! - a pinned specifier accepts only that exact version
//! - an unpinned specifier takes the highest installed version
//! - requirements recorded in each selected package's manifest are queued
//!   after the caller's specifiers and resolved breadth-first
//!
//! Resolution is all-or-nothing. Any unsatisfied specifier or version
//! conflict fails the whole resolve with a [`ResolutionFailure`], and no
//! partial context is returned.

mod cache;
mod conflict;
mod context;

pub use cache::{Fingerprint, ResolveCache};
pub use conflict::{ResolutionFailure, VersionConflict};
pub use context::{package_var_prefix, ResolvedContext, RESOLVE_VAR};

use crate::builder::INSTALL_DIR;
use crate::config::LauncherConfig;
use crate::error::{Error, Result};
use crate::package::{InstalledPackage, PackageSpecifier};
use crate::platform::Platform;
use crate::version::PackageVersion;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use context::is_non_empty_dir;

/// Resolves specifiers into contexts
#[derive(Debug)]
pub struct ContextResolver {
    root: PathBuf,
    platform: Platform,
    /// Environment every context starts from
    base_env: BTreeMap<String, String>,
    cache: Option<ResolveCache>,
}

impl ContextResolver {
    /// Resolver over `root` with an empty base environment and no cache
    pub fn new(root: impl Into<PathBuf>, platform: Platform) -> Self {
        Self {
            root: root.into(),
            platform,
            base_env: BTreeMap::new(),
            cache: None,
        }
    }

    /// Resolver configured from launcher settings
    ///
    /// The caller's environment becomes the base environment when
    /// `inherit_environment` is set.
    pub fn from_config(config: &LauncherConfig) -> Self {
        let base_env = if config.inherit_environment {
            std::env::vars().collect()
        } else {
            BTreeMap::new()
        };

        Self::new(config.install_root(), config.platform())
            .with_base_env(base_env)
            .with_cache(ResolveCache::new())
    }

    pub fn with_base_env(mut self, base_env: BTreeMap<String, String>) -> Self {
        self.base_env = base_env;
        self
    }

    pub fn with_cache(mut self, cache: ResolveCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn cache(&self) -> Option<&ResolveCache> {
        self.cache.as_ref()
    }

    /// Forget cached versions of `name`, after building it for example
    pub fn invalidate(&mut self, name: &str) {
        if let Some(cache) = &mut self.cache {
            cache.invalidate(name);
        }
    }

    /// Installed versions of `name`, lowest first
    ///
    /// A version counts as installed when its `install/` directory exists
    /// and is non-empty. Hidden entries are ignored.
    pub fn installed_versions(&mut self, name: &str) -> Result<Vec<PackageVersion>> {
        let package_dir = self.root.join(name);

        let Some(cache) = &mut self.cache else {
            return scan_versions(&package_dir);
        };

        let fingerprint = Fingerprint::of(&package_dir)?;
        if let Some(versions) = cache.get(name, &fingerprint) {
            return Ok(versions);
        }

        let versions = scan_versions(&package_dir)?;
        cache.insert(name, fingerprint, versions.clone());
        Ok(versions)
    }

    /// Installed version selected for `spec`, if any
    pub fn select(&mut self, spec: &PackageSpecifier) -> Result<Option<PackageVersion>> {
        let versions = self.installed_versions(spec.name())?;
        let selected = match spec.version() {
            Some(pinned) => versions.into_iter().find(|v| v.as_str() == pinned),
            None => versions.into_iter().max(),
        };
        Ok(selected)
    }

    /// Open an installed package
    pub fn open(&self, name: &str, version: &PackageVersion) -> Result<InstalledPackage> {
        let install_path = self.root.join(name).join(version.as_str()).join(INSTALL_DIR);
        let package = InstalledPackage::open(name, version.as_str(), &install_path)?;
        if !package.has_manifest() {
            warn!(
                "{} has no install manifest; it may be a partial build (rebuild with `rezlaunch build {} {}`)",
                install_path.display(),
                name,
                version
            );
        }
        Ok(package)
    }

    /// Resolve `specifiers` into a context
    ///
    /// Fails with `Error::Unresolved` when any specifier (or requirement of
    /// a selected package) has no installed match or pins a version other
    /// than the one already selected for that name.
    pub fn resolve(&mut self, specifiers: &[PackageSpecifier]) -> Result<ResolvedContext> {
        let mut queue: VecDeque<(PackageSpecifier, Option<String>)> =
            specifiers.iter().map(|s| (s.clone(), None)).collect();
        let mut selected: Vec<InstalledPackage> = Vec::new();
        let mut by_name: HashMap<String, usize> = HashMap::new();
        let mut failure = ResolutionFailure::default();

        while let Some((spec, required_by)) = queue.pop_front() {
            if let Some(&index) = by_name.get(spec.name()) {
                let existing = &selected[index];
                if !spec.matches(&existing.name, &existing.version) {
                    failure.conflicts.push(VersionConflict {
                        package: existing.name.clone(),
                        selected: existing.version.to_string(),
                        requested: spec.version().unwrap_or_default().to_string(),
                        required_by,
                    });
                }
                continue;
            }

            if failure.unsatisfied.contains(&spec) {
                continue;
            }

            let Some(version) = self.select(&spec)? else {
                debug!("No installed package satisfies {}", spec);
                failure.unsatisfied.push(spec);
                continue;
            };

            let package = self.open(spec.name(), &version)?;
            debug!("{} -> {}", spec, package.install_path.display());

            let origin = package.qualified_name();
            for requirement in package.requires()? {
                queue.push_back((requirement, Some(origin.clone())));
            }

            by_name.insert(package.name.clone(), selected.len());
            selected.push(package);
        }

        if !failure.unsatisfied.is_empty() || !failure.conflicts.is_empty() {
            debug!("{}", failure);
            return Err(Error::Unresolved(failure));
        }

        let context = ResolvedContext::new(selected, &self.base_env, self.platform);
        info!("Resolved context: {}", context.resolve_string());
        Ok(context)
    }
}

/// Scan `<root>/<name>` for installed versions, lowest first
fn scan_versions(package_dir: &Path) -> Result<Vec<PackageVersion>> {
    let entries = match fs::read_dir(package_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut versions = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        if is_non_empty_dir(&entry.path().join(INSTALL_DIR)) {
            versions.push(PackageVersion::parse(&name));
        }
    }

    versions.sort();
    Ok(versions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::InstallManifest;

    fn install(root: &Path, name: &str, version: &str, requires: &[&str]) -> PathBuf {
        let path = root.join(name).join(version).join(INSTALL_DIR);
        fs::create_dir_all(&path).unwrap();
        let mut manifest = InstallManifest::new(name, version);
        manifest.requires = requires.iter().map(|r| r.to_string()).collect();
        manifest.write(&path).unwrap();
        path
    }

    fn spec(s: &str) -> PackageSpecifier {
        PackageSpecifier::parse(s).unwrap()
    }

    fn resolver(root: &Path) -> ContextResolver {
        ContextResolver::new(root, Platform::Linux)
    }

    #[test]
    fn test_highest_version_selected() {
        let temp = tempfile::tempdir().unwrap();
        for v in ["1.0", "1.2", "2.0"] {
            install(temp.path(), "x", v, &[]);
        }

        let context = resolver(temp.path()).resolve(&[spec("x")]).unwrap();
        assert_eq!(context.packages()[0].version.as_str(), "2.0");
    }

    #[test]
    fn test_pinned_version_selected() {
        let temp = tempfile::tempdir().unwrap();
        for v in ["1.0", "1.2", "2.0"] {
            install(temp.path(), "x", v, &[]);
        }

        let context = resolver(temp.path()).resolve(&[spec("x-1.2")]).unwrap();
        assert_eq!(context.packages()[0].version.as_str(), "1.2");
    }

    #[test]
    fn test_all_or_nothing() {
        let temp = tempfile::tempdir().unwrap();
        install(temp.path(), "a", "1.0", &[]);

        let err = resolver(temp.path())
            .resolve(&[spec("a-1.0"), spec("b-2.0")])
            .unwrap_err();
        assert_eq!(err.unsatisfied(), &[spec("b-2.0")]);
    }

    #[test]
    fn test_empty_install_dir_is_not_installed() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir_all(temp.path().join("x").join("1.0").join(INSTALL_DIR)).unwrap();
        install(temp.path(), "x", "0.9", &[]);

        let mut resolver = resolver(temp.path());
        let versions = resolver.installed_versions("x").unwrap();
        assert_eq!(versions, vec![PackageVersion::parse("0.9")]);
    }

    #[test]
    fn test_malformed_version_never_preferred() {
        let temp = tempfile::tempdir().unwrap();
        install(temp.path(), "x", "1.0", &[]);
        install(temp.path(), "x", "latest", &[]);

        let context = resolver(temp.path()).resolve(&[spec("x")]).unwrap();
        assert_eq!(context.packages()[0].version.as_str(), "1.0");
    }

    #[test]
    fn test_requirements_resolved_breadth_first() {
        let temp = tempfile::tempdir().unwrap();
        install(temp.path(), "nuke", "11.2v3", &["ocio-2.1", "python"]);
        install(temp.path(), "ocio", "2.1", &["python-3.11"]);
        install(temp.path(), "python", "3.11", &[]);
        install(temp.path(), "python", "3.12", &[]);

        let err = resolver(temp.path()).resolve(&[spec("nuke")]).unwrap_err();
        match err {
            Error::Unresolved(failure) => {
                assert!(failure.unsatisfied.is_empty());
                assert_eq!(failure.conflicts.len(), 1);
                assert_eq!(failure.conflicts[0].selected, "3.12");
                assert_eq!(failure.conflicts[0].requested, "3.11");
                assert_eq!(failure.conflicts[0].required_by.as_deref(), Some("ocio-2.1"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let context = resolver(temp.path())
            .resolve(&[spec("nuke"), spec("python-3.11")])
            .unwrap();
        assert_eq!(context.resolve_string(), "nuke-11.2v3 python-3.11 ocio-2.1");
    }

    #[test]
    fn test_missing_requirement_is_unsatisfied() {
        let temp = tempfile::tempdir().unwrap();
        install(temp.path(), "nuke", "11.2v3", &["ocio-2.1"]);

        let err = resolver(temp.path()).resolve(&[spec("nuke")]).unwrap_err();
        assert_eq!(err.unsatisfied(), &[spec("ocio-2.1")]);
    }

    #[test]
    fn test_deterministic() {
        let temp = tempfile::tempdir().unwrap();
        install(temp.path(), "a", "1.0", &[]);
        install(temp.path(), "a", "1.1", &[]);
        install(temp.path(), "b", "2.0", &["a"]);

        let mut resolver = resolver(temp.path()).with_cache(ResolveCache::new());
        let first = resolver.resolve(&[spec("b"), spec("a")]).unwrap();
        let second = resolver.resolve(&[spec("b"), spec("a")]).unwrap();
        assert_eq!(first, second);
        assert!(resolver.cache().unwrap().stats().0 > 0);
    }

    #[test]
    fn test_cache_sees_new_install() {
        let temp = tempfile::tempdir().unwrap();
        install(temp.path(), "x", "1.0", &[]);

        let mut resolver = resolver(temp.path()).with_cache(ResolveCache::new());
        assert!(resolver.resolve(&[spec("x-2.0")]).is_err());

        install(temp.path(), "x", "2.0", &[]);
        resolver.invalidate("x");
        let context = resolver.resolve(&[spec("x-2.0")]).unwrap();
        assert_eq!(context.packages()[0].version.as_str(), "2.0");
    }

    #[test]
    fn test_base_environment() {
        let temp = tempfile::tempdir().unwrap();
        install(temp.path(), "x", "1.0", &[]);
        let base: BTreeMap<String, String> =
            [("HOME".to_string(), "/home/artist".to_string())].into_iter().collect();

        let context = resolver(temp.path())
            .with_base_env(base)
            .resolve(&[spec("x")])
            .unwrap();
        assert_eq!(context.var("HOME"), Some("/home/artist"));
        assert_eq!(context.var(RESOLVE_VAR), Some("x-1.0"));
    }
}
