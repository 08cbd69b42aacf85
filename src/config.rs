// src/config.rs

//! Launcher configuration
//!
//! Settings come from, in increasing precedence:
//! 1. Built-in defaults
//! 2. A TOML file: `$REZLAUNCH_CONFIG`, else `<config dir>/rezlaunch/config.toml`
//! 3. Environment variables (`REZLAUNCH_PACKAGES_PATH`, `REZLAUNCH_PLATFORM`)
//! 4. Command-line flags, applied by the binary
//!
//! ```toml
//! packages_path = "/studio/packages"
//! install_root = "/studio/installs"
//! platform = "linux"
//!
//! [companions]
//! always = ["studio_env"]
//! apps = { nuke = ["ocio-2.1"] }
//!
//! [build]
//! step_timeout_secs = 1800
//! keep_failed = false
//! ```

use crate::error::{Error, Result};
use crate::package::PackageSpecifier;
use crate::platform::Platform;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "REZLAUNCH_CONFIG";
/// Environment variable overriding the package root
pub const PACKAGES_PATH_ENV: &str = "REZLAUNCH_PACKAGES_PATH";
/// Environment variable overriding platform detection
pub const PLATFORM_ENV: &str = "REZLAUNCH_PLATFORM";

/// Default timeout for a single build step (1 hour)
const DEFAULT_STEP_TIMEOUT_SECS: u64 = 60 * 60;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    /// Root holding `<name>/<version>/descriptor` files
    pub packages_path: PathBuf,
    /// Root for `<name>/<version>/install`; defaults to `packages_path`
    pub install_root: Option<PathBuf>,
    /// Platform override; detected from the host when absent
    pub platform: Option<Platform>,
    /// Whether launched processes start from the caller's environment
    pub inherit_environment: bool,
    pub companions: CompanionConfig,
    pub build: BuildConfig,
}

/// Packages resolved alongside a launched application
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanionConfig {
    /// Added to every launch
    pub always: Vec<String>,
    /// Added when launching the named application
    pub apps: BTreeMap<String, Vec<String>>,
}

/// Environment Builder settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Timeout for steps that do not declare their own
    pub step_timeout_secs: u64,
    /// Keep a failed install as `install.failed` instead of deleting it
    pub keep_failed: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            step_timeout_secs: DEFAULT_STEP_TIMEOUT_SECS,
            keep_failed: false,
        }
    }
}

impl Default for LauncherConfig {
    fn default() -> Self {
        let packages_path = dirs::home_dir()
            .map(|home| home.join("packages"))
            .unwrap_or_else(|| PathBuf::from("packages"));

        Self {
            packages_path,
            install_root: None,
            platform: None,
            inherit_environment: true,
            companions: CompanionConfig::default(),
            build: BuildConfig::default(),
        }
    }
}

impl LauncherConfig {
    /// Configuration rooted at `packages_path` with every other default
    pub fn with_packages_path(packages_path: impl Into<PathBuf>) -> Self {
        Self {
            packages_path: packages_path.into(),
            ..Self::default()
        }
    }

    /// Parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse config TOML
    pub fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("rezlaunch").join("config.toml"))
    }

    /// Load the config from the environment of the running process
    pub fn from_env() -> Result<Self> {
        Self::discover(|key| std::env::var(key).ok())
    }

    /// Load the config using `lookup` to read environment variables
    ///
    /// An explicitly named config file must exist; the default location is
    /// optional.
    pub fn discover(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = match lookup(CONFIG_ENV).filter(|p| !p.is_empty()) {
            Some(path) => Self::load(Path::new(&path))?,
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(path) => Self::load(&path)?,
                None => Self::default(),
            },
        };
        config.apply_env(lookup)?;
        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(path) = lookup(PACKAGES_PATH_ENV).filter(|p| !p.is_empty()) {
            debug!("{} overrides packages path: {}", PACKAGES_PATH_ENV, path);
            self.packages_path = PathBuf::from(path);
        }

        if let Some(name) = lookup(PLATFORM_ENV).filter(|p| !p.is_empty()) {
            let platform = Platform::parse(&name).ok_or_else(|| {
                Error::Config(format!("{}: unknown platform '{}'", PLATFORM_ENV, name))
            })?;
            self.platform = Some(platform);
        }

        Ok(())
    }

    /// Directory installs are written to and resolved from
    pub fn install_root(&self) -> &Path {
        self.install_root.as_deref().unwrap_or(&self.packages_path)
    }

    /// Configured or detected platform
    pub fn platform(&self) -> Platform {
        self.platform.unwrap_or_else(Platform::current)
    }

    pub fn step_timeout(&self) -> Duration {
        Duration::from_secs(self.build.step_timeout_secs)
    }

    /// Companion packages for launching `app`, in declaration order
    pub fn companions_for(&self, app: &str) -> Result<Vec<PackageSpecifier>> {
        let per_app = self.companions.apps.get(app).into_iter().flatten();

        self.companions
            .always
            .iter()
            .chain(per_app)
            .map(|spec| {
                PackageSpecifier::parse(spec)
                    .map_err(|_| Error::Config(format!("invalid companion package '{}'", spec)))
            })
            .collect()
    }
}
