// src/resolver/context.rs

//! Resolved contexts and their merged environment

use crate::descriptor::{EnvAction, Placeholders};
use crate::package::InstalledPackage;
use crate::platform::Platform;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Variable listing the resolved packages as `name-version` words
pub const RESOLVE_VAR: &str = "REZLAUNCH_RESOLVE";

/// A consistent set of installed packages plus the environment to run in
///
/// Contexts are created by the resolver and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedContext {
    packages: Vec<InstalledPackage>,
    environment: BTreeMap<String, String>,
    platform: Platform,
}

impl ResolvedContext {
    /// Build a context from packages in resolution order
    pub(crate) fn new(
        packages: Vec<InstalledPackage>,
        base_env: &BTreeMap<String, String>,
        platform: Platform,
    ) -> Self {
        let environment = merge_environment(&packages, base_env, platform);
        Self {
            packages,
            environment,
            platform,
        }
    }

    /// Packages in resolution order
    pub fn packages(&self) -> &[InstalledPackage] {
        &self.packages
    }

    pub fn get(&self, name: &str) -> Option<&InstalledPackage> {
        self.packages.iter().find(|p| p.name == name)
    }

    pub fn environment(&self) -> &BTreeMap<String, String> {
        &self.environment
    }

    pub fn var(&self, name: &str) -> Option<&str> {
        match self.platform {
            Platform::Windows => self
                .environment
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str()),
            Platform::Linux | Platform::Darwin => self.environment.get(name).map(String::as_str),
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// `name-version` of every package, space separated
    pub fn resolve_string(&self) -> String {
        self.packages
            .iter()
            .map(InstalledPackage::qualified_name)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Entries of the context's `PATH`
    pub fn search_path(&self) -> Vec<PathBuf> {
        self.var("PATH")
            .map(|path| {
                path.split(self.platform.path_separator())
                    .filter(|entry| !entry.is_empty())
                    .map(PathBuf::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Environment as shell assignments for this platform
    pub fn to_shell(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.environment {
            match self.platform {
                Platform::Linux | Platform::Darwin => {
                    out.push_str(&format!("export {}={}\n", key, self.platform.quote(value)));
                }
                Platform::Windows => out.push_str(&format!("set \"{}={}\"\n", key, value)),
            }
        }
        out
    }
}

/// Environment variable name fragment for a package name
///
/// `my-tool` becomes `MY_TOOL`.
pub fn package_var_prefix(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

fn merge_environment(
    packages: &[InstalledPackage],
    base_env: &BTreeMap<String, String>,
    platform: Platform,
) -> BTreeMap<String, String> {
    let mut env = base_env.clone();
    let separator = platform.path_separator();

    for package in packages {
        let prefix = package_var_prefix(&package.name);
        let root = package.root();
        env.insert(
            format!("REZLAUNCH_{}_ROOT", prefix),
            root.to_string_lossy().into_owned(),
        );
        env.insert(
            format!("REZLAUNCH_{}_VERSION", prefix),
            package.version.to_string(),
        );

        let vars = Placeholders::for_package(&package.name, package.version.as_str(), root);
        for action in &package.manifest.environment {
            let key = existing_key(&env, action.var(), platform);
            let current = env.get(&key).filter(|v| !v.is_empty()).cloned();
            let value = match action {
                EnvAction::Set { value, .. } => vars.expand(value),
                EnvAction::Prepend { value, .. } => match current {
                    Some(current) => format!("{}{}{}", vars.expand(value), separator, current),
                    None => vars.expand(value),
                },
                EnvAction::Append { value, .. } => match current {
                    Some(current) => format!("{}{}{}", current, separator, vars.expand(value)),
                    None => vars.expand(value),
                },
            };
            env.insert(key, value);
        }
    }

    let resolve: Vec<String> = packages.iter().map(InstalledPackage::qualified_name).collect();
    env.insert(RESOLVE_VAR.to_string(), resolve.join(" "));
    env
}

/// Key to update for `var`; Windows variable names are case-insensitive
fn existing_key(env: &BTreeMap<String, String>, var: &str, platform: Platform) -> String {
    if platform == Platform::Windows {
        if let Some(key) = env.keys().find(|k| k.eq_ignore_ascii_case(var)) {
            return key.clone();
        }
    }
    var.to_string()
}

/// Whether `path` holds at least one entry
pub(crate) fn is_non_empty_dir(path: &Path) -> bool {
    std::fs::read_dir(path)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::InstallManifest;

    fn package(name: &str, version: &str, root: &str, env: Vec<EnvAction>) -> InstalledPackage {
        let mut manifest = InstallManifest::new(name, version);
        manifest.environment = env;
        InstalledPackage {
            name: name.to_string(),
            version: crate::version::PackageVersion::parse(version),
            install_path: PathBuf::from(root),
            manifest,
        }
    }

    fn prepend_path(value: &str) -> EnvAction {
        EnvAction::Prepend {
            var: "PATH".to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn test_merge_order_and_package_vars() {
        let base: BTreeMap<String, String> =
            [("PATH".to_string(), "/usr/bin".to_string())].into_iter().collect();
        let packages = vec![
            package(
                "nuke",
                "11.2v3",
                "/pkgs/nuke/11.2v3/install",
                vec![prepend_path("{root}/bin")],
            ),
            package("ocio", "2.1", "/pkgs/ocio/2.1/install", vec![
                prepend_path("{root}/bin"),
                EnvAction::Set {
                    var: "OCIO".to_string(),
                    value: "{root}/config.ocio".to_string(),
                },
            ]),
        ];

        let context = ResolvedContext::new(packages, &base, Platform::Linux);
        assert_eq!(
            context.var("PATH"),
            Some("/pkgs/ocio/2.1/install/bin:/pkgs/nuke/11.2v3/install/bin:/usr/bin")
        );
        assert_eq!(context.var("OCIO"), Some("/pkgs/ocio/2.1/install/config.ocio"));
        assert_eq!(context.var("REZLAUNCH_NUKE_VERSION"), Some("11.2v3"));
        assert_eq!(context.var("REZLAUNCH_OCIO_ROOT"), Some("/pkgs/ocio/2.1/install"));
        assert_eq!(context.var(RESOLVE_VAR), Some("nuke-11.2v3 ocio-2.1"));
        assert_eq!(context.search_path().len(), 3);
    }

    #[test]
    fn test_append_without_existing_value() {
        let packages = vec![package("x", "1.0", "/x", vec![EnvAction::Append {
            var: "PYTHONPATH".to_string(),
            value: "{root}/python".to_string(),
        }])];
        let context = ResolvedContext::new(packages, &BTreeMap::new(), Platform::Linux);
        assert_eq!(context.var("PYTHONPATH"), Some("/x/python"));
    }

    #[test]
    fn test_windows_keys_are_case_insensitive() {
        let base: BTreeMap<String, String> =
            [("Path".to_string(), r"C:\Windows".to_string())].into_iter().collect();
        let packages = vec![package("x", "1.0", r"C:\pkgs\x", vec![prepend_path(r"{root}\bin")])];

        let context = ResolvedContext::new(packages, &base, Platform::Windows);
        assert_eq!(context.var("PATH"), Some(r"C:\pkgs\x\bin;C:\Windows"));
        assert!(!context.environment().contains_key("PATH"));
    }

    #[test]
    fn test_package_var_prefix() {
        assert_eq!(package_var_prefix("my-tool.py"), "MY_TOOL_PY");
        assert_eq!(package_var_prefix("nuke"), "NUKE");
    }

    #[test]
    fn test_shell_exports() {
        let packages = vec![package("x", "1.0", "/opt/my x", Vec::new())];
        let context = ResolvedContext::new(packages, &BTreeMap::new(), Platform::Linux);
        let shell = context.to_shell();
        assert!(shell.contains("export REZLAUNCH_X_ROOT='/opt/my x'\n"));
        assert!(shell.contains("export REZLAUNCH_RESOLVE=x-1.0\n"));
    }
}
