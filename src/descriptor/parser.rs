// src/descriptor/parser.rs

//! Descriptor file parsing

use crate::descriptor::format::{BuildStep, PackageDescriptor};
use crate::error::{Error, Result};
use crate::package::is_valid_version;
use std::path::Path;

/// Parse a descriptor from a TOML string
///
/// `path` is only used for error reporting and to record the source
/// directory.
pub fn parse_descriptor(content: &str, path: &Path) -> Result<PackageDescriptor> {
    let mut descriptor: PackageDescriptor =
        toml::from_str(content).map_err(|e| Error::MalformedDescriptor {
            path: path.to_path_buf(),
            reason: e.message().to_string(),
        })?;

    descriptor.source_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    Ok(descriptor)
}

/// Check a descriptor for errors the TOML schema cannot express
///
/// Returns non-fatal warnings.
pub fn validate_descriptor(descriptor: &PackageDescriptor, path: &Path) -> Result<Vec<String>> {
    let malformed = |reason: String| Error::MalformedDescriptor {
        path: path.to_path_buf(),
        reason,
    };

    if descriptor.package.name.trim().is_empty() {
        return Err(malformed("package name cannot be empty".to_string()));
    }
    if descriptor.package.version.trim().is_empty() {
        return Err(malformed("package version cannot be empty".to_string()));
    }
    if !is_valid_version(&descriptor.package.version) {
        return Err(malformed(format!(
            "package version '{}' is not a plain directory name",
            descriptor.package.version
        )));
    }

    for requirement in &descriptor.package.requires {
        crate::package::PackageSpecifier::parse(requirement)
            .map_err(|_| malformed(format!("invalid requirement '{}'", requirement)))?;
    }

    for (index, step) in descriptor.build.iter().enumerate() {
        let empty = match step {
            BuildStep::Command { program, .. } => program.is_empty(),
            BuildStep::Shell { script, .. } => script.is_empty(),
            BuildStep::Mkdir { path } => path.is_empty(),
            BuildStep::Copy { from, to } => from.is_empty() || to.is_empty(),
            BuildStep::Write { path, .. } => path.is_empty(),
            BuildStep::Symlink { target, link } => target.is_empty() || link.is_empty(),
        };
        if empty {
            return Err(malformed(format!(
                "build step {} ({}) has an empty operand",
                index,
                step.kind()
            )));
        }
    }

    let mut warnings = Vec::new();
    if descriptor.package.description.is_none() {
        warnings.push("Missing package description".to_string());
    }
    if descriptor.build.is_empty() && descriptor.package.prebuilt.is_none() {
        warnings.push("No build steps and no prebuilt path; the install will be empty".to_string());
    }

    Ok(warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::format::EnvAction;

    const PATH: &str = "/pkgs/nuke/11.2v3/descriptor";

    #[test]
    fn test_parse_valid_descriptor() {
        let content = r#"
[package]
name = "nuke"
version = "11.2v3"
executable = "Nuke11.2"
requires = ["ocio-2.1"]

[[build]]
op = "mkdir"
path = "{install}/bin"

[[build]]
op = "command"
program = "make"
args = ["install", "PREFIX={install}"]
timeout = 600

[[environment]]
action = "prepend"
var = "PATH"
value = "{root}/bin"
"#;

        let descriptor = parse_descriptor(content, Path::new(PATH)).unwrap();
        assert_eq!(descriptor.name(), "nuke");
        assert_eq!(descriptor.version(), "11.2v3");
        assert_eq!(descriptor.build.len(), 2);
        assert_eq!(
            descriptor.build[1],
            BuildStep::Command {
                program: "make".to_string(),
                args: vec!["install".to_string(), "PREFIX={install}".to_string()],
                timeout: Some(600),
            }
        );
        assert_eq!(
            descriptor.environment,
            vec![EnvAction::Prepend {
                var: "PATH".to_string(),
                value: "{root}/bin".to_string(),
            }]
        );
        assert_eq!(descriptor.source_dir, Path::new("/pkgs/nuke/11.2v3"));
    }

    #[test]
    fn test_missing_name_is_malformed() {
        let content = r#"
build = []

[package]
version = "1.0"
"#;
        let err = parse_descriptor(content, Path::new(PATH)).unwrap_err();
        match err {
            Error::MalformedDescriptor { reason, .. } => assert!(reason.contains("name")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_build_is_malformed() {
        let content = r#"
[package]
name = "nuke"
version = "1.0"
"#;
        let err = parse_descriptor(content, Path::new(PATH)).unwrap_err();
        assert!(matches!(err, Error::MalformedDescriptor { .. }));
    }

    #[test]
    fn test_unknown_step_is_malformed() {
        let content = r#"
build = [{ op = "python", code = "import os" }]

[package]
name = "nuke"
version = "1.0"
"#;
        let err = parse_descriptor(content, Path::new(PATH)).unwrap_err();
        assert!(matches!(err, Error::MalformedDescriptor { .. }));
    }

    #[test]
    fn test_validate_rejects_bad_requirement() {
        let content = r#"
build = []

[package]
name = "nuke"
version = "1.0"
requires = ["not a spec"]
"#;
        let descriptor = parse_descriptor(content, Path::new(PATH)).unwrap();
        assert!(validate_descriptor(&descriptor, Path::new(PATH)).is_err());
    }

    #[test]
    fn test_validate_warnings() {
        let content = r#"
build = []

[package]
name = "nuke"
version = "1.0"
"#;
        let descriptor = parse_descriptor(content, Path::new(PATH)).unwrap();
        let warnings = validate_descriptor(&descriptor, Path::new(PATH)).unwrap();
        assert!(warnings.iter().any(|w| w.contains("description")));
        assert!(warnings.iter().any(|w| w.contains("No build steps")));
    }

    #[test]
    fn test_validate_rejects_path_like_version() {
        for version in ["../../outside", ".hidden", "1.0/bin"] {
            let content = format!(
                "build = []\n\n[package]\nname = \"nuke\"\nversion = \"{}\"\n",
                version
            );
            let descriptor = parse_descriptor(&content, Path::new(PATH)).unwrap();
            let err = validate_descriptor(&descriptor, Path::new(PATH)).unwrap_err();
            assert!(
                matches!(err, Error::MalformedDescriptor { .. }),
                "{version} was accepted"
            );
        }
    }
}
