// src/platform/mod.rs

//! Platform-specific launch strategies
//!
//! The platform is selected once (from the host OS or an explicit override)
//! and then decides how a command line is quoted for display, how the
//! target process is spawned, which separator joins path lists, and which
//! shell runs `shell` build steps.

use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fmt;
use std::path::Path;
use std::process::Command;
use std::str::FromStr;

/// Supported host platforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linux,
    Darwin,
    Windows,
}

impl Platform {
    /// Platform of the running host
    ///
    /// Unix flavours other than macOS are treated as Linux.
    pub fn current() -> Self {
        match std::env::consts::OS {
            "macos" => Self::Darwin,
            "windows" => Self::Windows,
            _ => Self::Linux,
        }
    }

    /// Parse a platform name (`linux`, `darwin`/`macos`, `windows`)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "linux" => Some(Self::Linux),
            "darwin" | "macos" | "osx" => Some(Self::Darwin),
            "windows" | "win32" => Some(Self::Windows),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Darwin => "darwin",
            Self::Windows => "windows",
        }
    }

    /// Separator for PATH-like variables
    pub fn path_separator(&self) -> &'static str {
        match self {
            Self::Windows => ";",
            Self::Linux | Self::Darwin => ":",
        }
    }

    /// Quote a single argument for this platform's shell
    pub fn quote(&self, arg: &str) -> String {
        match self {
            Self::Linux | Self::Darwin => shell_words::quote(arg).into_owned(),
            Self::Windows => quote_windows(arg),
        }
    }

    /// Human-readable command line for launching `program` with `args`
    pub fn command_line(&self, program: &Path, args: &[String]) -> String {
        let (program, args) = self.invocation(program, args);
        std::iter::once(program.as_str())
            .chain(args.iter().map(String::as_str))
            .map(|part| self.quote(part))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Process builder for launching `program` with `args`
    pub fn command(&self, program: &Path, args: &[String]) -> Command {
        let (program, args) = self.invocation(program, args);
        let mut command = Command::new(program);
        command.args(args);
        command
    }

    /// Process builder running `script` through the platform shell
    pub fn shell(&self, script: &str) -> Command {
        match self {
            Self::Linux | Self::Darwin => {
                let mut command = Command::new("sh");
                command.arg("-c").arg(script);
                command
            }
            Self::Windows => {
                let mut command = Command::new("cmd");
                command.arg("/C").arg(script);
                command
            }
        }
    }

    /// Program and argument vector actually executed
    ///
    /// macOS application bundles are started through `open` so that
    /// LaunchServices handles them.
    fn invocation(&self, program: &Path, args: &[String]) -> (String, Vec<String>) {
        let program_str = program.to_string_lossy().into_owned();

        if *self == Self::Darwin && program.extension() == Some(OsStr::new("app")) {
            let mut open_args = vec!["-n".to_string(), "-a".to_string(), program_str];
            if !args.is_empty() {
                open_args.push("--args".to_string());
                open_args.extend(args.iter().cloned());
            }
            return ("open".to_string(), open_args);
        }

        (program_str, args.to_vec())
    }
}

/// Quote an argument following `CommandLineToArgvW` rules
fn quote_windows(arg: &str) -> String {
    if !arg.is_empty() && !arg.contains([' ', '\t', '\n', '"']) {
        return arg.to_string();
    }

    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('"');
    let mut backslashes = 0;
    for c in arg.chars() {
        match c {
            '\\' => backslashes += 1,
            '"' => {
                quoted.push_str(&"\\".repeat(backslashes * 2 + 1));
                quoted.push('"');
                backslashes = 0;
            }
            _ => {
                quoted.push_str(&"\\".repeat(backslashes));
                quoted.push(c);
                backslashes = 0;
            }
        }
    }
    quoted.push_str(&"\\".repeat(backslashes * 2));
    quoted.push('"');
    quoted
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown platform '{}'", s))
    }
}
