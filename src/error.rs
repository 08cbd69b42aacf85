// src/error.rs

//! Error types for package resolution, building and launching

use crate::package::PackageSpecifier;
use crate::resolver::ResolutionFailure;
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the rezlaunch library
#[derive(Error, Debug)]
pub enum Error {
    /// Descriptor or installed package absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Descriptor present but not usable
    #[error("Malformed descriptor {}: {reason}", path.display())]
    MalformedDescriptor { path: PathBuf, reason: String },

    /// A build step failed; the build was aborted at `step_index`
    #[error("Build of {package} failed at step {step_index}: {cause}")]
    BuildStep {
        package: String,
        step_index: usize,
        #[source]
        cause: StepError,
    },

    /// Resolution could not satisfy every specifier
    #[error("{0}")]
    Unresolved(ResolutionFailure),

    /// The resolved context could not start the target process
    #[error("Cannot launch {command}: {reason}")]
    LaunchExecution { command: String, reason: String },

    /// Text that does not parse as a package specifier
    #[error("Invalid package specifier '{0}'")]
    InvalidSpecifier(String),

    /// Descriptor requirements form a cycle
    #[error("Dependency cycle between packages: {}", .0.join(" -> "))]
    DependencyCycle(Vec<String>),

    /// Install manifest could not be read or written
    #[error("Install manifest {}: {reason}", path.display())]
    Manifest { path: PathBuf, reason: String },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether building packages can recover from this error
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::NotFound(_) | Error::Unresolved(_))
    }

    /// Specifiers that could not be resolved, if this is a resolution failure
    pub fn unsatisfied(&self) -> &[PackageSpecifier] {
        match self {
            Error::Unresolved(failure) => &failure.unsatisfied,
            _ => &[],
        }
    }
}

/// Why a single build step failed
#[derive(Error, Debug)]
pub enum StepError {
    #[error("{program} exited with status {code:?}")]
    ExitStatus { program: String, code: Option<i32> },

    #[error("{program} timed out after {secs} seconds")]
    Timeout { program: String, secs: u64 },

    #[error("{0}")]
    Unsupported(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl StepError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        StepError::Io {
            context: context.into(),
            source,
        }
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;
