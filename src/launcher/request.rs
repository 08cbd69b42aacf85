// src/launcher/request.rs

//! Launch requests, states and outcomes

use super::handle::LaunchHandle;
use crate::error::{Error, Result};
use crate::package::{InstalledPackage, PackageSpecifier};
use crate::resolver::ResolvedContext;
use std::fmt;
use tracing::debug;

/// A request to start an application inside a resolved context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    pub package: String,
    /// Exact version, or the latest available when `None`
    pub version: Option<String>,
    /// Arguments passed to the executable
    pub args: Vec<String>,
}

impl LaunchRequest {
    pub fn new(package: &str, version: Option<&str>, args: Vec<String>) -> Self {
        Self {
            package: package.to_string(),
            version: version.map(str::to_string),
            args,
        }
    }

    /// Request with arguments split from a single command-line string
    ///
    /// `"--script 'my comp.nk'"` becomes `["--script", "my comp.nk"]`.
    pub fn with_arg_string(package: &str, version: Option<&str>, args: &str) -> Result<Self> {
        let args = shell_words::split(args)
            .map_err(|e| Error::LaunchExecution {
                command: args.to_string(),
                reason: format!("cannot split arguments: {}", e),
            })?;
        Ok(Self::new(package, version, args))
    }

    /// Specifier for the requested package
    pub fn specifier(&self) -> Result<PackageSpecifier> {
        PackageSpecifier::new(&self.package, self.version.as_deref())
    }
}

/// Orchestrator states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LaunchState {
    Resolving,
    Building,
    Executing,
    Completed,
    Failed,
}

impl LaunchState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LaunchState::Resolving => "resolving",
            LaunchState::Building => "building",
            LaunchState::Executing => "executing",
            LaunchState::Completed => "completed",
            LaunchState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LaunchState::Completed | LaunchState::Failed)
    }
}

impl fmt::Display for LaunchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A launch that reached `Completed`
#[derive(Debug)]
pub struct LaunchReport {
    pub handle: LaunchHandle,
    pub context: ResolvedContext,
    /// Packages built on demand, in build order
    pub built: Vec<InstalledPackage>,
    /// Every state entered, starting with `Resolving`
    pub transitions: Vec<LaunchState>,
}

impl LaunchReport {
    pub fn command(&self) -> &str {
        self.handle.command()
    }

    pub fn return_code(&self) -> Option<i32> {
        self.handle.return_code()
    }
}

/// A launch that reached `Failed`
#[derive(thiserror::Error, Debug)]
#[error("Launch of {package} failed while {phase}: {cause}")]
pub struct LaunchFailure {
    /// Requested package, as `name` or `name-version`
    pub package: String,
    /// State the failure happened in
    pub phase: LaunchState,
    /// Packages successfully built before the failure
    pub built: Vec<InstalledPackage>,
    pub transitions: Vec<LaunchState>,
    #[source]
    pub cause: Error,
}

/// State tracking for a single launch
#[derive(Debug)]
pub(super) struct LaunchRun {
    pub package: String,
    pub state: LaunchState,
    pub transitions: Vec<LaunchState>,
    pub built: Vec<InstalledPackage>,
}

impl LaunchRun {
    pub fn start(package: String) -> Self {
        Self {
            package,
            state: LaunchState::Resolving,
            transitions: vec![LaunchState::Resolving],
            built: Vec::new(),
        }
    }

    pub fn advance(&mut self, next: LaunchState) {
        debug_assert!(!self.state.is_terminal(), "{} already {}", self.package, self.state);
        debug!("[{}] {} -> {}", self.package, self.state, next);
        self.state = next;
        self.transitions.push(next);
    }

    pub fn fail(mut self, cause: Error) -> LaunchFailure {
        let phase = self.state;
        self.advance(LaunchState::Failed);
        LaunchFailure {
            package: self.package,
            phase,
            built: self.built,
            transitions: self.transitions,
            cause,
        }
    }

    pub fn complete(mut self, handle: LaunchHandle, context: ResolvedContext) -> LaunchReport {
        self.advance(LaunchState::Completed);
        LaunchReport {
            handle,
            context,
            built: self.built,
            transitions: self.transitions,
        }
    }
}
