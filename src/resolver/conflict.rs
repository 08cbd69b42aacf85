// src/resolver/conflict.rs

//! Resolution failure types
//!
//! A failed resolve is an expected outcome: the orchestrator inspects the
//! unsatisfied specifiers to decide what to build.

use crate::package::PackageSpecifier;
use std::fmt;

/// Two requests for the same package disagree on its version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConflict {
    pub package: String,
    /// Version already selected for the package
    pub selected: String,
    /// Pinned version requested afterwards
    pub requested: String,
    /// `name-version` of the package whose requirement conflicted, if any
    pub required_by: Option<String>,
}

impl fmt::Display for VersionConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} already selected but {}-{} requested",
            self.package, self.selected, self.package, self.requested
        )?;
        if let Some(by) = &self.required_by {
            write!(f, " by {}", by)?;
        }
        Ok(())
    }
}

/// Why a set of specifiers could not be resolved
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionFailure {
    /// Specifiers with no matching installed package, in request order
    pub unsatisfied: Vec<PackageSpecifier>,
    pub conflicts: Vec<VersionConflict>,
}

impl ResolutionFailure {
    /// Whether building the unsatisfied packages could fix this failure
    pub fn is_buildable(&self) -> bool {
        self.conflicts.is_empty() && !self.unsatisfied.is_empty()
    }
}

impl fmt::Display for ResolutionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.unsatisfied.is_empty() {
            let specs: Vec<String> = self.unsatisfied.iter().map(|s| s.to_string()).collect();
            parts.push(format!("unsatisfied: {}", specs.join(", ")));
        }
        for conflict in &self.conflicts {
            parts.push(format!("conflict: {}", conflict));
        }
        write!(f, "Resolution failed ({})", parts.join("; "))
    }
}
