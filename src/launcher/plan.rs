// src/launcher/plan.rs

//! Build ordering for packages missing from a launch
//!
//! Packages are built dependencies-first. Among independent packages the
//! order in which they were added (request order) is kept, so the plan is
//! deterministic.

use crate::error::{Error, Result};
use std::collections::{HashMap, HashSet};

/// Directed graph of packages to build and their unbuilt requirements
#[derive(Debug, Default)]
pub struct BuildGraph {
    /// Package names in insertion order
    order: Vec<String>,
    /// Package name to the names it requires
    edges: HashMap<String, Vec<String>>,
}

impl BuildGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a package with its requirements
    ///
    /// Requirements that are never added themselves are treated as
    /// already available.
    pub fn add_package(&mut self, name: &str, requires: Vec<String>) {
        if !self.edges.contains_key(name) {
            self.order.push(name.to_string());
        }
        self.edges.insert(name.to_string(), requires);
    }

    /// Packages in build order
    ///
    /// Fails with `Error::DependencyCycle` naming the cycle, first package
    /// repeated at the end.
    pub fn build_order(&self) -> Result<Vec<String>> {
        let mut done = HashSet::new();
        let mut stack = Vec::new();
        let mut result = Vec::with_capacity(self.order.len());

        for name in &self.order {
            self.visit(name, &mut done, &mut stack, &mut result)?;
        }

        Ok(result)
    }

    fn visit(
        &self,
        name: &str,
        done: &mut HashSet<String>,
        stack: &mut Vec<String>,
        result: &mut Vec<String>,
    ) -> Result<()> {
        if done.contains(name) {
            return Ok(());
        }

        if let Some(start) = stack.iter().position(|n| n == name) {
            let mut cycle = stack[start..].to_vec();
            cycle.push(name.to_string());
            return Err(Error::DependencyCycle(cycle));
        }

        let Some(requires) = self.edges.get(name) else {
            return Ok(());
        };

        stack.push(name.to_string());
        for dep in requires {
            self.visit(dep, done, stack, result)?;
        }
        stack.pop();

        done.insert(name.to_string());
        result.push(name.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deps(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_dependencies_first() {
        let mut graph = BuildGraph::new();
        graph.add_package("nuke", deps(&["ocio", "python"]));
        graph.add_package("studio_env", deps(&[]));
        graph.add_package("ocio", deps(&["python"]));
        graph.add_package("python", deps(&[]));

        assert_eq!(
            graph.build_order().unwrap(),
            vec!["python", "ocio", "nuke", "studio_env"]
        );
    }

    #[test]
    fn test_unplanned_requirements_ignored() {
        let mut graph = BuildGraph::new();
        graph.add_package("nuke", deps(&["already-installed"]));

        assert_eq!(graph.build_order().unwrap(), vec!["nuke"]);
    }

    #[test]
    fn test_cycle_detected() {
        let mut graph = BuildGraph::new();
        graph.add_package("a", deps(&["b"]));
        graph.add_package("b", deps(&["c"]));
        graph.add_package("c", deps(&["a"]));

        match graph.build_order().unwrap_err() {
            Error::DependencyCycle(cycle) => assert_eq!(cycle, vec!["a", "b", "c", "a"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
