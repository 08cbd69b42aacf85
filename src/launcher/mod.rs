// src/launcher/mod.rs

//! Launch Orchestrator
//!
//! Turns a [`LaunchRequest`] into a running process inside a resolved
//! context:
//!
//! ```text
//! Resolving ──ok──────────────────────────────> Executing ──> Completed
//!     │                                             ^
//!     └─unsatisfied─> Building ──> Resolving ──ok───┘
//!                        │            │
//!                        └────────────┴──error──> Failed
//! ```
//!
//! Missing packages are built at most once per request; if the second
//! resolve still fails the launch fails. The orchestrator never falls back
//! to the ambient environment and never removes installed packages.

mod handle;
mod plan;
mod request;

pub use handle::LaunchHandle;
pub use plan::BuildGraph;
pub use request::{LaunchFailure, LaunchReport, LaunchRequest, LaunchState};

use crate::builder::EnvironmentBuilder;
use crate::config::LauncherConfig;
use crate::descriptor::{DescriptorStore, PackageDescriptor};
use crate::error::{Error, Result};
use crate::package::{InstalledPackage, PackageSpecifier};
use crate::platform::Platform;
use crate::resolver::{ContextResolver, ResolvedContext};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use request::LaunchRun;

/// Resolves, builds and launches packages
#[derive(Debug)]
pub struct LaunchOrchestrator {
    config: LauncherConfig,
    store: DescriptorStore,
    builder: EnvironmentBuilder,
    resolver: ContextResolver,
}

impl LaunchOrchestrator {
    pub fn new(config: LauncherConfig) -> Self {
        let store = DescriptorStore::new(&config.packages_path);
        let builder = EnvironmentBuilder::from_config(&config);
        let resolver = ContextResolver::from_config(&config);
        Self::with_parts(config, store, builder, resolver)
    }

    /// Orchestrator over explicitly constructed components
    pub fn with_parts(
        config: LauncherConfig,
        store: DescriptorStore,
        builder: EnvironmentBuilder,
        resolver: ContextResolver,
    ) -> Self {
        Self {
            config,
            store,
            builder,
            resolver,
        }
    }

    pub fn config(&self) -> &LauncherConfig {
        &self.config
    }

    pub fn store(&self) -> &DescriptorStore {
        &self.store
    }

    pub fn resolver_mut(&mut self) -> &mut ContextResolver {
        &mut self.resolver
    }

    fn platform(&self) -> Platform {
        self.resolver.platform()
    }

    /// Process a launch request
    ///
    /// Returns once the process has been started; the report's handle
    /// tracks its exit.
    pub fn launch(
        &mut self,
        request: LaunchRequest,
    ) -> std::result::Result<LaunchReport, LaunchFailure> {
        let label = match &request.version {
            Some(version) => format!("{}-{}", request.package, version),
            None => request.package.clone(),
        };
        let mut run = LaunchRun::start(label);

        let specifiers = match self.specifiers(&request) {
            Ok(specifiers) => specifiers,
            Err(e) => return Err(run.fail(e)),
        };

        let context = match self.resolver.resolve(&specifiers) {
            Ok(context) => context,
            Err(Error::Unresolved(failure)) if failure.is_buildable() => {
                info!("{}; building missing packages", failure);
                run.advance(LaunchState::Building);
                if let Err(e) = self.build_missing(&failure.unsatisfied, &mut run.built) {
                    return Err(run.fail(e));
                }

                run.advance(LaunchState::Resolving);
                match self.resolver.resolve(&specifiers) {
                    Ok(context) => context,
                    Err(e) => return Err(run.fail(e)),
                }
            }
            Err(e) => return Err(run.fail(e)),
        };

        run.advance(LaunchState::Executing);
        match self.execute(&context, &request) {
            Ok(handle) => Ok(run.complete(handle, context)),
            Err(e) => Err(run.fail(e)),
        }
    }

    /// The requested package followed by its companion packages
    pub fn specifiers(&self, request: &LaunchRequest) -> Result<Vec<PackageSpecifier>> {
        let mut specifiers = vec![request.specifier()?];
        for companion in self.config.companions_for(&request.package)? {
            if companion.name() != request.package && !specifiers.contains(&companion) {
                specifiers.push(companion);
            }
        }
        Ok(specifiers)
    }

    /// Build every unsatisfied package, dependencies first
    ///
    /// Stops at the first failure.
    pub fn build_missing(
        &mut self,
        unsatisfied: &[PackageSpecifier],
        built: &mut Vec<InstalledPackage>,
    ) -> Result<()> {
        let plan = self.plan_builds(unsatisfied)?;
        let install_root = self.config.install_root().to_path_buf();

        for descriptor in plan {
            let package = self.builder.build(&descriptor, &install_root)?;
            self.resolver.invalidate(descriptor.name());
            built.push(package);
        }

        Ok(())
    }

    /// Descriptors to build for `unsatisfied`, in build order
    ///
    /// Unpinned specifiers use the highest descriptor version. Descriptor
    /// requirements that are not installed join the plan.
    pub fn plan_builds(
        &mut self,
        unsatisfied: &[PackageSpecifier],
    ) -> Result<Vec<PackageDescriptor>> {
        let mut queue: VecDeque<PackageSpecifier> = unsatisfied.iter().cloned().collect();
        let mut descriptors: HashMap<String, PackageDescriptor> = HashMap::new();
        let mut graph = BuildGraph::new();

        while let Some(spec) = queue.pop_front() {
            if let Some(planned) = descriptors.get(spec.name()) {
                if spec.version().is_some_and(|v| v != planned.version()) {
                    warn!(
                        "{} requested but {} already planned",
                        spec,
                        planned.qualified_name()
                    );
                }
                continue;
            }

            let version = match spec.version() {
                Some(version) => version.to_string(),
                None => self
                    .store
                    .latest(spec.name())?
                    .ok_or_else(|| {
                        Error::NotFound(format!(
                            "no descriptor for {} under {}",
                            spec.name(),
                            self.store.root().display()
                        ))
                    })?
                    .to_string(),
            };

            let descriptor = self.store.load(spec.name(), &version)?;
            let mut requires = Vec::new();
            for requirement in descriptor.requires()? {
                if self.resolver.select(&requirement)?.is_some() {
                    continue;
                }
                requires.push(requirement.name().to_string());
                queue.push_back(requirement);
            }

            debug!("Planning build of {}", descriptor.qualified_name());
            graph.add_package(spec.name(), requires);
            descriptors.insert(spec.name().to_string(), descriptor);
        }

        let order = graph.build_order()?;
        info!("Build plan: {}", order.join(", "));

        Ok(order
            .into_iter()
            .filter_map(|name| descriptors.remove(&name))
            .collect())
    }

    /// Start the requested executable inside `context`
    pub fn execute(
        &self,
        context: &ResolvedContext,
        request: &LaunchRequest,
    ) -> Result<LaunchHandle> {
        let package = context.get(&request.package).ok_or_else(|| Error::LaunchExecution {
            command: request.package.clone(),
            reason: "package missing from resolved context".to_string(),
        })?;

        let program = locate_executable(context, package)?;
        let platform = self.platform();
        let command_line = platform.command_line(&program, &request.args);

        let mut command = platform.command(&program, &request.args);
        if !self.config.inherit_environment {
            command.env_clear();
        }
        command.envs(context.environment());

        let child = command.spawn().map_err(|e| Error::LaunchExecution {
            command: command_line.clone(),
            reason: e.to_string(),
        })?;

        info!("Launched {} (pid {})", command_line, child.id());
        Ok(LaunchHandle::new(command_line, child))
    }
}

/// Find the package's executable inside the context
///
/// Absolute paths are used as-is. Paths with a directory part are looked
/// up under each package root. Bare names are searched on the context's
/// `PATH`; on macOS a bare `.app` name matches a bundle directory there.
pub fn locate_executable(context: &ResolvedContext, package: &InstalledPackage) -> Result<PathBuf> {
    let executable = package.executable();
    let path = Path::new(executable);
    let not_found = |reason: String| Error::LaunchExecution {
        command: executable.to_string(),
        reason,
    };

    if path.is_absolute() {
        return if path.exists() {
            Ok(path.to_path_buf())
        } else {
            Err(not_found(format!("{} does not exist", path.display())))
        };
    }

    if path.components().count() > 1 {
        return context
            .packages()
            .iter()
            .map(|p| p.root().join(path))
            .find(|candidate| candidate.exists())
            .ok_or_else(|| not_found("not found under any package root".to_string()));
    }

    let search_path = context.search_path();
    if context.platform() == Platform::Darwin && executable.ends_with(".app") {
        return search_path
            .iter()
            .map(|dir| dir.join(executable))
            .find(|candidate| candidate.is_dir())
            .ok_or_else(|| not_found("application bundle not found on PATH".to_string()));
    }

    let joined = std::env::join_paths(&search_path)
        .map_err(|e| not_found(format!("invalid PATH entry: {}", e)))?;
    let cwd = std::env::current_dir().unwrap_or_else(|_| package.root().to_path_buf());
    which::which_in(executable, Some(joined), cwd)
        .map_err(|e| not_found(format!("not found on the context PATH: {}", e)))
}
