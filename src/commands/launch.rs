// src/commands/launch.rs

//! Launch command - resolve, build on demand and start an application

use anyhow::Result;
use rezlaunch::{LaunchOrchestrator, LaunchRequest, LauncherConfig};
use tracing::info;

/// Launch `package` and print the command line
///
/// Returns the application's exit code when `wait` is set.
pub fn cmd_launch(
    config: LauncherConfig,
    package: &str,
    version: Option<&str>,
    args: Vec<String>,
    wait: bool,
) -> Result<Option<i32>> {
    let mut orchestrator = LaunchOrchestrator::new(config);
    let request = LaunchRequest::new(package, version, args);

    let mut report = match orchestrator.launch(request) {
        Ok(report) => report,
        Err(failure) => {
            for built in &failure.built {
                eprintln!("Built {} before the failure", built.qualified_name());
            }
            return Err(failure.into());
        }
    };

    for built in &report.built {
        println!("Built {}", built.qualified_name());
    }
    println!("{}", report.command());

    if !wait {
        return Ok(None);
    }

    info!("Waiting for {} (pid {})", package, report.handle.pid());
    let code = report.handle.wait()?;
    info!("{} exited with {}", package, code);
    Ok(Some(code))
}
