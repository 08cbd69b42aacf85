// src/builder/step.rs

//! Execution of individual build steps

use crate::descriptor::{BuildStep, Placeholders};
use crate::error::StepError;
use crate::platform::Platform;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;
use tracing::debug;
use wait_timeout::ChildExt;

/// Runs the steps of one build
pub(super) struct StepRunner<'a> {
    pub platform: Platform,
    pub default_timeout: Duration,
    /// Working directory and base for relative paths
    pub workdir: &'a Path,
    pub vars: &'a Placeholders,
    /// Extra environment for spawned processes
    pub env: Vec<(String, String)>,
    /// Build log receiving process output
    pub log: &'a File,
}

impl StepRunner<'_> {
    pub fn run(&self, step: &BuildStep) -> Result<(), StepError> {
        match step {
            BuildStep::Command {
                program,
                args,
                timeout,
            } => {
                let program = self.vars.expand(program);
                let args: Vec<String> = args.iter().map(|a| self.vars.expand(a)).collect();
                self.log_header(&format!("{} {}", program, args.join(" ")));

                let mut command = Command::new(self.program_path(&program));
                command.args(&args);
                self.run_process(command, &program, *timeout)
            }
            BuildStep::Shell { script, timeout } => {
                let script = self.vars.expand(script);
                self.log_header(&script);
                let command = self.platform.shell(&script);
                self.run_process(command, "shell", *timeout)
            }
            BuildStep::Mkdir { path } => {
                let path = self.path(path);
                debug!("mkdir {}", path.display());
                fs::create_dir_all(&path)
                    .map_err(|e| StepError::io(format!("mkdir {}", path.display()), e))
            }
            BuildStep::Copy { from, to } => {
                let (from, to) = (self.path(from), self.path(to));
                debug!("copy {} -> {}", from.display(), to.display());
                create_parent(&to)?;
                fs::copy(&from, &to)
                    .map(|_| ())
                    .map_err(|e| {
                        StepError::io(format!("copy {} to {}", from.display(), to.display()), e)
                    })
            }
            BuildStep::Write {
                path,
                contents,
                mode,
            } => {
                let path = self.path(path);
                debug!("write {}", path.display());
                create_parent(&path)?;
                fs::write(&path, self.vars.expand(contents))
                    .map_err(|e| StepError::io(format!("write {}", path.display()), e))?;
                if let Some(mode) = mode {
                    set_mode(&path, *mode)?;
                }
                Ok(())
            }
            BuildStep::Symlink { target, link } => {
                let target = PathBuf::from(self.vars.expand(target));
                let link = self.path(link);
                debug!("symlink {} -> {}", link.display(), target.display());
                create_parent(&link)?;
                symlink(&target, &link)
            }
        }
    }

    /// Expand placeholders and anchor relative paths at the workdir
    fn path(&self, raw: &str) -> PathBuf {
        let path = PathBuf::from(self.vars.expand(raw));
        if path.is_absolute() {
            path
        } else {
            self.workdir.join(path)
        }
    }

    /// Relative programs with a directory part run from the workdir;
    /// bare names go through PATH lookup.
    fn program_path(&self, program: &str) -> PathBuf {
        let path = Path::new(program);
        if path.is_relative() && path.components().count() > 1 {
            self.workdir.join(path)
        } else {
            path.to_path_buf()
        }
    }

    fn run_process(
        &self,
        mut command: Command,
        program: &str,
        timeout: Option<u64>,
    ) -> Result<(), StepError> {
        let stdout = self
            .log
            .try_clone()
            .map_err(|e| StepError::io("duplicate build log handle", e))?;
        let stderr = self
            .log
            .try_clone()
            .map_err(|e| StepError::io("duplicate build log handle", e))?;

        let mut child = command
            .current_dir(self.workdir)
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .spawn()
            .map_err(|e| StepError::io(format!("failed to start {}", program), e))?;

        let timeout = timeout
            .map(Duration::from_secs)
            .unwrap_or(self.default_timeout);

        let status = child
            .wait_timeout(timeout)
            .map_err(|e| StepError::io(format!("waiting for {}", program), e))?;

        match status {
            Some(status) if status.success() => Ok(()),
            Some(status) => Err(StepError::ExitStatus {
                program: program.to_string(),
                code: status.code(),
            }),
            None => {
                let _ = child.kill();
                let _ = child.wait();
                Err(StepError::Timeout {
                    program: program.to_string(),
                    secs: timeout.as_secs(),
                })
            }
        }
    }

    fn log_header(&self, line: &str) {
        let mut log = self.log;
        if let Err(e) = writeln!(log, "=== {} ===", line) {
            debug!("Failed to write build log: {}", e);
        }
    }
}

fn create_parent(path: &Path) -> Result<(), StepError> {
    match path.parent() {
        Some(parent) => fs::create_dir_all(parent)
            .map_err(|e| StepError::io(format!("mkdir {}", parent.display()), e)),
        None => Ok(()),
    }
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<(), StepError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .map_err(|e| StepError::io(format!("chmod {:o} {}", mode, path.display()), e))
}

#[cfg(not(unix))]
fn set_mode(path: &Path, mode: u32) -> Result<(), StepError> {
    debug!("Ignoring mode {:o} for {} on this platform", mode, path.display());
    Ok(())
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> Result<(), StepError> {
    std::os::unix::fs::symlink(target, link)
        .map_err(|e| StepError::io(format!("symlink {}", link.display()), e))
}

#[cfg(not(unix))]
fn symlink(_target: &Path, link: &Path) -> Result<(), StepError> {
    Err(StepError::Unsupported(format!(
        "symlink {} is only supported on Unix",
        link.display()
    )))
}
