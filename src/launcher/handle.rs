// src/launcher/handle.rs

//! Handle to a launched process

use crate::error::Result;
use std::process::{Child, ExitStatus};
use std::time::Duration;
use tracing::debug;
use wait_timeout::ChildExt;

/// A running (or finished) launched process
///
/// The return code stays `None` until the process has been observed to
/// exit through [`poll`](Self::poll), [`wait`](Self::wait) or
/// [`wait_timeout`](Self::wait_timeout).
#[derive(Debug)]
pub struct LaunchHandle {
    command: String,
    child: Child,
    return_code: Option<i32>,
}

impl LaunchHandle {
    pub(crate) fn new(command: String, child: Child) -> Self {
        Self {
            command,
            child,
            return_code: None,
        }
    }

    /// The command line that was launched
    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Exit code, once observed
    pub fn return_code(&self) -> Option<i32> {
        self.return_code
    }

    /// Check for exit without blocking
    pub fn poll(&mut self) -> Result<Option<i32>> {
        if self.return_code.is_some() {
            return Ok(self.return_code);
        }
        Ok(self.child.try_wait()?.map(|status| self.record(status)))
    }

    /// Block until the process exits
    pub fn wait(&mut self) -> Result<i32> {
        if let Some(code) = self.return_code {
            return Ok(code);
        }
        let status = self.child.wait()?;
        Ok(self.record(status))
    }

    /// Block up to `timeout` for the process to exit
    pub fn wait_timeout(&mut self, timeout: Duration) -> Result<Option<i32>> {
        if self.return_code.is_some() {
            return Ok(self.return_code);
        }
        Ok(self.child.wait_timeout(timeout)?.map(|status| self.record(status)))
    }

    fn record(&mut self, status: ExitStatus) -> i32 {
        let code = exit_code(status);
        debug!("{} exited with {}", self.command, code);
        self.return_code = Some(code);
        code
    }
}

/// Exit code of a finished process; signals map to `128 + signal`
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::process::Command;

    #[test]
    fn test_return_code_unset_until_observed() {
        let child = Command::new("sh").arg("-c").arg("exit 3").spawn().unwrap();
        let mut handle = LaunchHandle::new("sh -c 'exit 3'".to_string(), child);

        assert_eq!(handle.return_code(), None);
        assert_eq!(handle.wait().unwrap(), 3);
        assert_eq!(handle.return_code(), Some(3));
        assert_eq!(handle.poll().unwrap(), Some(3));
    }

    #[test]
    fn test_wait_timeout_on_running_process() {
        let child = Command::new("sleep").arg("5").spawn().unwrap();
        let mut handle = LaunchHandle::new("sleep 5".to_string(), child);

        assert_eq!(handle.wait_timeout(Duration::from_millis(50)).unwrap(), None);
        assert_eq!(handle.return_code(), None);
        handle.child.kill().unwrap();
        assert_eq!(handle.wait().unwrap(), 128 + 9);
    }
}
