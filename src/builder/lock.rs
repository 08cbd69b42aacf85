// src/builder/lock.rs

//! Per-package build lock
//!
//! Two processes building the same `(name, version)` would write into the
//! same install directory. The builder holds an exclusive `flock` on
//! `<install_root>/<name>/<version>/.build.lock` for the whole build so the
//! second build waits for the first.

use crate::error::Result;
use fs2::FileExt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Lock file name inside a version directory
pub const LOCK_FILE: &str = ".build.lock";

/// Exclusive build lock, released on drop
#[derive(Debug)]
pub struct BuildLock {
    file: File,
    path: PathBuf,
}

impl BuildLock {
    /// Acquire the lock, blocking until it is available
    pub fn acquire<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = File::create(&path)?;
        file.lock_exclusive()?;
        debug!("Acquired build lock at {}", path.display());

        Ok(Self { file, path })
    }

    /// Acquire the lock if no other process holds it
    pub fn try_acquire<P: AsRef<Path>>(path: P) -> Result<Option<Self>> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = File::create(&path)?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self { file, path })),
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                debug!("Build lock already held at {}", path.display());
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for BuildLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            debug!("Failed to release build lock {}: {}", self.path.display(), e);
        }
    }
}
