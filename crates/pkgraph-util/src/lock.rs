//! Scoped advisory lock over a shared cache directory.
//!
//! Two tool invocations that share a checkout cache serialize on
//! `<cache>/.<name>.lock`. The lock is an OS-level exclusive lock taken with
//! `fs2`; it is released when the [`CacheLock`] guard is dropped, including on
//! error and unwind paths.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use fs2::FileExt;

use crate::errors::PkgError;

/// Default timeout for lock acquisition.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(30);

/// Polling interval while another process holds the lock.
const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// An exclusive lock on a named cache. Released on drop.
#[derive(Debug)]
pub struct CacheLock {
    path: PathBuf,
    file: Option<File>,
}

impl CacheLock {
    /// Path of the lock file for `name` inside `cache_path`.
    pub fn lock_path(name: &str, cache_path: &Path) -> PathBuf {
        cache_path.join(format!(".{name}.lock"))
    }

    /// Block until the lock is held or `timeout` expires.
    ///
    /// The cache directory is created if it does not exist yet.
    pub fn acquire(name: &str, cache_path: &Path, timeout: Duration) -> Result<Self, PkgError> {
        let path = Self::lock_path(name, cache_path);
        fs::create_dir_all(cache_path).map_err(|e| PkgError::Lock {
            message: format!("cannot create {}: {e}", cache_path.display()),
        })?;

        let deadline = Instant::now() + timeout;
        loop {
            if let Some(lock) = Self::try_acquire_at(&path)? {
                tracing::debug!("acquired cache lock {}", path.display());
                return Ok(lock);
            }
            if Instant::now() >= deadline {
                return Err(PkgError::Lock {
                    message: format!(
                        "timed out after {}s waiting for {}",
                        timeout.as_secs(),
                        path.display()
                    ),
                });
            }
            thread::sleep(LOCK_POLL_INTERVAL);
        }
    }

    /// Take the lock without blocking. `Ok(None)` means another holder has it.
    pub fn try_acquire(name: &str, cache_path: &Path) -> Result<Option<Self>, PkgError> {
        fs::create_dir_all(cache_path).map_err(|e| PkgError::Lock {
            message: format!("cannot create {}: {e}", cache_path.display()),
        })?;
        Self::try_acquire_at(&Self::lock_path(name, cache_path))
    }

    fn try_acquire_at(path: &Path) -> Result<Option<Self>, PkgError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| PkgError::Lock {
                message: format!("cannot open {}: {e}", path.display()),
            })?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self {
                path: path.to_path_buf(),
                file: Some(file),
            })),
            Err(e) if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() => Ok(None),
            Err(e) => Err(PkgError::Lock {
                message: format!("lock failed on {}: {e}", path.display()),
            }),
        }
    }

    /// Whether the lock is still held by this guard.
    pub fn is_held(&self) -> bool {
        self.file.is_some()
    }

    /// Path of the underlying lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock before the guard goes out of scope.
    pub fn release(&mut self) -> Result<(), PkgError> {
        if let Some(file) = self.file.take() {
            FileExt::unlock(&file).map_err(|e| PkgError::Lock {
                message: format!("unlock failed on {}: {e}", self.path.display()),
            })?;
        }
        Ok(())
    }
}

impl Drop for CacheLock {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = FileExt::unlock(&file);
        }
    }
}
