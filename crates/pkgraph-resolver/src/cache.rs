//! Shared checkout cache.
//!
//! Each checkout lives at `<root>/<digest of location>/<version>/`. Writers
//! serialize on a [`CacheLock`], copy into a hidden staging directory, rename
//! it into place and only then write the completion marker. A checkout
//! directory without the marker was interrupted and is rebuilt.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use pkgraph_core::version::Version;
use pkgraph_util::fs::copy_dir_all;
use pkgraph_util::hash::short_digest;
use pkgraph_util::lock::CacheLock;

use crate::source::FetchError;

const LOCK_NAME: &str = "checkouts";
const MARKER_FILE: &str = ".pkgraph-checkout";

/// Checkout cache rooted at a directory shared between invocations.
#[derive(Debug, Clone)]
pub struct CheckoutCache {
    root: PathBuf,
    lock_timeout: Duration,
}

impl CheckoutCache {
    pub fn new(root: impl Into<PathBuf>, lock_timeout: Duration) -> Self {
        Self {
            root: root.into(),
            lock_timeout,
        }
    }

    /// The root directory of this cache.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where the checkout of `location` at `version` lives.
    pub fn checkout_dir(&self, location: &str, version: &Version) -> PathBuf {
        self.root
            .join(short_digest(location))
            .join(version.to_string())
    }

    /// Whether a finished checkout exists for `location` at `version`.
    pub fn is_complete(&self, location: &str, version: &Version) -> bool {
        self.checkout_dir(location, version)
            .join(MARKER_FILE)
            .is_file()
    }

    /// Return the checkout of `location` at `version`, copying it from
    /// `source` first if the cache has no complete copy.
    pub fn checkout(
        &self,
        location: &str,
        version: &Version,
        source: &Path,
    ) -> Result<PathBuf, FetchError> {
        let fail = |message: String| FetchError::new(location, message);
        let _lock = CacheLock::acquire(LOCK_NAME, &self.root, self.lock_timeout)
            .map_err(|e| fail(e.to_string()))?;

        let dir = self.checkout_dir(location, version);
        if dir.join(MARKER_FILE).is_file() {
            tracing::debug!("reusing checkout {}", dir.display());
            return Ok(dir);
        }
        if dir.exists() {
            tracing::warn!("removing incomplete checkout {}", dir.display());
            fs::remove_dir_all(&dir).map_err(|e| fail(io_message(&dir, e)))?;
        }

        let staging = self.root.join(format!(
            ".staging-{}-{}",
            short_digest(location),
            version
        ));
        if staging.exists() {
            fs::remove_dir_all(&staging).map_err(|e| fail(io_message(&staging, e)))?;
        }
        copy_dir_all(source, &staging).map_err(|e| fail(io_message(source, e)))?;

        if let Some(parent) = dir.parent() {
            fs::create_dir_all(parent).map_err(|e| fail(io_message(parent, e)))?;
        }
        fs::rename(&staging, &dir).map_err(|e| fail(io_message(&dir, e)))?;
        fs::write(dir.join(MARKER_FILE), version.to_string())
            .map_err(|e| fail(io_message(&dir, e)))?;

        tracing::info!("checked out {location} {version} into {}", dir.display());
        Ok(dir)
    }
}

fn io_message(path: &Path, e: std::io::Error) -> String {
    format!("{}: {e}", path.display())
}
