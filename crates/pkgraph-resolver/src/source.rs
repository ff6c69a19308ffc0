//! Source-control capability consumed by the resolver.

use std::fs;
use std::path::{Path, PathBuf};

use miette::Diagnostic;
use pkgraph_core::version::Version;
use thiserror::Error;

use crate::cache::CheckoutCache;

/// A failure to list or check out a dependency location.
#[derive(Debug, Clone, Error, Diagnostic, PartialEq, Eq)]
#[error("failed to fetch '{location}': {message}")]
#[diagnostic(
    code(pkgraph::fetch),
    help("check that the dependency location exists and is reachable")
)]
pub struct FetchError {
    pub location: String,
    pub message: String,
}

impl FetchError {
    pub fn new(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            message: message.into(),
        }
    }
}

/// Lists and checks out versions of a dependency location.
pub trait SourceControl {
    /// Every version published at `location`, in no particular order.
    fn available_versions(&self, location: &str) -> Result<Vec<Version>, FetchError>;

    /// Materialize `location` at `version` and return the package root.
    fn checkout(&self, location: &str, version: &Version) -> Result<PathBuf, FetchError>;
}

/// A local package mirror: each location is a directory holding one
/// subdirectory per published version, `<location>/<version>/Package.toml`.
///
/// Relative locations are resolved against `base`. Checkouts are copied into
/// the [`CheckoutCache`].
#[derive(Debug, Clone)]
pub struct DirectorySource {
    base: PathBuf,
    cache: CheckoutCache,
}

impl DirectorySource {
    pub fn new(base: impl Into<PathBuf>, cache: CheckoutCache) -> Self {
        Self {
            base: base.into(),
            cache,
        }
    }

    pub fn cache(&self) -> &CheckoutCache {
        &self.cache
    }

    fn location_dir(&self, location: &str) -> PathBuf {
        let path = Path::new(location);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base.join(path)
        }
    }

    /// Version directories of `location`, paired with their parsed version.
    fn version_dirs(&self, location: &str) -> Result<Vec<(Version, PathBuf)>, FetchError> {
        let dir = self.location_dir(location);
        let entries = fs::read_dir(&dir)
            .map_err(|e| FetchError::new(location, format!("{}: {e}", dir.display())))?;

        let mut versions = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| FetchError::new(location, e.to_string()))?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = entry.file_name();
            match name.to_str().map(Version::parse) {
                Some(Ok(version)) => versions.push((version, path)),
                _ => tracing::debug!("ignoring non-version entry {}", path.display()),
            }
        }
        Ok(versions)
    }
}

impl SourceControl for DirectorySource {
    fn available_versions(&self, location: &str) -> Result<Vec<Version>, FetchError> {
        let versions: Vec<Version> = self
            .version_dirs(location)?
            .into_iter()
            .map(|(version, _)| version)
            .collect();
        tracing::debug!("{location}: {} published versions", versions.len());
        Ok(versions)
    }

    fn checkout(&self, location: &str, version: &Version) -> Result<PathBuf, FetchError> {
        let source = self
            .version_dirs(location)?
            .into_iter()
            .find(|(v, _)| v == version)
            .map(|(_, path)| path)
            .ok_or_else(|| {
                FetchError::new(location, format!("version {version} is not published"))
            })?;
        self.cache.checkout(location, version, &source)
    }
}
