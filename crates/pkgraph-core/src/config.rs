use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use pkgraph_util::errors::PkgError;

/// Environment variable overriding the pkgraph data directory.
pub const HOME_ENV: &str = "PKGRAPH_HOME";

/// Global user configuration loaded from `~/.pkgraph/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Checkout cache configuration from `[cache]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_dir")]
    pub dir: String,
    #[serde(default = "default_lock_timeout", rename = "lock-timeout-secs")]
    pub lock_timeout_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
            lock_timeout_secs: default_lock_timeout(),
        }
    }
}

fn default_cache_dir() -> String {
    "~/.pkgraph/checkouts".to_string()
}

fn default_lock_timeout() -> u64 {
    30
}

impl GlobalConfig {
    /// Load the global configuration from the data directory, or return
    /// defaults if the file doesn't exist.
    pub fn load() -> miette::Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load the configuration at `path`, or defaults if there is no file.
    pub fn load_from(path: &Path) -> miette::Result<Self> {
        if !path.is_file() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| PkgError::Config {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        toml::from_str(&content).map_err(|e| {
            PkgError::Config {
                message: format!("Failed to parse {}: {}", path.display(), e.message()),
            }
            .into()
        })
    }

    /// Returns the default path to the global config file.
    pub fn default_path() -> PathBuf {
        dirs_path().join("config.toml")
    }

    /// The checkout cache directory with a leading `~` expanded.
    pub fn cache_dir(&self) -> PathBuf {
        expand_home(&self.cache.dir)
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_secs(self.cache.lock_timeout_secs)
    }
}

/// Returns the pkgraph data directory: `$PKGRAPH_HOME` if set, else `~/.pkgraph/`.
pub fn dirs_path() -> PathBuf {
    if let Some(home) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(home);
    }
    home_dir().join(".pkgraph")
}

fn home_dir() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home)
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => home_dir().join(rest),
        None if path == "~" => home_dir(),
        None => PathBuf::from(path),
    }
}
