//! Command dispatch and handler modules.

mod describe;
mod resolve;

use std::path::PathBuf;

use miette::Result;
use pkgraph_core::manifest::MANIFEST_FILENAME;
use pkgraph_util::errors::PkgError;
use pkgraph_util::fs::find_ancestor_with;

use crate::cli::{Cli, Command};

/// Route a parsed CLI invocation to the appropriate command handler.
pub fn dispatch(cli: Cli) -> Result<()> {
    let project_root = project_root(cli.package_path)?;
    match cli.command {
        Command::Describe { json, skip_tests } => describe::exec(&project_root, json, skip_tests),
        Command::Resolve {
            depth,
            why,
            mirror,
            cache_dir,
        } => resolve::exec(&project_root, depth, why, mirror, cache_dir),
    }
}

/// The explicit `--package-path`, else the nearest directory at or above the
/// current one holding a manifest, else the current directory.
fn project_root(package_path: Option<PathBuf>) -> Result<PathBuf> {
    let cwd = std::env::current_dir().map_err(PkgError::Io)?;
    Ok(match package_path {
        Some(path) if path.is_absolute() => path,
        Some(path) => cwd.join(path),
        None => find_ancestor_with(&cwd, MANIFEST_FILENAME).unwrap_or(cwd),
    })
}
