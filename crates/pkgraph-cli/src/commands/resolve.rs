//! Handler for `pkgraph resolve`.

use std::path::{Path, PathBuf};

use miette::Result;

use pkgraph_ops::ops_resolve::{self, ResolveOptions};

pub fn exec(
    project_root: &Path,
    depth: Option<usize>,
    why: Option<String>,
    mirror: Option<PathBuf>,
    cache_dir: Option<PathBuf>,
) -> Result<()> {
    let opts = ResolveOptions {
        depth,
        why,
        mirror,
        cache_dir,
    };
    ops_resolve::resolve(project_root, &opts)
}
