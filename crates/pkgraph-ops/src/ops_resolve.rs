//! Operation: resolve the dependency graph of a package.

use std::path::{Path, PathBuf};

use pkgraph_core::config::GlobalConfig;
use pkgraph_core::manifest::{ManifestLoader, TomlManifestLoader, MANIFEST_FILENAME};
use pkgraph_resolver::cache::CheckoutCache;
use pkgraph_resolver::graph::PackageGraph;
use pkgraph_resolver::resolver::Resolver;
use pkgraph_resolver::source::DirectorySource;
use pkgraph_util::errors::PkgError;
use pkgraph_util::fs::LocalFileSystem;
use pkgraph_util::progress;

/// Options for `pkgraph resolve`.
#[derive(Debug, Default)]
pub struct ResolveOptions {
    /// Maximum tree depth to display.
    pub depth: Option<usize>,
    /// Show how the root reaches this location or package name.
    pub why: Option<String>,
    /// Directory that relative dependency locations are resolved against.
    /// Defaults to the project root.
    pub mirror: Option<PathBuf>,
    /// Checkout cache directory; defaults to the configured one.
    pub cache_dir: Option<PathBuf>,
}

/// Resolve every dependency of the package at `project_root` and load the
/// resulting graph.
pub fn resolve_graph(
    project_root: &Path,
    mirror: &Path,
    cache: CheckoutCache,
) -> miette::Result<PackageGraph> {
    if !project_root.join(MANIFEST_FILENAME).is_file() {
        return Err(PkgError::Manifest {
            message: format!("No {MANIFEST_FILENAME} found in {}", project_root.display()),
        }
        .into());
    }

    let fs = LocalFileSystem;
    let loader = TomlManifestLoader::new(&fs);
    let location = project_root.display().to_string();
    let root = loader.load(project_root, &location)?;

    tracing::debug!(
        "resolving '{}' against {} with cache {}",
        root.name,
        mirror.display(),
        cache.root().display()
    );
    let source = DirectorySource::new(mirror, cache);
    let resolution = Resolver::new(&source, &loader).resolve(&root)?;
    let graph = PackageGraph::build(&resolution, project_root, &fs)?;
    Ok(graph)
}

/// Resolve the package at `project_root` and print its dependency tree.
pub fn resolve(project_root: &Path, opts: &ResolveOptions) -> miette::Result<()> {
    let config = GlobalConfig::load()?;
    let cache_dir = opts.cache_dir.clone().unwrap_or_else(|| config.cache_dir());
    let cache = CheckoutCache::new(cache_dir, config.lock_timeout());
    let mirror = opts
        .mirror
        .clone()
        .unwrap_or_else(|| project_root.to_path_buf());

    progress::status_info("Mirror", &mirror.display().to_string());
    progress::status_info("Checkouts", &cache.root().display().to_string());

    let pb = progress::spinner("Resolving dependencies...");
    let result = resolve_graph(project_root, &mirror, cache);
    pb.finish_and_clear();
    let graph = result?;

    progress::status(
        "Resolved",
        &format!(
            "{} ({} dependencies, {} modules)",
            graph.root().name(),
            graph.len() - 1,
            graph.modules().count()
        ),
    );

    if let Some(ref target) = opts.why {
        match graph.find_path(target) {
            Some(path) => {
                println!("Path to {target}:");
                for (i, package) in path.iter().enumerate() {
                    let indent = "  ".repeat(i);
                    match &package.version {
                        Some(version) => println!("{indent}{} v{version}", package.name()),
                        None => println!("{indent}{}", package.name()),
                    }
                }
            }
            None => progress::status_warn(
                "Missing",
                &format!("'{target}' is not part of the dependency graph"),
            ),
        }
        return Ok(());
    }

    print!("{}", graph.print_tree(opts.depth));
    Ok(())
}
