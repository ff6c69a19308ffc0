//! Operation: describe the modules and products of a single package.

use std::fmt::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use pkgraph_core::manifest::{ManifestLoader, TomlManifestLoader, MANIFEST_FILENAME};
use pkgraph_core::module::Module;
use pkgraph_core::package::{Package, Product};
use pkgraph_loading::PackageBuilder;
use pkgraph_util::errors::PkgError;
use pkgraph_util::fs::{FileSystem, LocalFileSystem};

/// Options for `pkgraph describe`.
#[derive(Debug, Default)]
pub struct DescribeOptions {
    /// Print machine-readable JSON instead of text.
    pub json: bool,
    /// Leave test modules out of discovery.
    pub skip_tests: bool,
}

/// What `describe` reports about a package.
#[derive(Debug, Serialize)]
pub struct PackageDescription {
    pub name: String,
    pub path: PathBuf,
    pub dependencies: Vec<DependencySummary>,
    pub modules: Vec<Module>,
    pub products: Vec<Product>,
}

#[derive(Debug, Serialize)]
pub struct DependencySummary {
    pub location: String,
    pub range: String,
}

impl PackageDescription {
    pub fn from_package(package: &Package) -> Self {
        Self {
            name: package.name().to_string(),
            path: package.root().to_path_buf(),
            dependencies: package
                .manifest
                .dependencies
                .iter()
                .map(|d| DependencySummary {
                    location: d.location.clone(),
                    range: d.range.to_string(),
                })
                .collect(),
            modules: package.modules.clone(),
            products: package.products(),
        }
    }

    /// Human-readable rendering, one section per concern.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Package: {}", self.name);
        let _ = writeln!(out, "Path: {}", self.path.display());

        if !self.dependencies.is_empty() {
            let _ = writeln!(out, "\nDependencies:");
            for dep in &self.dependencies {
                let _ = writeln!(out, "  {} {}", dep.location, dep.range);
            }
        }

        let _ = writeln!(out, "\nModules:");
        if self.modules.is_empty() {
            let _ = writeln!(out, "  (none)");
        }
        for module in &self.modules {
            let language = module
                .language
                .map(|l| l.to_string())
                .unwrap_or_else(|| "system".to_string());
            let _ = writeln!(
                out,
                "  {} [{}, {}] c99name={}",
                module.name, module.kind, language, module.c99name
            );
            for source in &module.sources.relative_paths {
                let _ = writeln!(out, "    {}", source.display());
            }
        }

        if !self.products.is_empty() {
            let _ = writeln!(out, "\nProducts:");
            for product in &self.products {
                let implicit = if product.implicit { ", implicit" } else { "" };
                let _ = writeln!(
                    out,
                    "  {} [{}{implicit}]: {}",
                    product.name,
                    product.kind,
                    product.modules.join(", ")
                );
            }
        }
        out
    }
}

/// Load the package rooted at `project_root` through `fs`.
pub fn load_package(
    project_root: &Path,
    include_tests: bool,
    fs: &dyn FileSystem,
) -> miette::Result<Package> {
    if !fs.is_file(&project_root.join(MANIFEST_FILENAME)) {
        return Err(PkgError::Manifest {
            message: format!("No {MANIFEST_FILENAME} found in {}", project_root.display()),
        }
        .into());
    }
    let location = project_root.display().to_string();
    let manifest = TomlManifestLoader::new(fs).load(project_root, &location)?;
    let package = PackageBuilder::new(manifest, project_root, fs).construct(include_tests)?;
    tracing::debug!(
        "discovered {} modules in {}",
        package.modules.len(),
        package.name()
    );
    Ok(package)
}

/// Print the modules and products of the package at `project_root`.
pub fn describe(project_root: &Path, opts: &DescribeOptions) -> miette::Result<()> {
    let package = load_package(project_root, !opts.skip_tests, &LocalFileSystem)?;
    let description = PackageDescription::from_package(&package);

    if opts.json {
        let json = serde_json::to_string_pretty(&description).map_err(|e| PkgError::Generic {
            message: format!("Failed to serialize package description: {e}"),
        })?;
        println!("{json}");
    } else {
        print!("{}", description.render());
    }
    Ok(())
}
