//! Discover the modules of a package from its directory layout.
//!
//! Supports two layouts:
//! - **Sources**: `<root>/Sources/<Module>/...`, with test modules under
//!   `<root>/Tests/<Module>Tests/...`
//! - **Flat**: sources placed under the package root itself, where `Tests`,
//!   `Packages` and the manifest are reserved
//!
//! Either layout may instead hold source files directly in the sources
//! directory, which makes the whole package one module named after it.

use std::io;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use miette::Diagnostic;
use pkgraph_core::manifest::{Manifest, MANIFEST_FILENAME};
use pkgraph_core::module::{c99name, Language, Module, ModuleKind, Sources};
use pkgraph_core::package::Package;
use pkgraph_util::fs::{is_hidden, FileSystem};
use thiserror::Error;

pub const SOURCES_DIR: &str = "Sources";
pub const TESTS_DIR: &str = "Tests";
pub const PACKAGES_DIR: &str = "Packages";
pub const MODULE_MAP: &str = "module.modulemap";

/// Suffix that every test module name carries and no other module may.
const TEST_SUFFIX: &str = "Tests";

/// Errors raised while discovering the modules of one package.
#[derive(Debug, Error, Diagnostic)]
pub enum ModuleError {
    #[error(
        "the module at {} contains mixed language source files fix: use only a single language within a module",
        .0.display()
    )]
    #[diagnostic(code(pkgraph::module::mixed_sources))]
    MixedSources(PathBuf),

    #[error("the module name '{name}' is invalid: {problem}")]
    #[diagnostic(code(pkgraph::module::invalid_name))]
    InvalidName { name: String, problem: String },

    #[error("the package at {} has an invalid layout: {message}", .path.display())]
    #[diagnostic(
        code(pkgraph::module::invalid_layout),
        help("put every source file inside a module directory, or remove the module directories")
    )]
    InvalidLayout { path: PathBuf, message: String },

    #[error("invalid exclude pattern '{pattern}': {message}")]
    #[diagnostic(code(pkgraph::module::invalid_exclude))]
    InvalidExclude { pattern: String, message: String },

    #[error("failed to read {}: {source}", .path.display())]
    #[diagnostic(code(pkgraph::module::io))]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Builds a [`Package`] from a manifest and the directory it lives in.
pub struct PackageBuilder<'a> {
    manifest: Manifest,
    root: PathBuf,
    fs: &'a dyn FileSystem,
}

impl<'a> PackageBuilder<'a> {
    pub fn new(
        manifest: Manifest,
        package_root: impl Into<PathBuf>,
        fs: &'a dyn FileSystem,
    ) -> Self {
        Self {
            manifest,
            root: package_root.into(),
            fs,
        }
    }

    /// Discover every module of the package. Test modules under `Tests/` are
    /// only collected when `include_tests` is set.
    pub fn construct(&self, include_tests: bool) -> Result<Package, ModuleError> {
        let sources_dir = self.root.join(SOURCES_DIR);
        let flat = !self.fs.is_dir(&sources_dir);
        let inspector = Inspector {
            fs: self.fs,
            root: &self.root,
            flat,
            excludes: compile_excludes(&self.manifest.exclude)?,
        };

        let sources_dir = if flat { self.root.clone() } else { sources_dir };
        tracing::debug!(
            "discovering modules of '{}' in {}",
            self.manifest.name,
            sources_dir.display()
        );

        let mut modules = self.discover_modules(&inspector, &sources_dir)?;
        if include_tests {
            modules.extend(self.discover_test_modules(&inspector)?);
        }

        Ok(Package {
            manifest: self.manifest.clone(),
            version: self.manifest.version.clone(),
            root: self.root.clone(),
            modules,
        })
    }

    fn discover_modules(
        &self,
        inspector: &Inspector<'_>,
        sources_dir: &Path,
    ) -> Result<Vec<Module>, ModuleError> {
        let entries = inspector.entries(sources_dir)?;
        let has_direct_sources = entries
            .iter()
            .any(|p| self.fs.is_file(p) && Language::of_path(p).is_some());
        let has_module_map = self.fs.is_file(&sources_dir.join(MODULE_MAP));

        if has_direct_sources || has_module_map {
            for dir in entries.iter().filter(|p| self.fs.is_dir(p)) {
                if !inspector.collect_sources(dir)?.is_empty() {
                    return Err(ModuleError::InvalidLayout {
                        path: sources_dir.to_path_buf(),
                        message: format!(
                            "unexpected source files in {} next to the module directory '{}'",
                            sources_dir.display(),
                            file_name(dir)
                        ),
                    });
                }
            }
            let module = inspector.module_at(&self.manifest.name, sources_dir, false)?;
            return Ok(module.into_iter().collect());
        }

        let mut modules = Vec::new();
        for dir in entries.iter().filter(|p| self.fs.is_dir(p)) {
            if let Some(module) = inspector.module_at(&file_name(dir), dir, false)? {
                modules.push(module);
            }
        }
        Ok(modules)
    }

    fn discover_test_modules(&self, inspector: &Inspector<'_>) -> Result<Vec<Module>, ModuleError> {
        let tests_dir = self.root.join(TESTS_DIR);
        if !self.fs.is_dir(&tests_dir) {
            return Ok(Vec::new());
        }

        let mut modules = Vec::new();
        for entry in inspector.entries(&tests_dir)? {
            if !self.fs.is_dir(&entry) {
                tracing::warn!(
                    "ignoring {}: test sources belong in a module directory",
                    entry.display()
                );
                continue;
            }
            if let Some(module) = inspector.module_at(&file_name(&entry), &entry, true)? {
                modules.push(module);
            }
        }
        Ok(modules)
    }
}

/// Directory walking shared by every discovery step of one package.
struct Inspector<'a> {
    fs: &'a dyn FileSystem,
    root: &'a Path,
    flat: bool,
    excludes: GlobSet,
}

impl Inspector<'_> {
    /// Entries of `dir` that may hold package content.
    fn entries(&self, dir: &Path) -> Result<Vec<PathBuf>, ModuleError> {
        let entries = self.fs.read_dir(dir).map_err(|source| ModuleError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        Ok(entries
            .into_iter()
            .filter(|p| !is_hidden(p) && !self.is_reserved(p) && !self.is_excluded(p))
            .collect())
    }

    fn is_reserved(&self, path: &Path) -> bool {
        self.flat
            && path.parent() == Some(self.root)
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| [TESTS_DIR, PACKAGES_DIR, MANIFEST_FILENAME].contains(&n))
    }

    fn is_excluded(&self, path: &Path) -> bool {
        path.strip_prefix(self.root)
            .is_ok_and(|relative| self.excludes.is_match(relative))
    }

    /// Compiled source files under `dir`, recursively, relative to `dir`.
    fn collect_sources(&self, dir: &Path) -> Result<Vec<(PathBuf, Language)>, ModuleError> {
        let mut out = Vec::new();
        self.collect_into(dir, dir, &mut out)?;
        Ok(out)
    }

    fn collect_into(
        &self,
        base: &Path,
        dir: &Path,
        out: &mut Vec<(PathBuf, Language)>,
    ) -> Result<(), ModuleError> {
        for path in self.entries(dir)? {
            if self.fs.is_dir(&path) {
                self.collect_into(base, &path, out)?;
            } else if let Some(language) = Language::of_path(&path) {
                if let Ok(relative) = path.strip_prefix(base) {
                    out.push((relative.to_path_buf(), language));
                }
            }
        }
        Ok(())
    }

    /// Build the module rooted at `dir`. Returns `None` for a directory with
    /// neither sources nor a module map.
    fn module_at(&self, name: &str, dir: &Path, test: bool) -> Result<Option<Module>, ModuleError> {
        let c99name = c99name(name).ok_or_else(|| ModuleError::InvalidName {
            name: name.to_string(),
            problem: "module names must not be empty".to_string(),
        })?;
        let files = self.collect_sources(dir)?;

        if files.is_empty() {
            if !self.fs.is_file(&dir.join(MODULE_MAP)) {
                tracing::warn!("skipping {}: no source files found", dir.display());
                return Ok(None);
            }
            check_test_suffix(name, test)?;
            return Ok(Some(Module {
                name: name.to_string(),
                c99name,
                language: None,
                kind: ModuleKind::SystemProvided,
                sources: Sources::empty(dir),
            }));
        }

        let language = files[0].1;
        if files.iter().any(|(_, l)| *l != language) {
            return Err(ModuleError::MixedSources(dir.to_path_buf()));
        }

        let kind = if test {
            ModuleKind::Test
        } else if files.iter().any(|(p, _)| is_entry_point(p, language)) {
            ModuleKind::Executable
        } else {
            ModuleKind::Library
        };
        check_test_suffix(name, test)?;

        tracing::debug!("module '{name}': {kind}, {} source files", files.len());
        Ok(Some(Module {
            name: name.to_string(),
            c99name,
            language: Some(language),
            kind,
            sources: Sources::new(dir, files.into_iter().map(|(p, _)| p).collect()),
        }))
    }
}

fn is_entry_point(relative: &Path, language: Language) -> bool {
    relative.parent() == Some(Path::new(""))
        && relative
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| language.entry_points().contains(&n))
}

fn check_test_suffix(name: &str, test: bool) -> Result<(), ModuleError> {
    let problem = match (test, name.ends_with(TEST_SUFFIX)) {
        (true, false) => "test module names must end in 'Tests'",
        (false, true) => "only test modules may have names ending in 'Tests'",
        _ => return Ok(()),
    };
    Err(ModuleError::InvalidName {
        name: name.to_string(),
        problem: problem.to_string(),
    })
}

fn compile_excludes(patterns: &[String]) -> Result<GlobSet, ModuleError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let trimmed = pattern.trim_end_matches('/');
        let glob = GlobBuilder::new(trimmed)
            .literal_separator(true)
            .build()
            .map_err(|e| ModuleError::InvalidExclude {
                pattern: pattern.clone(),
                message: e.kind().to_string(),
            })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| ModuleError::InvalidExclude {
        pattern: patterns.join(", "),
        message: e.to_string(),
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
