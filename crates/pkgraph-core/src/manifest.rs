use std::fmt;
use std::path::{Path, PathBuf};

use miette::Diagnostic;
use pkgraph_util::fs::FileSystem;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::version::{Version, VersionError, VersionRange};

/// File name of the package declaration at every package root.
pub const MANIFEST_FILENAME: &str = "Package.toml";

/// Errors raised while loading a `Package.toml`.
#[derive(Debug, Error, Diagnostic)]
pub enum ManifestError {
    #[error("failed to read {}: {source}", .path.display())]
    #[diagnostic(code(pkgraph::manifest::read))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {message}", .path.display())]
    #[diagnostic(
        code(pkgraph::manifest::parse),
        help("Check your Package.toml for syntax errors")
    )]
    Parse { path: PathBuf, message: String },

    #[error("dependency '{location}' in package '{package}' has an invalid version requirement")]
    #[diagnostic(code(pkgraph::manifest::version))]
    InvalidVersion {
        package: String,
        location: String,
        #[source]
        source: VersionError,
    },
}

/// The parsed declaration of a package.
///
/// Created once per package location by a [`ManifestLoader`]; the only change
/// after construction is attaching the resolved version with
/// [`Manifest::with_version`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub name: String,
    /// Where the package came from: a path or a URL.
    pub location: String,
    pub dependencies: Vec<DependencyDecl>,
    pub products: Vec<ProductDecl>,
    /// Paths relative to the package root that discovery must skip.
    pub exclude: Vec<String>,
    pub version: Option<Version>,
}

/// One declared dependency: a location and the versions acceptable there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyDecl {
    pub location: String,
    pub range: VersionRange,
}

/// A named buildable output composed of modules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDecl {
    pub name: String,
    #[serde(default)]
    pub kind: ProductKind,
    #[serde(default)]
    pub modules: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    #[default]
    Library,
    Executable,
}

impl fmt::Display for ProductKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Library => f.write_str("library"),
            Self::Executable => f.write_str("executable"),
        }
    }
}

/// On-disk shape of `Package.toml`.
#[derive(Debug, Deserialize)]
struct RawManifest {
    package: RawPackage,
    #[serde(default)]
    dependencies: Vec<RawDependency>,
    #[serde(default)]
    products: Vec<ProductDecl>,
}

#[derive(Debug, Deserialize)]
struct RawPackage {
    name: String,
    #[serde(default)]
    exclude: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawDependency {
    location: String,
    version: String,
}

impl Manifest {
    /// A manifest with no dependencies or products.
    pub fn new(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            dependencies: Vec::new(),
            products: Vec::new(),
            exclude: Vec::new(),
            version: None,
        }
    }

    pub fn with_dependency(mut self, location: impl Into<String>, range: VersionRange) -> Self {
        self.dependencies.push(DependencyDecl {
            location: location.into(),
            range,
        });
        self
    }

    pub fn with_product(mut self, product: ProductDecl) -> Self {
        self.products.push(product);
        self
    }

    pub fn with_exclude(mut self, path: impl Into<String>) -> Self {
        self.exclude.push(path.into());
        self
    }

    /// Attach the version this manifest was resolved at.
    pub fn with_version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }

    /// Parse `Package.toml` content. `path` is used for error messages only.
    pub fn parse_toml(content: &str, location: &str, path: &Path) -> Result<Self, ManifestError> {
        let raw: RawManifest = toml::from_str(content).map_err(|e| ManifestError::Parse {
            path: path.to_path_buf(),
            message: e.message().to_string(),
        })?;

        let dependencies = raw
            .dependencies
            .into_iter()
            .map(|dep| {
                let range = VersionRange::parse(&dep.version).map_err(|source| {
                    ManifestError::InvalidVersion {
                        package: raw.package.name.clone(),
                        location: dep.location.clone(),
                        source,
                    }
                })?;
                Ok(DependencyDecl {
                    location: dep.location,
                    range,
                })
            })
            .collect::<Result<Vec<_>, ManifestError>>()?;

        Ok(Self {
            name: raw.package.name,
            location: location.to_string(),
            dependencies,
            products: raw.products,
            exclude: raw.package.exclude,
            version: None,
        })
    }
}

/// Produces [`Manifest`] values from package roots.
pub trait ManifestLoader {
    /// Load the manifest of the package rooted at `package_root`, recording
    /// `location` as where it came from.
    fn load(&self, package_root: &Path, location: &str) -> Result<Manifest, ManifestError>;
}

/// Loads `Package.toml` through a [`FileSystem`] capability.
pub struct TomlManifestLoader<'a> {
    fs: &'a dyn FileSystem,
}

impl<'a> TomlManifestLoader<'a> {
    pub fn new(fs: &'a dyn FileSystem) -> Self {
        Self { fs }
    }
}

impl ManifestLoader for TomlManifestLoader<'_> {
    fn load(&self, package_root: &Path, location: &str) -> Result<Manifest, ManifestError> {
        let path = package_root.join(MANIFEST_FILENAME);
        let content = self
            .fs
            .read_to_string(&path)
            .map_err(|source| ManifestError::Read {
                path: path.clone(),
                source,
            })?;
        tracing::debug!("loaded manifest {}", path.display());
        Manifest::parse_toml(&content, location, &path)
    }
}
