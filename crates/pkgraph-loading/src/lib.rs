//! Source layout conventions.
//!
//! [`PackageBuilder`] inspects a package directory through a
//! [`FileSystem`](pkgraph_util::fs::FileSystem) and produces the package's
//! modules without any per-module declarations in the manifest.

pub mod convention;

pub use convention::{ModuleError, PackageBuilder};
