use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for the ambient layers of pkgraph (configuration,
/// locking, command-line plumbing).
///
/// Domain errors (versions, discovery, resolution, graph validation) have
/// their own typed enums in the crates that raise them.
#[derive(Debug, Error, Diagnostic)]
pub enum PkgError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or malformed package manifest (`Package.toml`).
    #[error("Manifest error: {message}")]
    #[diagnostic(help("Check your Package.toml for syntax errors"))]
    Manifest { message: String },

    /// Invalid global configuration.
    #[error("Configuration error: {message}")]
    #[diagnostic(help("Check ~/.pkgraph/config.toml"))]
    Config { message: String },

    /// The shared cache lock could not be acquired or released.
    #[error("Lock error: {message}")]
    Lock { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

/// Convenience alias for `miette::Result<T>`.
pub type PkgResult<T> = miette::Result<T>;
