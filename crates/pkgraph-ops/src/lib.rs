//! High-level operations behind the `pkgraph` commands.
//!
//! Each `ops_*` module exposes an options struct and a function taking the
//! project root, so the binary stays a thin argument-parsing layer.

pub mod ops_describe;
pub mod ops_resolve;
