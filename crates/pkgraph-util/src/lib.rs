//! Shared utilities for pkgraph.
//!
//! This crate provides cross-cutting concerns used by all other pkgraph crates:
//! error types, the filesystem capability (real disk and in-memory),
//! hashing, scoped advisory locks for the shared cache, and terminal status
//! output.

pub mod errors;
pub mod fs;
pub mod hash;
pub mod lock;
pub mod progress;
