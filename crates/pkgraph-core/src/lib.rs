//! Core data types for pkgraph.
//!
//! This crate defines the values that flow between discovery, resolution and
//! graph building: semantic versions and version ranges, the parsed
//! `Package.toml` manifest, discovered modules, and packages.
//!
//! This crate performs no discovery and no resolution of its own.

pub mod config;
pub mod manifest;
pub mod module;
pub mod package;
pub mod version;
