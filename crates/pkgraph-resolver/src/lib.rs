//! Dependency resolution engine: per-location range intersection,
//! highest-satisfying version selection, cycle detection, the shared
//! checkout cache, and the validated package graph handed to the build stage.

pub mod cache;
pub mod constraint;
pub mod graph;
pub mod resolver;
pub mod source;
