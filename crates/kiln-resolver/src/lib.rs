//! Dependency resolution engine: builds the module graph from declarations,
//! flattens platform constraint sets, reconciles competing versions and
//! rejects cycles.

pub mod conflict;
pub mod error;
pub mod graph;
pub mod platform;
pub mod resolver;

pub use error::ResolutionError;
pub use graph::{DependencyGraph, ResolvedGraph};
pub use resolver::{resolve, Resolution};
