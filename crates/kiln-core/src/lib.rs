//! Core data types for Kiln: versions, coordinates, modules, constraint sets,
//! manifest parsing, global configuration and lockfiles.

pub mod config;
pub mod constraint;
pub mod coordinate;
pub mod dependency;
pub mod lockfile;
pub mod manifest;
pub mod module;
pub mod properties;
pub mod repository;
pub mod source;
pub mod version;
