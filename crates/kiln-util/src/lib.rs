//! Shared utilities for the Kiln build orchestrator.
//!
//! This crate provides cross-cutting concerns used by all other Kiln crates:
//! error types, filesystem helpers, content hashing, process spawning,
//! and terminal status output.

pub mod errors;
pub mod fs;
pub mod hash;
pub mod process;
pub mod progress;
