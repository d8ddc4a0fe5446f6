//! Operations behind the `kiln` commands.
//!
//! Each `ops_*` module implements one command on top of a loaded
//! [`WorkspaceContext`]; the CLI only parses arguments and prints.

pub mod compiler;
pub mod context;
pub mod inputs;
pub mod ops_build;
pub mod ops_clean;
pub mod ops_lock;
pub mod ops_plan;
pub mod ops_tree;

pub use compiler::CommandCompiler;
pub use context::WorkspaceContext;
