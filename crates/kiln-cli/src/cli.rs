//! CLI argument definitions for Kiln.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "kiln",
    version,
    about = "Build and publish many versions of many modules from one workspace",
    long_about = "Kiln resolves a workspace of modules, including several coexisting \
                  versions of the same module, against platform constraint sets, then \
                  builds and publishes them in dependency order."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to Kiln.toml (default: search upwards from the current directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub manifest_path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build and publish every module in dependency order
    Build {
        /// Maximum number of modules built at once
        #[arg(short, long)]
        jobs: Option<usize>,
        /// Stop scheduling new modules after the first failure
        #[arg(long)]
        fail_fast: bool,
        /// Rebuild modules even if their fingerprints are unchanged
        #[arg(long)]
        force: bool,
        /// Repository to publish to (default: `publish` in [workspace])
        #[arg(long, value_name = "NAME")]
        repository: Option<String>,
    },

    /// Print the build order without building
    Plan,

    /// Print the resolved dependency tree
    Tree {
        /// Maximum depth
        #[arg(long)]
        depth: Option<usize>,
        /// Explain why a module is included
        #[arg(long, value_name = "KEY")]
        why: Option<String>,
        /// Show everything that depends on a module
        #[arg(long, value_name = "KEY")]
        inverted: Option<String>,
        /// Show versions reconciled by platforms
        #[arg(long)]
        conflicts: bool,
    },

    /// Resolve the workspace and regenerate Kiln.lock
    Lock,

    /// Remove fingerprints and build scratch directories
    Clean,
}

pub fn parse() -> Cli {
    Cli::parse()
}
