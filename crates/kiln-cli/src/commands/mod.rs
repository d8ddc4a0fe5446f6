//! Command dispatch and handler modules.

mod build;
mod clean;
mod lock;
mod plan;
mod tree;

use miette::Result;

use kiln_core::config::GlobalConfig;
use kiln_ops::WorkspaceContext;
use kiln_util::errors::KilnError;

use crate::cli::{Cli, Command};

/// Route a parsed CLI invocation to the appropriate command handler.
pub async fn dispatch(cli: Cli) -> Result<()> {
    let ctx = load_context(&cli)?;
    tracing::debug!("workspace root {}", ctx.root.display());
    match cli.command {
        Command::Build {
            jobs,
            fail_fast,
            force,
            repository,
        } => build::exec(&ctx, jobs, fail_fast, force, repository).await,
        Command::Plan => plan::exec(&ctx),
        Command::Tree {
            depth,
            why,
            inverted,
            conflicts,
        } => tree::exec(&ctx, depth, why, inverted, conflicts),
        Command::Lock => lock::exec(&ctx, cli.verbose),
        Command::Clean => clean::exec(&ctx),
    }
}

fn load_context(cli: &Cli) -> Result<WorkspaceContext> {
    let cwd = std::env::current_dir().map_err(KilnError::Io)?;
    let config = GlobalConfig::load()?;
    WorkspaceContext::load(cli.manifest_path.as_deref(), &cwd, config)
}
