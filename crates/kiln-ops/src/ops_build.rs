//! Operation: build and publish every workspace module.
//!
//! Pipeline: resolve -> check externals -> publish platform BOMs -> plan ->
//! execute (compile + publish per module) -> record fingerprints.

use std::sync::Arc;
use std::time::Instant;

use kiln_repository::{FilePublisher, FileRepository};
use kiln_resolver::platform::Platforms;
use kiln_resolver::Resolution;
use kiln_scheduler::{
    execute, fingerprint, plan, BuildOutcome, BuildResult, ExecuteOptions, ModuleStatus,
};
use kiln_util::errors::KilnError;
use kiln_util::progress::{spinner, status, status_error, status_info, status_warn};
use tokio_util::sync::CancellationToken;

use crate::compiler::CommandCompiler;
use crate::context::WorkspaceContext;
use crate::ops_lock;

/// Options for a build invocation.
#[derive(Debug, Default)]
pub struct BuildOptions {
    /// Overrides `[build] jobs` from the global config.
    pub jobs: Option<usize>,
    /// Cancel waiting modules after the first failure.
    pub fail_fast: bool,
    /// Rebuild even when fingerprints are unchanged.
    pub force: bool,
    /// Publish to this repository instead of `[workspace] publish`.
    pub repository: Option<String>,
}

/// Run the full build pipeline.
///
/// Ctrl-C cancels modules that have not started yet. Returns the per-module
/// result on success and an error describing the failures otherwise.
pub async fn build(ctx: &WorkspaceContext, opts: &BuildOptions) -> miette::Result<BuildResult> {
    let start = Instant::now();

    let pb = spinner("Resolving dependencies");
    let resolution = ctx.resolve();
    pb.finish_and_clear();
    let resolution = resolution?;
    for conflict in resolution.conflicts.iter() {
        status_warn("Reconciled", &conflict.to_string());
    }

    let mut lockfile = ops_lock::lockfile_for(&resolution.graph);
    lockfile.write_to(&ctx.lockfile_path())?;

    let repository = ctx.publish_repository(opts.repository.as_deref())?;
    let target = FileRepository::open(&repository, &ctx.root)?;
    check_externals(ctx, &resolution)?;
    publish_platforms(ctx, &target)?;

    let plan = plan(&resolution.graph);
    let fingerprints_path = ctx.fingerprints_path();
    let mut previous = if opts.force {
        Default::default()
    } else {
        fingerprint::load(&fingerprints_path)
    };
    // Only modules still present in the target repository can be fresh.
    previous.retain(|coordinate, _| target.exists(coordinate));

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling remaining modules");
            on_interrupt.cancel();
        }
    });

    let options = ExecuteOptions::new(repository.clone())
        .with_max_concurrency(opts.jobs.unwrap_or(ctx.config.build.jobs))
        .with_fail_fast(opts.fail_fast || ctx.config.build.fail_fast)
        .with_cancel(cancel)
        .with_previous_fingerprints(previous);
    let order: Vec<_> = plan.order().into_iter().cloned().collect();
    let result = execute(
        plan,
        Arc::new(CommandCompiler::for_workspace(ctx)),
        Arc::new(FilePublisher::new(&ctx.root)),
        options,
    )
    .await;
    interrupt.abort();

    for coordinate in &order {
        let Some(module_status) = result.status(coordinate) else {
            continue;
        };
        let label = coordinate.to_string();
        match module_status {
            ModuleStatus::Published(receipt) => {
                status("Published", &format!("{label} to {}", receipt.repository))
            }
            ModuleStatus::UpToDate => status_info("Fresh", &label),
            ModuleStatus::Failed(e) => status_error("Failed", &format!("{label}: {e}")),
            ModuleStatus::Skipped { dependency } => {
                status_warn("Skipped", &format!("{label} (dependency {dependency} failed)"))
            }
            ModuleStatus::Cancelled => status_warn("Cancelled", &label),
        }
    }

    fingerprint::save(&fingerprints_path, &result.fingerprints).map_err(KilnError::Io)?;

    let failure: Option<miette::Report> = match &result.outcome {
        BuildOutcome::Success => None,
        BuildOutcome::PartialFailure(failures) => Some(
            KilnError::Build {
                message: format!(
                    "{} of {} modules did not build",
                    failures.len(),
                    result.statuses.len()
                ),
            }
            .into(),
        ),
        BuildOutcome::Cancelled => Some(
            KilnError::Build {
                message: "build cancelled".to_string(),
            }
            .into(),
        ),
        BuildOutcome::ResolutionFailed(e) => Some(e.clone().into()),
    };
    if let Some(e) = failure {
        return Err(e);
    }

    status(
        "Finished",
        &format!(
            "{} modules in {:.2}s",
            result.statuses.len(),
            start.elapsed().as_secs_f64()
        ),
    );
    Ok(result)
}

/// Every external coordinate must already be published in some file
/// repository. Network repositories cannot be checked.
fn check_externals(ctx: &WorkspaceContext, resolution: &Resolution) -> miette::Result<()> {
    let externals = resolution.graph.externals();
    if externals.is_empty() {
        return Ok(());
    }
    let mut file_repos = Vec::new();
    let mut remote = Vec::new();
    for repository in ctx.repositories.values() {
        match FileRepository::open(repository, &ctx.root) {
            Ok(repo) => file_repos.push(repo),
            Err(_) => remote.push(repository.name.as_str()),
        }
    }

    let missing: Vec<String> = externals
        .iter()
        .filter(|c| !file_repos.iter().any(|r| r.exists(c)))
        .map(ToString::to_string)
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    if !remote.is_empty() {
        for coordinate in &missing {
            tracing::warn!(
                "{coordinate} not found locally; assuming it is served by {}",
                remote.join(", ")
            );
        }
        return Ok(());
    }
    Err(KilnError::Resolution {
        message: format!(
            "external modules not found in any repository: {}",
            missing.join(", ")
        ),
    }
    .into())
}

/// Publish every declared platform as a BOM with its flattened recommendations.
fn publish_platforms(ctx: &WorkspaceContext, target: &FileRepository) -> miette::Result<()> {
    let sets = &ctx.declarations.constraint_sets;
    let platforms = Platforms::new(sets)?;
    for set in sets {
        let Some(recommendations) = platforms.flattened(&set.name) else {
            continue;
        };
        status("Publishing", &format!("platform {} ({})", set.name, set.coordinate));
        target.publish_platform(set, recommendations)?;
    }
    Ok(())
}
