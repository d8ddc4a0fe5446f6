//! Concurrent execution of a build plan.
//!
//! Every step runs as its own task. A step waits on the completion channels
//! of its direct dependencies, then takes a permit from a shared semaphore
//! and runs compile followed by publish on the blocking pool. Each step owns
//! the sender of its channel and writes its terminal state exactly once.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use kiln_core::constraint::ConstraintSet;
use kiln_core::coordinate::Coordinate;
use kiln_core::module::Module;
use kiln_core::repository::Repository;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::collaborator::{CompileError, Compiler, PublishError, Publisher};
use crate::fingerprint::Fingerprint;
use crate::outcome::{BuildError, BuildOutcome, BuildResult, ModuleStatus};
use crate::plan::{self, BuildPlan, PlannedModule};

/// Settings for one execution.
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Upper bound on steps compiling or publishing at the same time.
    pub max_concurrency: usize,
    /// Destination handed to the publisher.
    pub repository: Repository,
    /// Cancelling stops every step that has not started compiling.
    pub cancel: CancellationToken,
    /// Cancel the run after the first failed step.
    pub fail_fast: bool,
    /// Fingerprints recorded by the previous successful builds.
    pub previous_fingerprints: BTreeMap<Coordinate, Fingerprint>,
}

impl ExecuteOptions {
    pub fn new(repository: Repository) -> Self {
        Self {
            max_concurrency: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            repository,
            cancel: CancellationToken::new(),
            fail_fast: false,
            previous_fingerprints: BTreeMap::new(),
        }
    }

    pub fn with_max_concurrency(mut self, jobs: usize) -> Self {
        self.max_concurrency = jobs;
        self
    }

    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_previous_fingerprints(
        mut self,
        fingerprints: BTreeMap<Coordinate, Fingerprint>,
    ) -> Self {
        self.previous_fingerprints = fingerprints;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepState {
    Pending,
    Succeeded,
    Failed,
    Cancelled,
}

struct StepContext<C, P> {
    compiler: Arc<C>,
    publisher: Arc<P>,
    repository: Arc<Repository>,
    semaphore: Arc<Semaphore>,
    cancel: CancellationToken,
    fail_fast: bool,
    previous: BTreeMap<Coordinate, Fingerprint>,
}

/// Execute a plan. Every step ends with exactly one status in the result.
pub async fn execute<C, P>(
    plan: BuildPlan,
    compiler: Arc<C>,
    publisher: Arc<P>,
    options: ExecuteOptions,
) -> BuildResult
where
    C: Compiler + 'static,
    P: Publisher + 'static,
{
    let ctx = Arc::new(StepContext {
        compiler,
        publisher,
        repository: Arc::new(options.repository),
        semaphore: Arc::new(Semaphore::new(options.max_concurrency.max(1))),
        cancel: options.cancel,
        fail_fast: options.fail_fast,
        previous: options.previous_fingerprints,
    });

    let mut senders = HashMap::new();
    let mut receivers = HashMap::new();
    for step in &plan.steps {
        let (tx, rx) = watch::channel(StepState::Pending);
        senders.insert(step.coordinate.clone(), tx);
        receivers.insert(step.coordinate.clone(), rx);
    }

    let planned: Vec<Coordinate> = plan.steps.iter().map(|s| s.coordinate.clone()).collect();
    let mut join_set = JoinSet::new();
    for step in plan.steps {
        let Some(done) = senders.remove(&step.coordinate) else {
            continue;
        };
        let waits: Vec<(Coordinate, watch::Receiver<StepState>)> = step
            .dependencies
            .iter()
            .filter_map(|d| receivers.get(d).map(|rx| (d.clone(), rx.clone())))
            .collect();
        join_set.spawn(run_step(step, waits, done, Arc::clone(&ctx)));
    }
    drop(receivers);

    let mut statuses = BTreeMap::new();
    let mut fingerprints = BTreeMap::new();
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((coordinate, status, fingerprint)) => {
                if status.is_success() {
                    fingerprints.insert(coordinate.clone(), fingerprint);
                }
                statuses.insert(coordinate, status);
            }
            Err(e) => tracing::error!("build task aborted: {e}"),
        }
    }
    for coordinate in planned {
        statuses.entry(coordinate).or_insert_with(|| {
            ModuleStatus::Failed(BuildError::Compile(CompileError::new("build task aborted")))
        });
    }

    let outcome = BuildOutcome::from_statuses(ctx.cancel.is_cancelled(), &statuses);
    BuildResult {
        outcome,
        statuses,
        fingerprints,
    }
}

async fn run_step<C, P>(
    step: PlannedModule,
    waits: Vec<(Coordinate, watch::Receiver<StepState>)>,
    done: watch::Sender<StepState>,
    ctx: Arc<StepContext<C, P>>,
) -> (Coordinate, ModuleStatus, Fingerprint)
where
    C: Compiler + 'static,
    P: Publisher + 'static,
{
    let step = Arc::new(step);
    let status = build_step(Arc::clone(&step), waits, &ctx).await;

    let state = match &status {
        ModuleStatus::Published(_) | ModuleStatus::UpToDate => StepState::Succeeded,
        ModuleStatus::Failed(_) | ModuleStatus::Skipped { .. } => StepState::Failed,
        ModuleStatus::Cancelled => StepState::Cancelled,
    };
    if ctx.fail_fast && matches!(status, ModuleStatus::Failed(_)) {
        tracing::info!("{} failed, cancelling remaining steps", step.coordinate);
        ctx.cancel.cancel();
    }
    done.send_replace(state);

    tracing::debug!("{}: {status}", step.coordinate);
    (step.coordinate.clone(), status, step.fingerprint.clone())
}

async fn build_step<C, P>(
    step: Arc<PlannedModule>,
    waits: Vec<(Coordinate, watch::Receiver<StepState>)>,
    ctx: &StepContext<C, P>,
) -> ModuleStatus
where
    C: Compiler + 'static,
    P: Publisher + 'static,
{
    for (dependency, mut rx) in waits {
        let state = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => return ModuleStatus::Cancelled,
            changed = async { rx.wait_for(|s| *s != StepState::Pending).await.map(|s| *s) } => {
                changed.unwrap_or(StepState::Failed)
            }
        };
        match state {
            StepState::Succeeded => {}
            StepState::Cancelled => return ModuleStatus::Cancelled,
            StepState::Failed | StepState::Pending => {
                return ModuleStatus::Skipped { dependency };
            }
        }
    }

    if ctx.cancel.is_cancelled() {
        return ModuleStatus::Cancelled;
    }
    if ctx.previous.get(&step.coordinate) == Some(&step.fingerprint) {
        return ModuleStatus::UpToDate;
    }

    let _permit = tokio::select! {
        biased;
        _ = ctx.cancel.cancelled() => return ModuleStatus::Cancelled,
        permit = Arc::clone(&ctx.semaphore).acquire_owned() => match permit {
            Ok(permit) => permit,
            Err(_) => return ModuleStatus::Cancelled,
        },
    };
    if ctx.cancel.is_cancelled() {
        return ModuleStatus::Cancelled;
    }

    let compiler = Arc::clone(&ctx.compiler);
    let planned = Arc::clone(&step);
    let artifact = match tokio::task::spawn_blocking(move || compiler.compile(&planned)).await {
        Ok(Ok(artifact)) => artifact,
        Ok(Err(e)) => return ModuleStatus::Failed(BuildError::Compile(e)),
        Err(e) => {
            return ModuleStatus::Failed(BuildError::Compile(CompileError::new(format!(
                "compiler panicked: {e}"
            ))))
        }
    };

    let publisher = Arc::clone(&ctx.publisher);
    let repository = Arc::clone(&ctx.repository);
    let coordinate = step.coordinate.clone();
    let published = tokio::task::spawn_blocking(move || {
        publisher.publish(&artifact, &coordinate, &repository)
    })
    .await;
    match published {
        Ok(Ok(receipt)) => ModuleStatus::Published(receipt),
        Ok(Err(e)) => ModuleStatus::Failed(BuildError::Publish(e)),
        Err(e) => ModuleStatus::Failed(BuildError::Publish(PublishError::new(format!(
            "publisher panicked: {e}"
        )))),
    }
}

/// Resolve, plan and execute in one go.
///
/// Resolution errors are reported as [`BuildOutcome::ResolutionFailed`]
/// before any module is built.
pub async fn build<C, P>(
    modules: &[Module],
    constraint_sets: &[ConstraintSet],
    compiler: Arc<C>,
    publisher: Arc<P>,
    options: ExecuteOptions,
) -> BuildResult
where
    C: Compiler + 'static,
    P: Publisher + 'static,
{
    let resolution = match kiln_resolver::resolve(modules, constraint_sets) {
        Ok(resolution) => resolution,
        Err(e) => {
            tracing::warn!("resolution failed: {e}");
            return BuildResult::resolution_failed(e);
        }
    };
    let plan = plan::plan(&resolution.graph);
    execute(plan, compiler, publisher, options).await
}
