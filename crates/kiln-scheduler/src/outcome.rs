use std::collections::BTreeMap;
use std::fmt;

use kiln_core::coordinate::Coordinate;
use kiln_resolver::ResolutionError;
use miette::Diagnostic;
use thiserror::Error;

use crate::collaborator::{CompileError, PublishError, PublishReceipt};
use crate::fingerprint::Fingerprint;

/// Why a single module did not end up published.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum BuildError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error("skipped: dependency {dependency} did not build")]
    SkippedDueToDependencyFailure { dependency: Coordinate },

    #[error("cancelled")]
    Cancelled,
}

/// Terminal state of one planned module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleStatus {
    Published(PublishReceipt),
    /// Fingerprint unchanged since the last successful build.
    UpToDate,
    Failed(BuildError),
    Skipped { dependency: Coordinate },
    Cancelled,
}

impl ModuleStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Published(_) | Self::UpToDate)
    }

    /// The error to report for this module, if it did not succeed.
    pub fn error(&self) -> Option<BuildError> {
        match self {
            Self::Published(_) | Self::UpToDate => None,
            Self::Failed(e) => Some(e.clone()),
            Self::Skipped { dependency } => Some(BuildError::SkippedDueToDependencyFailure {
                dependency: dependency.clone(),
            }),
            Self::Cancelled => Some(BuildError::Cancelled),
        }
    }
}

impl fmt::Display for ModuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Published(r) => write!(f, "published to {}", r.repository),
            Self::UpToDate => f.write_str("up to date"),
            Self::Failed(e) => write!(f, "failed: {e}"),
            Self::Skipped { dependency } => write!(f, "skipped (dependency {dependency} failed)"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Overall result of an orchestrated build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    Success,
    PartialFailure(Vec<(Coordinate, BuildError)>),
    ResolutionFailed(ResolutionError),
    Cancelled,
}

impl BuildOutcome {
    /// Aggregate per-module statuses. A cancelled run that left any module
    /// cancelled is `Cancelled`; otherwise any failure or skip is a partial
    /// failure.
    pub fn from_statuses(cancelled: bool, statuses: &BTreeMap<Coordinate, ModuleStatus>) -> Self {
        if cancelled && statuses.values().any(|s| *s == ModuleStatus::Cancelled) {
            return Self::Cancelled;
        }
        let failures: Vec<(Coordinate, BuildError)> = statuses
            .iter()
            .filter_map(|(c, s)| s.error().map(|e| (c.clone(), e)))
            .collect();
        if failures.is_empty() {
            Self::Success
        } else {
            Self::PartialFailure(failures)
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Everything an execution produced.
#[derive(Debug, Clone)]
pub struct BuildResult {
    pub outcome: BuildOutcome,
    pub statuses: BTreeMap<Coordinate, ModuleStatus>,
    /// Fingerprints of modules that are published or up to date.
    pub fingerprints: BTreeMap<Coordinate, Fingerprint>,
}

impl BuildResult {
    pub fn resolution_failed(error: ResolutionError) -> Self {
        Self {
            outcome: BuildOutcome::ResolutionFailed(error),
            statuses: BTreeMap::new(),
            fingerprints: BTreeMap::new(),
        }
    }

    pub fn status(&self, coordinate: &Coordinate) -> Option<&ModuleStatus> {
        self.statuses.get(coordinate)
    }
}
