//! Build scheduling: turns a resolved graph into a deterministic build plan
//! and executes it with bounded concurrency, cascading failures to dependents.

pub mod collaborator;
pub mod executor;
pub mod fingerprint;
pub mod outcome;
pub mod plan;

pub use collaborator::{Artifact, ArtifactFile, CompileError, Compiler, PublishError, PublishReceipt, Publisher};
pub use executor::{build, execute, ExecuteOptions};
pub use fingerprint::Fingerprint;
pub use outcome::{BuildError, BuildOutcome, BuildResult, ModuleStatus};
pub use plan::{plan, BuildPlan, PlannedModule};
