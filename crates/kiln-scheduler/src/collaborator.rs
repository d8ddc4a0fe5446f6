//! The narrow interfaces the executor drives: a compiler that turns a planned
//! module into files and a publisher that stores them in a repository.

use std::path::PathBuf;

use kiln_core::coordinate::Coordinate;
use kiln_core::repository::Repository;
use miette::Diagnostic;
use thiserror::Error;

use crate::plan::PlannedModule;

/// The files a compile step produced for one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub coordinate: Coordinate,
    pub files: Vec<ArtifactFile>,
    /// Resolved direct dependencies, recorded in published metadata.
    pub dependencies: Vec<Coordinate>,
}

impl Artifact {
    pub fn new(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            files: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    pub fn with_file(mut self, file: ArtifactFile) -> Self {
        self.files.push(file);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactFile {
    pub path: PathBuf,
    pub classifier: Option<String>,
    pub extension: String,
}

/// Where a publish put things.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    pub repository: String,
    pub locations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("compilation failed: {message}")]
#[diagnostic(code(kiln::compile))]
pub struct CompileError {
    pub message: String,
}

impl CompileError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("publishing failed: {message}")]
#[diagnostic(code(kiln::publish))]
pub struct PublishError {
    pub message: String,
}

impl PublishError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Builds one planned module. Called on the blocking pool.
pub trait Compiler: Send + Sync {
    fn compile(&self, step: &PlannedModule) -> Result<Artifact, CompileError>;
}

impl<F> Compiler for F
where
    F: Fn(&PlannedModule) -> Result<Artifact, CompileError> + Send + Sync,
{
    fn compile(&self, step: &PlannedModule) -> Result<Artifact, CompileError> {
        self(step)
    }
}

/// Stores a built artifact under its coordinate. Called on the blocking pool.
pub trait Publisher: Send + Sync {
    fn publish(
        &self,
        artifact: &Artifact,
        coordinate: &Coordinate,
        repository: &Repository,
    ) -> Result<PublishReceipt, PublishError>;
}

impl<F> Publisher for F
where
    F: Fn(&Artifact, &Coordinate, &Repository) -> Result<PublishReceipt, PublishError>
        + Send
        + Sync,
{
    fn publish(
        &self,
        artifact: &Artifact,
        coordinate: &Coordinate,
        repository: &Repository,
    ) -> Result<PublishReceipt, PublishError> {
        self(artifact, coordinate, repository)
    }
}
