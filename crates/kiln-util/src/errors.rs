use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for Kiln operations outside the resolver and scheduler.
#[derive(Debug, Error, Diagnostic)]
pub enum KilnError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or malformed workspace manifest (Kiln.toml).
    #[error("Manifest error: {message}")]
    #[diagnostic(code(kiln::manifest), help("Check your Kiln.toml for syntax errors"))]
    Manifest { message: String },

    /// Invalid global configuration (~/.kiln/config.toml).
    #[error("Config error: {message}")]
    #[diagnostic(code(kiln::config))]
    Config { message: String },

    /// Dependency resolution could not produce a usable graph.
    #[error("Dependency resolution failed: {message}")]
    #[diagnostic(code(kiln::resolution))]
    Resolution { message: String },

    /// One or more modules failed to build or publish.
    #[error("Build failed: {message}")]
    #[diagnostic(code(kiln::build))]
    Build { message: String },

    /// Artifact repository access failed.
    #[error("Repository error: {message}")]
    #[diagnostic(code(kiln::repository))]
    Repository { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

/// Convenience alias for `miette::Result<T>`.
pub type KilnResult<T> = miette::Result<T>;
