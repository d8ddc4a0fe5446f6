use kiln_core::coordinate::{Coordinate, ModuleKey};
use kiln_core::version::Version;
use miette::Diagnostic;
use thiserror::Error;

/// Why a set of declarations could not be turned into a buildable graph.
///
/// Every variant is fatal: no module is built when resolution fails.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ResolutionError {
    #[error("unknown module `{module}`{}", requester_suffix(.requested_by))]
    #[diagnostic(
        code(kiln::resolve::unknown_module),
        help("declare the module in Kiln.toml or reference it by coordinate")
    )]
    UnknownModule {
        module: String,
        requested_by: Option<Coordinate>,
    },

    #[error("conflicting versions of {module}: {}", join_versions(.versions))]
    #[diagnostic(
        code(kiln::resolve::version_conflict),
        help("add a recommendation for the module to a platform the requesting modules use")
    )]
    VersionConflict {
        module: ModuleKey,
        /// Competing versions in ascending order.
        versions: Vec<Version>,
    },

    #[error("no version for {module} requested by {requested_by}")]
    #[diagnostic(
        code(kiln::resolve::unresolved_version),
        help("give the dependency an explicit version or add it to the module's platform")
    )]
    UnresolvedVersion {
        module: ModuleKey,
        requested_by: Coordinate,
    },

    #[error("dependency cycle: {}", render_cycle(.cycle))]
    #[diagnostic(code(kiln::resolve::cycle))]
    CyclicDependency { cycle: Vec<Coordinate> },

    #[error("module {coordinate} is declared more than once")]
    #[diagnostic(code(kiln::resolve::duplicate_module))]
    DuplicateModule { coordinate: Coordinate },

    #[error("platform `{name}` is declared more than once")]
    #[diagnostic(code(kiln::resolve::duplicate_platform))]
    DuplicateConstraintSet { name: String },

    #[error("unknown platform `{name}` referenced by {referenced_by}")]
    #[diagnostic(code(kiln::resolve::unknown_platform))]
    UnknownConstraintSet { name: String, referenced_by: String },
}

fn requester_suffix(requested_by: &Option<Coordinate>) -> String {
    match requested_by {
        Some(c) => format!(" (required by {c})"),
        None => String::new(),
    }
}

fn join_versions(versions: &[Version]) -> String {
    versions
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_cycle(cycle: &[Coordinate]) -> String {
    let mut parts: Vec<String> = cycle.iter().map(|c| c.to_string()).collect();
    if let Some(first) = cycle.first() {
        parts.push(first.to_string());
    }
    parts.join(" -> ")
}
