//! Operation: resolve the workspace and regenerate Kiln.lock.

use kiln_core::lockfile::{LockedPackage, Lockfile};
use kiln_resolver::ResolvedGraph;

use crate::context::WorkspaceContext;

/// Record every node of a resolved graph with its direct dependencies.
pub fn lockfile_for(graph: &ResolvedGraph) -> Lockfile {
    let package = graph
        .nodes()
        .into_iter()
        .map(|coordinate| LockedPackage {
            name: coordinate.name.clone(),
            group: coordinate.group.clone(),
            version: coordinate.version.to_string(),
            source: if graph.is_local(&coordinate) {
                "workspace"
            } else {
                "repository"
            }
            .to_string(),
            dependencies: graph
                .dependencies_of(&coordinate)
                .iter()
                .map(ToString::to_string)
                .collect(),
        })
        .collect();
    Lockfile { package }
}

/// Re-resolve and write `Kiln.lock`.
pub fn lock(ctx: &WorkspaceContext) -> miette::Result<Lockfile> {
    let resolution = ctx.resolve()?;
    let mut lockfile = lockfile_for(&resolution.graph);
    lockfile.write_to(&ctx.lockfile_path())?;
    tracing::info!("wrote {} packages to {}", lockfile.package.len(), ctx.lockfile_path().display());
    Ok(lockfile)
}
