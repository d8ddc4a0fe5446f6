//! Operation: show the build order without building.

use kiln_scheduler::{plan, BuildPlan};

use crate::context::WorkspaceContext;

pub fn plan_build(ctx: &WorkspaceContext) -> miette::Result<BuildPlan> {
    let resolution = ctx.resolve()?;
    Ok(plan(&resolution.graph))
}
