//! Handler for `kiln plan`.

use miette::Result;

use kiln_ops::{ops_plan, WorkspaceContext};

pub fn exec(ctx: &WorkspaceContext) -> Result<()> {
    let plan = ops_plan::plan_build(ctx)?;
    print!("{plan}");
    Ok(())
}
