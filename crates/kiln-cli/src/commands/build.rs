//! Handler for `kiln build`.

use miette::Result;

use kiln_ops::ops_build::{self, BuildOptions};
use kiln_ops::WorkspaceContext;

pub async fn exec(
    ctx: &WorkspaceContext,
    jobs: Option<usize>,
    fail_fast: bool,
    force: bool,
    repository: Option<String>,
) -> Result<()> {
    let opts = BuildOptions {
        jobs,
        fail_fast,
        force,
        repository,
    };
    ops_build::build(ctx, &opts).await?;
    Ok(())
}
