//! Handler for `kiln tree`.

use miette::Result;

use kiln_ops::ops_tree::{self, TreeOptions};
use kiln_ops::WorkspaceContext;

pub fn exec(
    ctx: &WorkspaceContext,
    depth: Option<usize>,
    why: Option<String>,
    inverted: Option<String>,
    conflicts: bool,
) -> Result<()> {
    let opts = TreeOptions {
        depth,
        why,
        inverted,
        conflicts,
    };
    print!("{}", ops_tree::tree(ctx, &opts)?);
    Ok(())
}
