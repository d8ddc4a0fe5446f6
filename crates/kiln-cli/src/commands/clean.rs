use miette::Result;

use kiln_ops::ops_clean::{self, CleanResult};
use kiln_ops::WorkspaceContext;

pub fn exec(ctx: &WorkspaceContext) -> Result<()> {
    match ops_clean::clean(ctx)? {
        CleanResult::Cleaned => println!("Cleaned {}", ctx.state_dir().display()),
        CleanResult::NothingToClean => println!("Nothing to clean"),
    }
    Ok(())
}
