use miette::Result;

use kiln_ops::{ops_lock, WorkspaceContext};

pub fn exec(ctx: &WorkspaceContext, verbose: bool) -> Result<()> {
    let lockfile = ops_lock::lock(ctx)?;
    if verbose {
        for package in &lockfile.package {
            eprintln!("  {}", package.coordinate());
        }
    }
    eprintln!("Locked {} packages", lockfile.package.len());
    Ok(())
}
