//! Operation: remove workspace build state.

use kiln_util::errors::KilnError;

use crate::context::WorkspaceContext;

/// Result of a clean operation.
#[derive(Debug, PartialEq, Eq)]
pub enum CleanResult {
    Cleaned,
    NothingToClean,
}

/// Remove `.kiln/` (fingerprints and build scratch directories) so the next
/// build runs completely fresh. Published artifacts and `Kiln.lock` stay.
pub fn clean(ctx: &WorkspaceContext) -> miette::Result<CleanResult> {
    let state = ctx.state_dir();
    if !state.exists() {
        return Ok(CleanResult::NothingToClean);
    }
    std::fs::remove_dir_all(&state).map_err(KilnError::Io)?;
    tracing::debug!("removed {}", state.display());
    Ok(CleanResult::Cleaned)
}
