//! Input digests: one hash over every source file of a module.

use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};
use kiln_core::module::Module;
use kiln_util::errors::KilnError;
use kiln_util::fs::collect_files;
use kiln_util::hash::sha256_tree;

/// Paths never treated as inputs.
const ALWAYS_EXCLUDED: &[&str] = &[".kiln/**", ".git/**"];

/// Compile the exclusion set for one module: the built-in patterns, the
/// workspace `exclude` globs and the module's own declared outputs.
///
/// The directory holding a declared output is excluded as a whole, so other
/// byproducts a build leaves next to its artifacts (`build/classes/` beside
/// `build/core.jar`) do not count as inputs on the next run.
pub fn exclusions(workspace_exclude: &[String], module: &Module) -> miette::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    let outputs = module.outputs.iter().flat_map(|o| {
        let dir = o
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| format!("{}/**", p.to_string_lossy()));
        std::iter::once(o.path.to_string_lossy().to_string()).chain(dir)
    });
    let patterns = ALWAYS_EXCLUDED
        .iter()
        .map(|p| p.to_string())
        .chain(workspace_exclude.iter().cloned())
        .chain(outputs);
    for pattern in patterns {
        let glob = Glob::new(&pattern).map_err(|e| KilnError::Manifest {
            message: format!("invalid exclude pattern `{pattern}`: {e}"),
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| {
        KilnError::Manifest {
            message: format!("invalid exclude patterns: {e}"),
        }
        .into()
    })
}

/// Digest every non-excluded file under `dir`. `None` when the directory
/// does not exist.
pub fn digest(dir: &Path, exclude: &GlobSet) -> Option<String> {
    if !dir.is_dir() {
        return None;
    }
    let files = collect_files(dir, exclude);
    tracing::debug!("{} input files under {}", files.len(), dir.display());
    Some(sha256_tree(dir, &files))
}
