//! Operation: display the resolved dependency tree.

use kiln_util::errors::KilnError;

use crate::context::WorkspaceContext;

/// Options for `kiln tree`.
#[derive(Debug, Default)]
pub struct TreeOptions {
    /// Maximum tree depth to display.
    pub depth: Option<usize>,
    /// Show the dependency chain leading to a module.
    pub why: Option<String>,
    /// Show everything that depends on a module.
    pub inverted: Option<String>,
    /// Show versions moved by platform recommendations.
    pub conflicts: bool,
}

/// Render the requested view of the resolved graph.
pub fn tree(ctx: &WorkspaceContext, opts: &TreeOptions) -> miette::Result<String> {
    let resolution = ctx.resolve()?;
    let graph = &resolution.graph;

    if let Some(target) = &opts.why {
        let path = graph.find_path(target).ok_or_else(|| KilnError::Generic {
            message: format!("`{target}` is not reachable from any workspace module"),
        })?;
        let mut out = String::new();
        for (depth, coordinate) in path.iter().enumerate() {
            out.push_str(&format!("{}{coordinate}\n", "  ".repeat(depth)));
        }
        return Ok(out);
    }

    if let Some(target) = &opts.inverted {
        let out = graph.print_inverted_tree(target);
        if out.is_empty() {
            return Err(KilnError::Generic {
                message: format!("`{target}` is not in the resolved graph"),
            }
            .into());
        }
        return Ok(out);
    }

    if opts.conflicts {
        let mut out = resolution.conflicts.to_string();
        if !out.ends_with('\n') {
            out.push('\n');
        }
        return Ok(out);
    }

    Ok(graph.print_tree(opts.depth))
}
