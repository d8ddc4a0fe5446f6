//! Standard Maven repository layout.

use std::path::{Path, PathBuf};

use kiln_core::coordinate::Coordinate;

/// Directory of one coordinate relative to the repository root.
///
/// `org.example:core:1.0.0` becomes `org/example/core/1.0.0`.
pub fn coordinate_dir(coordinate: &Coordinate) -> PathBuf {
    let mut dir: PathBuf = coordinate.group.split('.').collect();
    dir.push(&coordinate.name);
    dir.push(coordinate.version.to_string());
    dir
}

/// `<name>-<version>[-<classifier>].<extension>`
pub fn file_name(coordinate: &Coordinate, classifier: Option<&str>, extension: &str) -> String {
    match classifier {
        Some(c) => format!("{}-{}-{c}.{extension}", coordinate.name, coordinate.version),
        None => format!("{}-{}.{extension}", coordinate.name, coordinate.version),
    }
}

pub fn pom_name(coordinate: &Coordinate) -> String {
    file_name(coordinate, None, "pom")
}

/// Split a stored file name back into classifier and extension.
///
/// Returns `None` for names that do not belong to `coordinate`.
pub fn parse_file_name(coordinate: &Coordinate, file_name: &str) -> Option<(Option<String>, String)> {
    let prefix = format!("{}-{}", coordinate.name, coordinate.version);
    let rest = file_name.strip_prefix(&prefix)?;
    if let Some(extension) = rest.strip_prefix('.') {
        return (!extension.is_empty()).then(|| (None, extension.to_string()));
    }
    let (classifier, extension) = rest.strip_prefix('-')?.split_once('.')?;
    if classifier.is_empty() || extension.is_empty() {
        return None;
    }
    Some((Some(classifier.to_string()), extension.to_string()))
}

/// Path relative to `root`, with forward slashes, for receipts and logs.
pub fn display_relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
