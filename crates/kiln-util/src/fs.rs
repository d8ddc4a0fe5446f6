use std::path::{Path, PathBuf};

use globset::GlobSet;

/// Walk up from `start` looking for a file named `filename`.
/// Returns the path to the directory containing the file, or `None`.
pub fn find_ancestor_with(start: &Path, filename: &str) -> Option<PathBuf> {
    let mut current = start;
    loop {
        let candidate = current.join(filename);
        if candidate.is_file() {
            return Some(current.to_path_buf());
        }
        current = current.parent()?;
    }
}

/// Ensure a directory exists, creating it and any parents if needed.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Collect every regular file below `root`, sorted, skipping paths whose
/// root-relative form matches `exclude`.
pub fn collect_files(root: &Path, exclude: &GlobSet) -> Vec<PathBuf> {
    let mut files = Vec::new();
    collect_recursive(root, root, exclude, &mut files);
    files.sort();
    files
}

fn collect_recursive(root: &Path, dir: &Path, exclude: &GlobSet, out: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(&path);
        if exclude.is_match(relative) {
            continue;
        }
        if path.is_dir() {
            collect_recursive(root, &path, exclude, out);
        } else if path.is_file() {
            out.push(path);
        }
    }
}
