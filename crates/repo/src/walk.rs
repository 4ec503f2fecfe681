//! File enumeration with directory pruning.

use crate::error::{RepoError, Result};
use ignore::WalkBuilder;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One file found under the repository root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileEntry {
    /// Path relative to the repository root, forward slashes.
    pub relative: String,
    /// Absolute path on disk.
    pub absolute: PathBuf,
}

/// Directories that never contain scoreable sources.
const PRUNED_DIRS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "node_modules",
    "vendor",
    "dist",
    "build",
    "target",
    "__pycache__",
    ".venv",
    "venv",
];

/// Enumerate files under `root`, pruning version-control, dependency, dist
/// and build directories. Hidden entries (name starting with `.`) are
/// excluded unless `include_hidden`. Entries come back sorted by relative
/// path.
pub fn walk(root: &Path, include_hidden: bool) -> Result<Vec<FileEntry>> {
    if !root.is_dir() {
        return Err(RepoError::InvalidPath(format!("{} is not a directory", root.display())));
    }

    let mut builder = WalkBuilder::new(root);
    builder
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .hidden(false)
        .parents(false)
        .follow_links(false)
        .filter_entry(move |entry| {
            if entry.depth() == 0 {
                return true;
            }
            let Some(name) = entry.file_name().to_str() else {
                return false;
            };
            if entry.file_type().is_some_and(|ft| ft.is_dir()) && PRUNED_DIRS.contains(&name) {
                return false;
            }
            if !include_hidden && name.starts_with('.') {
                return false;
            }
            true
        });

    let mut entries = Vec::new();
    for result in builder.build() {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                log::warn!("Skipping unreadable entry: {err}");
                continue;
            }
        };

        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }

        let absolute = entry.path().to_path_buf();
        let relative = match absolute.strip_prefix(root) {
            Ok(rel) => rel.to_string_lossy().replace('\\', "/"),
            Err(_) => continue,
        };

        entries.push(FileEntry { relative, absolute });
    }

    entries.sort_by(|a, b| a.relative.cmp(&b.relative));
    Ok(entries)
}
