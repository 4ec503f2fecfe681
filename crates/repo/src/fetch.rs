//! Repository cloning into the local cache root.

use crate::error::{RepoError, Result};
use git2::{build::RepoBuilder, FetchOptions, Repository};
use std::path::{Path, PathBuf};

/// Clone `url` into `<cache_root>/<repo name>` unless that directory already
/// exists, in which case the existing checkout is reused. Idempotent.
pub fn acquire(url: &str, cache_root: &Path) -> Result<PathBuf> {
    let name = repo_name_from_url(url);
    if name.is_empty() {
        return Err(RepoError::acquire(format!("Cannot derive repo name from {url}")));
    }

    let dest = cache_root.join(&name);
    if dest.exists() {
        log::info!("Reusing cached checkout at {}", dest.display());
        return Ok(dest);
    }

    std::fs::create_dir_all(cache_root)?;

    let normalized = normalize_url(url);
    log::info!("Cloning {} into {}", normalized, dest.display());

    // Shallow clone first; some servers reject depth=1, so fall back to a
    // full clone before giving up.
    if let Err(shallow_err) = shallow_clone(&normalized, &dest) {
        log::warn!("Shallow clone failed ({shallow_err}), retrying full clone");
        cleanup_partial(&dest);
        Repository::clone(&normalized, &dest).map_err(|err| {
            cleanup_partial(&dest);
            RepoError::acquire(format!("Clone of {normalized} failed: {err}"))
        })?;
    }

    Ok(dest)
}

/// Derive the repository name from its URL: last path segment with any
/// trailing `.git` stripped.
pub fn repo_name_from_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    let last = trimmed.rsplit('/').next().unwrap_or(trimmed);
    last.trim_end_matches(".git").to_string()
}

/// Normalize a GitHub URL to the canonical HTTPS `.git` form; non-GitHub
/// URLs pass through with only the trailing slash stripped.
fn normalize_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    if trimmed.contains("github.com") && !trimmed.ends_with(".git") {
        format!("{trimmed}.git")
    } else {
        trimmed.to_string()
    }
}

fn shallow_clone(url: &str, dest: &Path) -> std::result::Result<Repository, git2::Error> {
    let mut fetch = FetchOptions::new();
    fetch.depth(1);

    let mut builder = RepoBuilder::new();
    builder.fetch_options(fetch);
    builder.clone(url, dest)
}

fn cleanup_partial(dest: &Path) {
    if dest.exists() {
        let _ = std::fs::remove_dir_all(dest);
    }
}
