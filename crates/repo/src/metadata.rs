//! Memoized repository metadata shared across concurrent runs.

use crate::error::Result;
use crate::fetch::{acquire, repo_name_from_url};
use crate::walk::{walk, FileEntry};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Everything later stages need to know about an acquired repository.
#[derive(Debug, Clone)]
pub struct RepoMetadata {
    pub name: String,
    pub local_path: PathBuf,
    pub files: Vec<FileEntry>,
}

static MEMO: Lazy<Mutex<HashMap<String, Arc<RepoMetadata>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Acquire `url` and enumerate its files, memoized process-wide by URL with
/// first-writer-wins semantics. Concurrent runs for the same URL share one
/// entry.
pub fn metadata(url: &str, cache_root: &Path) -> Result<Arc<RepoMetadata>> {
    if let Some(found) = MEMO.lock().expect("repo memo poisoned").get(url) {
        return Ok(Arc::clone(found));
    }

    let local_path = acquire(url, cache_root)?;
    let files = walk(&local_path, false)?;
    let built = Arc::new(RepoMetadata {
        name: repo_name_from_url(url),
        local_path,
        files,
    });

    let mut memo = MEMO.lock().expect("repo memo poisoned");
    let entry = memo.entry(url.to_string()).or_insert_with(|| Arc::clone(&built));
    Ok(Arc::clone(entry))
}
