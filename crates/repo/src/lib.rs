//! # Scorecard Repo
//!
//! Repository acquisition and file enumeration.
//!
//! ## Pipeline
//!
//! ```text
//! URL
//!  │
//!  ├──> acquire  (clone into the cache root, reuse when present)
//!  │
//!  ├──> walk     (pruned, sorted file enumeration)
//!  │
//!  └──> metadata (process-wide memo keyed by URL)
//! ```

mod error;
mod fetch;
mod metadata;
mod walk;

pub use error::{RepoError, Result};
pub use fetch::{acquire, repo_name_from_url};
pub use metadata::{metadata, RepoMetadata};
pub use walk::{walk, FileEntry};
