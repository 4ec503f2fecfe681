//! # Scorecard Chunker
//!
//! Language-aware syntactic chunking under token budgets.
//!
//! ## Pipeline
//!
//! ```text
//! Source file
//!     │
//!     ├──> Strategy lookup (extension → LanguageStrategy)
//!     │
//!     ├──> Parse + top-level enumeration
//!     │      ├─> fits the chunk budget → one chunk
//!     │      ├─> has sub-nodes → shell context + sub-chunks
//!     │      └─> indivisible → line-accumulating fallback split
//!     │
//!     ├──> Skip detection (language boilerplate heuristics)
//!     │
//!     └──> Grouping + send strategy
//!            ├─> full_file / single_group / multiple_groups / unprocessed
//!            └─> exact token accounting (header, shell, separators)
//! ```
//!
//! The emitted [`FileChunkGroup`] is immutable: the scoring engine consumes
//! it as-is and the accounting in [`TokenBreakdown`] reconciles exactly
//! against the final combined texts.

mod chunker;
mod config;
mod error;
pub mod strategy;
mod types;

pub use chunker::Chunker;
pub use config::ChunkerConfig;
pub use error::{ChunkError, Result};
pub use types::{
    Chunk, ChunkGroup, FileChunkGroup, SendStrategy, ShellContext, SkippedContent, TokenBreakdown,
};
