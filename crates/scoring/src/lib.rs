//! # Scorecard Scoring
//!
//! The scoring engine: from chunked files to a calibrated project scorecard.
//!
//! ## Pipeline
//!
//! ```text
//! ProjectContext (stage 1)  ──┐
//! File selection (stage 2)  ──┤
//!                             │
//! FileChunkGroup[] ──> route ─┼─> batched scoring (bin-packed, reconciled,
//!                             │    one retry wave)
//!                             ├─> per-file group scoring (intra-file context
//!                             │    carried between groups)
//!                             │
//!                             ├─> aggregation (token-weighted profile,
//!                             │    preliminary score)
//!                             │
//!                             └─> dossier + final review (multiplier)
//! ```

mod aggregate;
mod batch;
mod config;
mod dossier;
mod engine;
mod error;
mod group_scorer;
mod prompts;
mod selection;
mod types;

pub use aggregate::aggregate_scorecard;
pub use batch::{is_batchable, plan_batches};
pub use config::{DossierStrategy, ScoringConfig};
pub use dossier::build_dossier;
pub use engine::ScoringEngine;
pub use error::{Result, ScoringError};
pub use selection::{parse_selection_entries, resolve_selection, SelectionEntry};
pub use types::{
    AiScore, ChunkingDetails, FileSelection, FinalReview, FlaggedFile, ProjectContext,
    ProjectProfile, ProjectScorecard, ScoredChunkGroup, ScoredFile,
};
