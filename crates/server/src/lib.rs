//! # Scorecard Server
//!
//! The run orchestrator and its HTTP façade.
//!
//! ## Pipeline
//!
//! ```text
//! POST /analysis
//!     │
//!     ├──> preparing            (acquire repository, enumerate files)
//!     ├──> selecting_files      (stage-1 context, stage-2 selection)
//!     ├──> chunking_and_scoring (chunk, batch, score, aggregate)
//!     ├──> final_review         (dossier, multiplier)
//!     └──> complete | error
//!
//! GET  /analysis/{runId}/status        — poll state + log history
//! POST /analysis/{runId}/score-file    — incremental per-file scoring
//! GET  /analysis/{runId}/file-content  — raw bytes, root-locked
//! ```
//!
//! Run state is process-local and non-durable: runs are lost on restart.
//! Report artifacts on disk are the only persistence.

pub mod config;
pub mod http;
pub mod orchestrator;
pub mod reports;
pub mod run;

pub use config::ServerConfig;
pub use orchestrator::Orchestrator;
pub use run::{LogEntry, RunState, RunStatus, RunStore};
