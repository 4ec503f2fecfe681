//! Run state, the append-only log, and the process-wide run store.

use chrono::{DateTime, Utc};
use scorecard_scoring::{ProjectContext, ProjectScorecard};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Preparing,
    SelectingFiles,
    ChunkingAndScoring,
    FinalReview,
    Complete,
    Error,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Complete | RunStatus::Error)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogEntry {
    pub id: u64,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Mutable state of one run. All mutation goes through
/// [`RunHandle::update`], which appends a log entry with a strictly
/// increasing id.
#[derive(Debug, Clone)]
pub struct RunState {
    pub run_id: String,
    pub repo_url: String,
    pub repo_name: String,
    pub status: RunStatus,
    pub log_history: Vec<LogEntry>,
    pub project_context: Option<ProjectContext>,
    pub final_scorecard: Option<ProjectScorecard>,
    pub scorecard_path: Option<PathBuf>,
    pub error: Option<String>,
}

impl RunState {
    fn new(run_id: String, repo_url: String, repo_name: String) -> Self {
        Self {
            run_id,
            repo_url,
            repo_name,
            status: RunStatus::Preparing,
            log_history: Vec::new(),
            project_context: None,
            final_scorecard: None,
            scorecard_path: None,
            error: None,
        }
    }
}

pub type RunHandle = Arc<Mutex<RunState>>;

/// Append one log entry (id strictly increasing per run), optionally move
/// the status, and apply any further mutation while the lock is held.
pub async fn update_run<F>(run: &RunHandle, status: Option<RunStatus>, message: &str, mutate: F)
where
    F: FnOnce(&mut RunState),
{
    let mut state = run.lock().await;
    let next_id = state.log_history.last().map(|e| e.id + 1).unwrap_or(1);
    state.log_history.push(LogEntry {
        id: next_id,
        message: message.to_string(),
        timestamp: Utc::now(),
    });
    if let Some(status) = status {
        state.status = status;
    }
    mutate(&mut state);
    log::info!("[{}] {}", state.run_id, message);
}

/// Process-wide run store keyed by run id.
#[derive(Clone, Default)]
pub struct RunStore {
    inner: Arc<RwLock<HashMap<String, RunHandle>>>,
}

impl RunStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self, run_id: &str, repo_url: &str, repo_name: &str) -> RunHandle {
        let handle: RunHandle = Arc::new(Mutex::new(RunState::new(
            run_id.to_string(),
            repo_url.to_string(),
            repo_name.to_string(),
        )));
        self.inner
            .write()
            .await
            .insert(run_id.to_string(), Arc::clone(&handle));
        handle
    }

    pub async fn get(&self, run_id: &str) -> Option<RunHandle> {
        self.inner.read().await.get(run_id).cloned()
    }
}
