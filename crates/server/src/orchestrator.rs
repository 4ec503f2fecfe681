//! The run orchestrator: owns run lifecycles and drives the pipeline.

use crate::config::ServerConfig;
use crate::reports::{
    calibrated_scorecard_path, latest_calibrated, run_dir, write_json_atomic,
};
use crate::run::{update_run, RunHandle, RunStatus, RunStore};
use scorecard_ai_client::{client_from_env, Provider};
use scorecard_chunker::Chunker;
use scorecard_repo::{metadata, RepoMetadata};
use scorecard_scoring::{ProjectContext, ProjectScorecard, ScoredFile, ScoringEngine};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

const README_EXCERPT_CHARS: usize = 4000;

static RUN_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Errors surfaced to the HTTP layer.
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    Forbidden(String),
    BadRequest(String),
    Internal(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "not found: {msg}"),
            ApiError::Forbidden(msg) => write!(f, "forbidden: {msg}"),
            ApiError::BadRequest(msg) => write!(f, "bad request: {msg}"),
            ApiError::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct StartedRun {
    #[serde(rename = "runId")]
    pub run_id: String,
    #[serde(rename = "allFiles")]
    pub all_files: Vec<String>,
}

pub struct Orchestrator {
    store: RunStore,
    engine: Arc<ScoringEngine>,
    chunker: Chunker,
    config: ServerConfig,
}

impl Orchestrator {
    pub fn new(engine: Arc<ScoringEngine>, config: ServerConfig) -> anyhow::Result<Arc<Self>> {
        let chunker = Chunker::new(config.chunker.clone())?;
        Ok(Arc::new(Self {
            store: RunStore::new(),
            engine,
            chunker,
            config,
        }))
    }

    /// Build the orchestrator with AI clients from the environment.
    pub fn from_env(config: ServerConfig) -> anyhow::Result<Arc<Self>> {
        let provider = Provider::parse(&config.provider)?;
        let timeout = Duration::from_millis(config.ai_timeout_ms);
        let scoring_client = client_from_env(provider, &config.scoring_model, timeout)?;
        let review_client = client_from_env(provider, &config.review_model, timeout)?;
        let engine = Arc::new(ScoringEngine::new(
            scoring_client,
            review_client,
            config.scoring.clone(),
        ));
        Self::new(engine, config)
    }

    pub fn store(&self) -> &RunStore {
        &self.store
    }

    /// Start (or resume) a run: acquire the repository, then either reuse
    /// the most recent calibrated artifact or launch the pipeline worker.
    pub async fn start(
        self: &Arc<Self>,
        repo_url: &str,
        run_id: Option<String>,
    ) -> Result<StartedRun, ApiError> {
        let meta = self.acquire(repo_url).await?;
        let run_id = run_id.unwrap_or_else(generate_run_id);
        let all_files: Vec<String> = meta.files.iter().map(|f| f.relative.clone()).collect();

        let run = self.store.create(&run_id, repo_url, &meta.name).await;
        update_run(&run, None, &format!("Repository ready: {} file(s)", all_files.len()), |_| {})
            .await;

        let dir = run_dir(&self.config.reports_root, &meta.name, &run_id);
        if let Some(cached) = latest_calibrated(&dir) {
            match std::fs::read_to_string(&cached)
                .map_err(anyhow::Error::from)
                .and_then(|text| Ok(serde_json::from_str::<ProjectScorecard>(&text)?))
            {
                Ok(scorecard) => {
                    update_run(
                        &run,
                        Some(RunStatus::Complete),
                        &format!("Reusing calibrated scorecard: {}", cached.display()),
                        |state| {
                            state.final_scorecard = Some(scorecard);
                            state.scorecard_path = Some(cached.clone());
                        },
                    )
                    .await;
                    return Ok(StartedRun { run_id, all_files });
                }
                Err(err) => {
                    log::warn!("Ignoring unreadable cached scorecard {}: {err}", cached.display());
                }
            }
        }

        let this = Arc::clone(self);
        let worker_run = Arc::clone(&run);
        let worker_id = run_id.clone();
        tokio::spawn(async move {
            this.execute(worker_run, worker_id, meta).await;
        });

        Ok(StartedRun { run_id, all_files })
    }

    pub async fn run_handle(&self, run_id: &str) -> Option<RunHandle> {
        self.store.get(run_id).await
    }

    /// Score one file on demand. An already-scored file comes back as-is
    /// without a new AI call.
    pub async fn score_file(&self, run_id: &str, file_path: &str) -> Result<ScoredFile, ApiError> {
        let run = self
            .store
            .get(run_id)
            .await
            .ok_or_else(|| ApiError::NotFound(format!("run {run_id}")))?;

        let (repo_url, repo_name, context) = {
            let state = run.lock().await;
            if let Some(card) = &state.final_scorecard {
                if let Some(existing) =
                    card.scored_files.iter().find(|f| f.file_path == file_path)
                {
                    return Ok(existing.clone());
                }
            }
            let context = state.project_context.clone().or_else(|| {
                state.final_scorecard.as_ref().map(|card| ProjectContext {
                    project_essence: card.project_essence.clone(),
                    primary_domain: card.main_domain.clone(),
                    primary_stack: card.tech_stack.clone(),
                    core_concepts: Vec::new(),
                })
            });
            (state.repo_url.clone(), state.repo_name.clone(), context)
        };

        let meta = self.acquire(&repo_url).await?;
        if !meta.files.iter().any(|f| f.relative == file_path) {
            return Err(ApiError::NotFound(format!("file {file_path}")));
        }

        let absolute = meta.local_path.join(file_path);
        let code = tokio::fs::read_to_string(&absolute)
            .await
            .map_err(|err| ApiError::NotFound(format!("file {file_path}: {err}")))?;

        let chunked = self
            .chunker
            .chunk_file(&code, file_path)
            .map_err(|err| ApiError::Internal(format!("chunking {file_path}: {err}")))?;

        let scored = self
            .engine
            .score_single_file(&context.unwrap_or_default(), &chunked)
            .await;

        let dir = run_dir(&self.config.reports_root, &repo_name, run_id);
        let path = {
            let state = run.lock().await;
            state
                .scorecard_path
                .clone()
                .unwrap_or_else(|| calibrated_scorecard_path(&dir))
        };

        let scored_for_state = scored.clone();
        let path_for_state = path.clone();
        update_run(&run, None, &format!("Scored additional file: {file_path}"), |state| {
            if let Some(card) = &mut state.final_scorecard {
                card.usage.add(scored_for_state.usage);
                card.total_retries += scored_for_state.retries;
                if scored_for_state.had_error {
                    card.total_failed_files += 1;
                }
                card.scored_files.push(scored_for_state);
                card.sort_files_by_impact();
                state.scorecard_path = Some(path_for_state);
            }
        })
        .await;

        // Rewrite the calibrated artifact so disk matches memory.
        let card = run.lock().await.final_scorecard.clone();
        if let Some(card) = card {
            if let Err(err) = write_json_atomic(&path, &card) {
                log::warn!("Could not persist scorecard after incremental scoring: {err}");
            }
        }

        Ok(scored)
    }

    /// Raw bytes of a repository file, denying any path that escapes the
    /// repository root.
    pub async fn file_content(&self, run_id: &str, file_path: &str) -> Result<Vec<u8>, ApiError> {
        let run = self
            .store
            .get(run_id)
            .await
            .ok_or_else(|| ApiError::NotFound(format!("run {run_id}")))?;

        let repo_url = run.lock().await.repo_url.clone();
        let meta = self.acquire(&repo_url).await?;

        let root = meta
            .local_path
            .canonicalize()
            .map_err(|err| ApiError::Internal(format!("repository root: {err}")))?;
        let requested = root.join(file_path);
        let resolved = requested
            .canonicalize()
            .map_err(|_| ApiError::NotFound(format!("file {file_path}")))?;

        if !resolved.starts_with(&root) {
            return Err(ApiError::Forbidden(format!("{file_path} escapes the repository root")));
        }

        tokio::fs::read(&resolved)
            .await
            .map_err(|err| ApiError::NotFound(format!("file {file_path}: {err}")))
    }

    async fn acquire(&self, repo_url: &str) -> Result<Arc<RepoMetadata>, ApiError> {
        let url = repo_url.to_string();
        let root = self.config.repo_root.clone();
        tokio::task::spawn_blocking(move || metadata(&url, &root))
            .await
            .map_err(|err| ApiError::Internal(format!("acquire task: {err}")))?
            .map_err(|err| ApiError::Internal(err.to_string()))
    }

    async fn execute(self: Arc<Self>, run: RunHandle, run_id: String, meta: Arc<RepoMetadata>) {
        if let Err(err) = self.pipeline(&run, &run_id, &meta).await {
            update_run(&run, Some(RunStatus::Error), &format!("Run failed: {err}"), |state| {
                state.error = Some(err.to_string());
            })
            .await;
        }
    }

    async fn pipeline(
        &self,
        run: &RunHandle,
        run_id: &str,
        meta: &RepoMetadata,
    ) -> anyhow::Result<()> {
        let dir = run_dir(&self.config.reports_root, &meta.name, run_id);
        let tree: Vec<String> = meta.files.iter().map(|f| f.relative.clone()).collect();

        // Stage: selection.
        update_run(run, Some(RunStatus::SelectingFiles), "Selecting files", |_| {}).await;

        let readme = read_readme_excerpt(meta).await;
        let (context, context_usage) =
            self.engine.infer_context(&meta.name, &readme, &tree).await?;
        update_run(
            run,
            None,
            &format!("Project context: {}", context.primary_domain),
            |state| state.project_context = Some(context.clone()),
        )
        .await;

        let mut selection = self.engine.select_files(&context, &tree).await?;
        selection.usage.add(context_usage);
        write_json_atomic(&dir.join("file-selection.json"), &selection)?;
        update_run(run, None, &format!("Selected {} file(s)", selection.files.len()), |_| {})
            .await;

        // Stage: chunking and scoring.
        update_run(
            run,
            Some(RunStatus::ChunkingAndScoring),
            "Chunking and scoring",
            |_| {},
        )
        .await;

        let mut warnings = selection.warnings.clone();
        for flag in &selection.flagged {
            warnings.push(format!("Flagged as vendored: {} ({})", flag.path, flag.reason));
        }

        let mut chunked = Vec::new();
        for relative in &selection.files {
            let absolute = meta.local_path.join(relative);
            let code = match tokio::fs::read_to_string(&absolute).await {
                Ok(code) => code,
                Err(err) => {
                    warnings.push(format!("Unreadable file skipped: {relative} ({err})"));
                    continue;
                }
            };
            match self.chunker.chunk_file(&code, relative) {
                Ok(file) => chunked.push(file),
                Err(err) => {
                    update_run(run, None, &format!("Skipping {relative}: {err}"), |_| {}).await;
                    warnings.push(format!("Parse failure skipped: {relative}"));
                }
            }
        }
        write_json_atomic(&dir.join("chunking-analysis.json"), &chunked)?;
        update_run(run, None, &format!("Chunked {} file(s)", chunked.len()), |_| {}).await;

        let mut scorecard = self
            .engine
            .score_project(run_id, &meta.name, &context, &chunked, warnings)
            .await;
        write_json_atomic(&dir.join("project-scorecard.json"), &scorecard)?;
        update_run(
            run,
            None,
            &format!(
                "Preliminary score {:.2} over {} file(s)",
                scorecard.preliminary_project_score,
                scorecard.scored_files.len()
            ),
            |_| {},
        )
        .await;

        // Stage: final review.
        update_run(run, Some(RunStatus::FinalReview), "Running final review", |_| {}).await;
        self.engine.run_final_review(&mut scorecard, &chunked).await?;

        let artifact = calibrated_scorecard_path(&dir);
        write_json_atomic(&artifact, &scorecard)?;

        let final_score = scorecard.final_project_score.unwrap_or(0.0);
        update_run(
            run,
            Some(RunStatus::Complete),
            &format!("Run complete: final score {final_score:.2}"),
            |state| {
                state.final_scorecard = Some(scorecard);
                state.scorecard_path = Some(artifact.clone());
            },
        )
        .await;

        Ok(())
    }
}

fn generate_run_id() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let counter = RUN_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{millis}-{counter}")
}

/// First chunk of a top-level README, if the repository has one.
async fn read_readme_excerpt(meta: &RepoMetadata) -> String {
    let readme = meta.files.iter().find(|f| {
        let lower = f.relative.to_lowercase();
        !lower.contains('/') && lower.starts_with("readme")
    });
    let Some(readme) = readme else {
        return String::new();
    };

    match tokio::fs::read_to_string(&readme.absolute).await {
        Ok(text) => text.chars().take(README_EXCERPT_CHARS).collect(),
        Err(err) => {
            log::warn!("README unreadable: {err}");
            String::new()
        }
    }
}
