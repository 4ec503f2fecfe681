//! The scoring engine: selection, routing, batch waves, calibration.

use crate::aggregate::aggregate_scorecard;
use crate::batch::{is_batchable, plan_batches, reconcile_reviews};
use crate::config::ScoringConfig;
use crate::dossier::build_dossier;
use crate::error::{Result, ScoringError};
use crate::group_scorer::{empty_scored_file, score_file_groups, scored_file_from_single};
use crate::prompts;
use crate::selection::{parse_selection_entries, resolve_selection};
use crate::types::{
    AiScore, FileSelection, FinalReview, ProjectContext, ProjectScorecard, ScoredFile,
};
use scorecard_ai_client::{safe_json_chat, AiError, ChatClient, ChatMessage, Usage};
use scorecard_chunker::FileChunkGroup;
use std::collections::HashMap;
use std::sync::Arc;

const MULTIPLIER_FLOOR: f64 = 0.8;
const MULTIPLIER_CEILING: f64 = 1.25;

/// Drives every AI stage of a run. Scoring goes through `client`; the
/// final review goes through `review_client` (typically a larger model).
pub struct ScoringEngine {
    client: Arc<dyn ChatClient>,
    review_client: Arc<dyn ChatClient>,
    config: ScoringConfig,
}

impl ScoringEngine {
    pub fn new(
        client: Arc<dyn ChatClient>,
        review_client: Arc<dyn ChatClient>,
        config: ScoringConfig,
    ) -> Self {
        Self {
            client,
            review_client,
            config,
        }
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Stage 1: infer the project context from README excerpt + file tree.
    pub async fn infer_context(
        &self,
        repo_name: &str,
        readme_excerpt: &str,
        file_tree: &[String],
    ) -> Result<(ProjectContext, Usage)> {
        let messages = vec![
            ChatMessage::system(prompts::CONTEXT_SYSTEM),
            ChatMessage::user(prompts::context_user_prompt(repo_name, readme_excerpt, file_tree)),
        ];

        let (value, usage) = safe_json_chat(self.client.as_ref(), messages, self.config.ai_max_retries)
            .await
            .ok_or_else(|| {
                ScoringError::Ai(AiError::provider("Project context inference failed"))
            })?;

        let context: ProjectContext = serde_json::from_value(value)?;
        Ok((context, usage))
    }

    /// Stage 2: select the files worth scoring, resolved against the tree.
    pub async fn select_files(
        &self,
        context: &ProjectContext,
        file_tree: &[String],
    ) -> Result<FileSelection> {
        if file_tree.is_empty() {
            return Err(ScoringError::NoFilesSelected);
        }

        let messages = vec![
            ChatMessage::system(prompts::SELECTION_SYSTEM),
            ChatMessage::user(prompts::selection_user_prompt(context, file_tree)),
        ];

        let (value, usage) = safe_json_chat(self.client.as_ref(), messages, self.config.ai_max_retries)
            .await
            .ok_or_else(|| ScoringError::Ai(AiError::provider("File selection failed")))?;

        let raw: Vec<String> = value
            .get("files")
            .and_then(|v| v.as_array())
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|e| e.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        let entries = parse_selection_entries(&raw);
        let (files, flagged, warnings) = resolve_selection(&entries, file_tree);
        if files.is_empty() {
            return Err(ScoringError::NoFilesSelected);
        }

        for flag in &flagged {
            log::info!("Flagged as suspected vendored code: {} ({})", flag.path, flag.reason);
        }

        Ok(FileSelection {
            files,
            flagged,
            warnings,
            usage,
            context: context.clone(),
        })
    }

    /// Score every chunked file — batched where possible, group-by-group
    /// otherwise — and aggregate the preliminary scorecard.
    pub async fn score_project(
        &self,
        run_id: &str,
        repo_name: &str,
        context: &ProjectContext,
        files: &[FileChunkGroup],
        mut warnings: Vec<String>,
    ) -> ProjectScorecard {
        let inter_file = prompts::inter_file_context(context);
        let by_path: HashMap<&str, &FileChunkGroup> =
            files.iter().map(|f| (f.file_path.as_str(), f)).collect();

        let mut batchable: Vec<(String, usize)> = Vec::new();
        let mut individual: Vec<&FileChunkGroup> = Vec::new();

        for file in files {
            if is_batchable(file, self.config.batch_budget) {
                batchable.push((file.file_path.clone(), file.final_token_count));
            } else if file.grouped_chunks.is_empty() {
                warnings.push(format!("File had no sendable content: {}", file.file_path));
            } else {
                individual.push(file);
            }
        }

        let mut scored: Vec<ScoredFile> = Vec::new();

        // First wave: packed batches.
        let mut failed_paths: Vec<String> = Vec::new();
        for batch in plan_batches(&batchable, self.config.batch_budget) {
            let (matched, failed) = self.score_one_batch(&batch, &by_path, &inter_file).await;
            for (path, score, usage) in matched {
                if let Some(file) = by_path.get(path.as_str()) {
                    scored.push(scored_file_from_single(file, score, usage, 0));
                }
            }
            failed_paths.extend(failed);
        }

        // Second wave: one fresh batch pass over the failures.
        if !failed_paths.is_empty() {
            log::info!("Retrying {} file(s) after batch reconciliation", failed_paths.len());
            let retry_items: Vec<(String, usize)> = failed_paths
                .iter()
                .filter_map(|path| {
                    by_path
                        .get(path.as_str())
                        .map(|f| (path.clone(), f.final_token_count))
                })
                .collect();

            let mut still_failed: Vec<String> = Vec::new();
            for batch in plan_batches(&retry_items, self.config.batch_budget) {
                let (matched, failed) = self.score_one_batch(&batch, &by_path, &inter_file).await;
                for (path, score, usage) in matched {
                    if let Some(file) = by_path.get(path.as_str()) {
                        scored.push(scored_file_from_single(file, score, usage, 1));
                    }
                }
                still_failed.extend(failed);
            }

            for path in still_failed {
                if let Some(file) = by_path.get(path.as_str()) {
                    scored.push(empty_scored_file(file, 1));
                }
            }
        }

        // Large files: sequential per-group scoring with context threading.
        for file in individual {
            scored.push(
                score_file_groups(
                    self.client.as_ref(),
                    file,
                    &inter_file,
                    self.config.ai_max_retries,
                )
                .await,
            );
        }

        aggregate_scorecard(run_id, repo_name, self.client.model(), context, scored, warnings)
    }

    /// Score one file on demand (incremental path).
    pub async fn score_single_file(
        &self,
        context: &ProjectContext,
        file: &FileChunkGroup,
    ) -> ScoredFile {
        let inter_file = prompts::inter_file_context(context);
        score_file_groups(
            self.client.as_ref(),
            file,
            &inter_file,
            self.config.ai_max_retries,
        )
        .await
    }

    /// Final review: build the dossier, ask the review model for a
    /// multiplier, apply it. A failed call defaults the multiplier to 1.0;
    /// an empty dossier is terminal.
    pub async fn run_final_review(
        &self,
        scorecard: &mut ProjectScorecard,
        chunked: &[FileChunkGroup],
    ) -> Result<()> {
        let by_path: HashMap<&str, &FileChunkGroup> =
            chunked.iter().map(|f| (f.file_path.as_str(), f)).collect();

        let pairs: Vec<(&ScoredFile, &FileChunkGroup)> = scorecard
            .scored_files
            .iter()
            .filter_map(|scored| {
                by_path
                    .get(scored.file_path.as_str())
                    .map(|chunked| (scored, *chunked))
            })
            .collect();

        let dossier = build_dossier(
            &pairs,
            self.config.dossier_strategy,
            self.config.dossier_budget,
        )?;

        let messages = vec![
            ChatMessage::system(prompts::FINAL_REVIEW_SYSTEM),
            ChatMessage::user(prompts::final_review_user_prompt(
                &scorecard.repo_name,
                scorecard.preliminary_project_score,
                &scorecard.profile,
                scorecard.scored_files.len(),
                &dossier,
            )),
        ];

        match safe_json_chat(
            self.review_client.as_ref(),
            messages,
            self.config.ai_max_retries,
        )
        .await
        {
            Some((value, usage)) => {
                let multiplier = value
                    .get("final_score_multiplier")
                    .and_then(|v| v.as_f64())
                    .unwrap_or(1.0)
                    .clamp(MULTIPLIER_FLOOR, MULTIPLIER_CEILING);
                let text = |key: &str| {
                    value.get(key).and_then(|v| v.as_str()).map(str::to_string)
                };

                if let Some(stack) = text("tech_stack") {
                    scorecard.tech_stack = stack.clone();
                }
                scorecard.usage.add(usage);
                scorecard.final_review = Some(FinalReview {
                    multiplier,
                    tech_stack: text("tech_stack"),
                    summary: text("summary"),
                    reasoning: text("reasoning"),
                    usage,
                });
                scorecard.final_project_score =
                    Some(scorecard.preliminary_project_score * multiplier);
            }
            None => {
                log::warn!("Final review failed; defaulting multiplier to 1.0");
                scorecard.final_project_score = Some(scorecard.preliminary_project_score);
            }
        }

        Ok(())
    }
}

impl ScoringEngine {
    async fn score_one_batch(
        &self,
        batch: &[(String, usize)],
        by_path: &HashMap<&str, &FileChunkGroup>,
        inter_file: &str,
    ) -> (Vec<(String, AiScore, Usage)>, Vec<String>) {
        let sections: Vec<(&str, &str)> = batch
            .iter()
            .filter_map(|(path, _)| {
                by_path.get(path.as_str()).and_then(|file| {
                    file.grouped_chunks
                        .first()
                        .map(|group| (path.as_str(), group.combined_text.as_str()))
                })
            })
            .collect();

        let messages = vec![
            ChatMessage::system(prompts::BATCH_SCORING_SYSTEM),
            ChatMessage::user(prompts::batch_user_prompt(inter_file, &sections)),
        ];

        match safe_json_chat(self.client.as_ref(), messages, self.config.ai_max_retries).await {
            Some((value, usage)) => {
                let reviews: Vec<serde_json::Value> = value
                    .get("reviews")
                    .and_then(|v| v.as_array())
                    .cloned()
                    .unwrap_or_default();
                reconcile_reviews(batch, &reviews, usage)
            }
            None => {
                log::warn!("Batch call failed for {} file(s)", batch.len());
                (
                    Vec::new(),
                    batch.iter().map(|(path, _)| path.clone()).collect(),
                )
            }
        }
    }
}
