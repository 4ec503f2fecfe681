//! Per-file chunk-group scoring and scored-file assembly.

use crate::prompts::{self, FAILED_GROUP_SENTINEL, FIRST_GROUP_SENTINEL, GROUP_SCORING_SYSTEM};
use crate::types::{AiScore, ChunkingDetails, ScoredChunkGroup, ScoredFile};
use scorecard_ai_client::{safe_json_chat, ChatClient, ChatMessage, Usage};
use scorecard_chunker::FileChunkGroup;

/// Score every group of one file in file order, threading each group's
/// summary into the next group's prompt as intra-file context. A failed
/// group records a zeroed score; retries stay at 0 here (recovery waves
/// belong to batch scoring).
pub async fn score_file_groups(
    client: &dyn ChatClient,
    file: &FileChunkGroup,
    inter_file_context: &str,
    max_retries: usize,
) -> ScoredFile {
    let mut groups = Vec::new();
    let mut usage = Usage::default();
    let mut intra_file_context = FIRST_GROUP_SENTINEL.to_string();
    let mut any_failed = false;

    for group in &file.grouped_chunks {
        let messages = vec![
            ChatMessage::system(GROUP_SCORING_SYSTEM),
            ChatMessage::user(prompts::group_user_prompt(
                inter_file_context,
                &intra_file_context,
                &file.file_path,
                &group.combined_text,
            )),
        ];

        let (score, call_usage) = match safe_json_chat(client, messages, max_retries).await {
            Some((value, call_usage)) => {
                usage.add(call_usage);
                let score = AiScore::from_review(&value);
                if let Some(summary) = &score.group_summary {
                    intra_file_context = summary.clone();
                }
                (score, call_usage)
            }
            None => {
                log::warn!("Group {} of {} failed to score", group.id, file.file_path);
                any_failed = true;
                (AiScore::failed(FAILED_GROUP_SENTINEL), Usage::default())
            }
        };

        groups.push(ScoredChunkGroup {
            group_id: group.id,
            score,
            total_tokens: group.total_tokens,
            usage: call_usage,
        });
    }

    let all_failed = any_failed && groups.iter().all(|g| !g.score.is_success());
    finalize_scored_file(file, groups, usage, 0, all_failed)
}

/// Assemble a [`ScoredFile`] from its scored groups: token-weighted
/// averages over successful groups, impact as quality × complexity.
pub fn finalize_scored_file(
    file: &FileChunkGroup,
    groups: Vec<ScoredChunkGroup>,
    usage: Usage,
    retries: u32,
    had_error: bool,
) -> ScoredFile {
    let mut weight = 0.0;
    let mut complexity_sum = 0.0;
    let mut quality_sum = 0.0;

    for group in &groups {
        if !group.score.is_success() {
            continue;
        }
        let w = group.total_tokens as f64;
        weight += w;
        complexity_sum += group.score.complexity * w;
        quality_sum += group.score.quality_average() * w;
    }

    let (average_complexity, average_quality) = if weight == 0.0 {
        (0.0, 0.0)
    } else {
        (complexity_sum / weight, quality_sum / weight)
    };

    ScoredFile {
        file_path: file.file_path.clone(),
        total_original_tokens: file.total_file_tokens,
        final_token_count: file.final_token_count,
        impact_score: average_quality * average_complexity,
        average_complexity,
        average_quality,
        usage,
        retries,
        had_error,
        scored_chunk_groups: groups,
        chunking_details: ChunkingDetails {
            send_strategy: file.send_strategy,
            group_count: file.grouped_chunks.len(),
            oversized_count: file.oversized_chunks.len(),
            skipped_count: file.skipped_content.len(),
            token_breakdown: file.token_breakdown.clone(),
        },
    }
}

/// Terminal failure: zeroed axes, `had_error` set.
pub fn empty_scored_file(file: &FileChunkGroup, retries: u32) -> ScoredFile {
    finalize_scored_file(file, Vec::new(), Usage::default(), retries, true)
}

/// A batched file was judged once for its single group.
pub fn scored_file_from_single(
    file: &FileChunkGroup,
    score: AiScore,
    usage: Usage,
    retries: u32,
) -> ScoredFile {
    let group_id = file.grouped_chunks.first().map(|g| g.id).unwrap_or(1);
    let total_tokens = file
        .grouped_chunks
        .first()
        .map(|g| g.total_tokens)
        .unwrap_or(file.final_token_count);

    let groups = vec![ScoredChunkGroup {
        group_id,
        score,
        total_tokens,
        usage,
    }];
    finalize_scored_file(file, groups, usage, retries, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scorecard_chunker::{Chunker, ChunkerConfig};

    fn chunked(code: &str, path: &str) -> FileChunkGroup {
        Chunker::new(ChunkerConfig::default())
            .unwrap()
            .chunk_file(code, path)
            .unwrap()
    }

    #[test]
    fn impact_is_quality_times_complexity() {
        let file = chunked("export const f = () => 1;\n", "src/f.ts");
        let score = AiScore {
            complexity: 4.0,
            code_quality: 8.0,
            maintainability: 7.0,
            best_practices: 6.0,
            ..Default::default()
        };
        let scored = scored_file_from_single(&file, score.clone(), Usage::default(), 0);

        assert!((scored.average_complexity - 4.0).abs() < 1e-9);
        assert!((scored.average_quality - 7.0).abs() < 1e-9);
        assert!((scored.impact_score - 28.0).abs() < 1e-9);
        assert!(!scored.had_error);
        assert_eq!(scored.retries, 0);
    }

    #[test]
    fn empty_scored_file_is_zeroed_with_error() {
        let file = chunked("export const f = () => 1;\n", "src/f.ts");
        let scored = empty_scored_file(&file, 1);

        assert_eq!(scored.impact_score, 0.0);
        assert_eq!(scored.average_complexity, 0.0);
        assert!(scored.had_error);
        assert_eq!(scored.retries, 1);
        assert!(scored.scored_chunk_groups.is_empty());
        assert_eq!(scored.total_original_tokens, file.total_file_tokens);
    }
}
