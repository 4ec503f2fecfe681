//! Batched multi-file scoring: bin packing and review reconciliation.

use crate::types::AiScore;
use scorecard_ai_client::Usage;
use scorecard_chunker::{FileChunkGroup, SendStrategy};

/// A file can join a batch iff it travels as one group and leaves room for
/// at least one companion under the batch budget.
pub fn is_batchable(file: &FileChunkGroup, batch_budget: usize) -> bool {
    matches!(
        file.send_strategy,
        SendStrategy::FullFile | SendStrategy::SingleGroup
    ) && file.final_token_count > 0
        && file.final_token_count < batch_budget
}

/// First-fit-decreasing packing: sort by weight descending, then repeatedly
/// sweep the remaining list admitting everything that still fits, emitting
/// one batch per sweep.
pub fn plan_batches<T: Clone>(items: &[(T, usize)], budget: usize) -> Vec<Vec<(T, usize)>> {
    let mut remaining: Vec<(T, usize)> = items.to_vec();
    remaining.sort_by(|a, b| b.1.cmp(&a.1));

    let mut batches = Vec::new();
    while !remaining.is_empty() {
        let mut batch = Vec::new();
        let mut rest = Vec::new();
        let mut sum = 0usize;

        for item in remaining {
            if sum + item.1 <= budget {
                sum += item.1;
                batch.push(item);
            } else {
                rest.push(item);
            }
        }

        if batch.is_empty() {
            // Defensive: an item at or above the budget travels alone.
            batch.push(rest.remove(0));
        }

        remaining = rest;
        batches.push(batch);
    }

    batches
}

/// Match returned reviews back to batch members by file-path suffix and
/// split the call's usage across the matched files: prompt tokens
/// proportional to each file's weight, completion tokens in equal shares.
/// Unmatched members come back as failures.
pub(crate) fn reconcile_reviews(
    batch: &[(String, usize)],
    reviews: &[serde_json::Value],
    usage: Usage,
) -> (Vec<(String, AiScore, Usage)>, Vec<String>) {
    let batch_total: usize = batch.iter().map(|(_, tokens)| tokens).sum();
    let share_count = batch.len().max(1) as u64;

    let mut matched: Vec<(String, AiScore, Usage)> = Vec::new();
    let mut matched_paths: Vec<&str> = Vec::new();

    for review in reviews {
        let Some(review_path) = review.get("file_path").and_then(|v| v.as_str()) else {
            continue;
        };
        let review_path = review_path.trim_start_matches("./");

        let Some((path, tokens)) = batch.iter().find(|(path, _)| {
            !matched_paths.contains(&path.as_str())
                && (path == review_path || path.ends_with(review_path))
        }) else {
            log::warn!("Review for unknown batch member: {review_path}");
            continue;
        };

        let prompt_share = if batch_total == 0 {
            0
        } else {
            (usage.prompt_tokens as f64 * (*tokens as f64 / batch_total as f64)).round() as u64
        };
        let completion_share = usage.completion_tokens / share_count;

        matched_paths.push(path.as_str());
        matched.push((
            path.clone(),
            AiScore::from_review(review),
            Usage {
                prompt_tokens: prompt_share,
                completion_tokens: completion_share,
                total_tokens: prompt_share + completion_share,
            },
        ));
    }

    let failed = batch
        .iter()
        .filter(|(path, _)| !matched_paths.contains(&path.as_str()))
        .map(|(path, _)| path.clone())
        .collect();

    (matched, failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn items(weights: &[usize]) -> Vec<(String, usize)> {
        weights
            .iter()
            .enumerate()
            .map(|(idx, w)| (format!("file{idx}.ts"), *w))
            .collect()
    }

    #[test]
    fn packing_is_first_fit_decreasing_over_remaining() {
        let batches = plan_batches(&items(&[4000, 1500, 900]), 5100);

        assert_eq!(batches.len(), 2);
        let first: Vec<usize> = batches[0].iter().map(|(_, w)| *w).collect();
        let second: Vec<usize> = batches[1].iter().map(|(_, w)| *w).collect();
        assert_eq!(first, vec![4000, 900]);
        assert_eq!(second, vec![1500]);
    }

    #[test]
    fn packing_never_exceeds_budget() {
        let weights = [4800, 3000, 2100, 2000, 1800, 900, 600, 400, 250, 100];
        let batches = plan_batches(&items(&weights), 5100);

        let mut seen = 0;
        for batch in &batches {
            let sum: usize = batch.iter().map(|(_, w)| *w).sum();
            assert!(sum <= 5100, "batch sum {sum} over budget");
            seen += batch.len();
        }
        assert_eq!(seen, weights.len());
    }

    #[test]
    fn reconcile_matches_by_suffix_and_splits_usage() {
        let batch = vec![
            ("src/deep/alpha.ts".to_string(), 3000),
            ("src/beta.ts".to_string(), 1000),
        ];
        let reviews = vec![
            json!({"file_path": "alpha.ts", "complexity": 6.0, "code_quality": 7.0,
                   "maintainability": 7.0, "best_practices": 6.0, "group_summary": "ok"}),
            json!({"file_path": "src/beta.ts", "complexity": 4.0, "code_quality": 5.0,
                   "maintainability": 5.0, "best_practices": 5.0, "group_summary": "ok"}),
        ];
        let usage = Usage {
            prompt_tokens: 4000,
            completion_tokens: 200,
            total_tokens: 4200,
        };

        let (matched, failed) = reconcile_reviews(&batch, &reviews, usage);

        assert!(failed.is_empty());
        assert_eq!(matched.len(), 2);
        assert_eq!(matched[0].0, "src/deep/alpha.ts");
        assert_eq!(matched[0].2.prompt_tokens, 3000);
        assert_eq!(matched[0].2.completion_tokens, 100);
        assert_eq!(matched[1].2.prompt_tokens, 1000);
    }

    #[test]
    fn reconcile_reports_unmatched_members_as_failed() {
        let batch = vec![
            ("src/a.ts".to_string(), 1000),
            ("src/b.ts".to_string(), 1000),
            ("src/c.ts".to_string(), 1000),
        ];
        let reviews = vec![
            json!({"file_path": "a.ts", "complexity": 6.0, "code_quality": 6.0,
                   "maintainability": 6.0, "best_practices": 6.0}),
            json!({"file_path": "b.ts", "complexity": 5.0, "code_quality": 5.0,
                   "maintainability": 5.0, "best_practices": 5.0}),
        ];

        let (matched, failed) = reconcile_reviews(&batch, &reviews, Usage::default());
        assert_eq!(matched.len(), 2);
        assert_eq!(failed, vec!["src/c.ts".to_string()]);
    }
}
