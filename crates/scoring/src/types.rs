use scorecard_ai_client::Usage;
use scorecard_chunker::{SendStrategy, TokenBreakdown};
use serde::{Deserialize, Serialize};

/// One AI judgment over a chunk group. Axes live in `[0, 10]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AiScore {
    pub complexity: f64,
    pub code_quality: f64,
    pub maintainability: f64,
    pub best_practices: f64,
    /// Short summary carried into the next group's prompt as intra-file
    /// context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strengths: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weaknesses: Option<String>,
}

impl AiScore {
    /// Mean of the three quality-flavored axes.
    pub fn quality_average(&self) -> f64 {
        (self.code_quality + self.maintainability + self.best_practices) / 3.0
    }

    /// A zeroed score used when a group or file could not be judged.
    pub fn failed(reason: &str) -> Self {
        Self {
            group_summary: Some(reason.to_string()),
            ..Default::default()
        }
    }

    /// Successful judgments carry complexity > 0.
    pub fn is_success(&self) -> bool {
        self.complexity > 0.0
    }

    fn clamp_axis(value: f64) -> f64 {
        value.clamp(0.0, 10.0)
    }

    /// Parse a review object, clamping every axis into `[0, 10]`.
    pub fn from_review(value: &serde_json::Value) -> Self {
        let axis = |key: &str| {
            Self::clamp_axis(value.get(key).and_then(|v| v.as_f64()).unwrap_or(0.0))
        };
        let text = |key: &str| {
            value
                .get(key)
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
        };
        Self {
            complexity: axis("complexity"),
            code_quality: axis("code_quality"),
            maintainability: axis("maintainability"),
            best_practices: axis("best_practices"),
            group_summary: text("group_summary"),
            strengths: text("strengths"),
            weaknesses: text("weaknesses"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredChunkGroup {
    pub group_id: usize,
    pub score: AiScore,
    pub total_tokens: usize,
    pub usage: Usage,
}

/// Condensed view of how a file was chunked, carried on the scored file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkingDetails {
    pub send_strategy: SendStrategy,
    pub group_count: usize,
    pub oversized_count: usize,
    pub skipped_count: usize,
    pub token_breakdown: TokenBreakdown,
}

/// Immutable per-file scoring result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredFile {
    pub file_path: String,
    pub total_original_tokens: usize,
    pub final_token_count: usize,
    pub impact_score: f64,
    pub average_complexity: f64,
    pub average_quality: f64,
    pub usage: Usage,
    pub retries: u32,
    pub had_error: bool,
    pub scored_chunk_groups: Vec<ScoredChunkGroup>,
    pub chunking_details: ChunkingDetails,
}

impl ScoredFile {
    /// Token-weighted averages of the four axes over successful groups:
    /// (complexity, quality, maintainability, best practices).
    pub fn axis_averages(&self) -> (f64, f64, f64, f64) {
        let mut weight = 0.0;
        let mut axes = (0.0, 0.0, 0.0, 0.0);
        for group in &self.scored_chunk_groups {
            if !group.score.is_success() {
                continue;
            }
            let w = group.total_tokens as f64;
            weight += w;
            axes.0 += group.score.complexity * w;
            axes.1 += group.score.code_quality * w;
            axes.2 += group.score.maintainability * w;
            axes.3 += group.score.best_practices * w;
        }
        if weight == 0.0 {
            (0.0, 0.0, 0.0, 0.0)
        } else {
            (axes.0 / weight, axes.1 / weight, axes.2 / weight, axes.3 / weight)
        }
    }
}

/// Stage-1 inference over the repository's README and file tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProjectContext {
    pub project_essence: String,
    pub primary_domain: String,
    pub primary_stack: String,
    #[serde(default)]
    pub core_concepts: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlaggedFile {
    pub path: String,
    pub reason: String,
}

/// Stage-2 output: the resolved selection plus everything worth caching.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileSelection {
    pub files: Vec<String>,
    pub flagged: Vec<FlaggedFile>,
    pub warnings: Vec<String>,
    pub usage: Usage,
    pub context: ProjectContext,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct ProjectProfile {
    pub complexity: f64,
    pub quality: f64,
    pub maintainability: f64,
    pub best_practices: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinalReview {
    pub multiplier: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tech_stack: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    pub usage: Usage,
}

/// The project-level artifact: preliminary profile, calibration, ranked
/// files. `scored_files` stays sorted by impact descending.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectScorecard {
    pub run_id: String,
    pub repo_name: String,
    pub model: String,
    pub preliminary_project_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_project_score: Option<f64>,
    pub main_domain: String,
    pub tech_stack: String,
    pub project_essence: String,
    pub profile: ProjectProfile,
    pub usage: Usage,
    pub total_retries: u32,
    pub total_failed_files: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_review: Option<FinalReview>,
    pub scored_files: Vec<ScoredFile>,
    pub warnings: Vec<String>,
}

impl ProjectScorecard {
    /// Re-sort after any insertion; ties keep path order for determinism.
    pub fn sort_files_by_impact(&mut self) {
        self.scored_files.sort_by(|a, b| {
            b.impact_score
                .partial_cmp(&a.impact_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.file_path.cmp(&b.file_path))
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(id: usize, complexity: f64, quality: f64, tokens: usize) -> ScoredChunkGroup {
        ScoredChunkGroup {
            group_id: id,
            score: AiScore {
                complexity,
                code_quality: quality,
                maintainability: quality,
                best_practices: quality,
                ..Default::default()
            },
            total_tokens: tokens,
            usage: Usage::default(),
        }
    }

    fn details() -> ChunkingDetails {
        ChunkingDetails {
            send_strategy: SendStrategy::MultipleGroups,
            group_count: 2,
            oversized_count: 0,
            skipped_count: 0,
            token_breakdown: TokenBreakdown::default(),
        }
    }

    #[test]
    fn quality_average_is_mean_of_three_axes() {
        let score = AiScore {
            complexity: 5.0,
            code_quality: 6.0,
            maintainability: 7.0,
            best_practices: 8.0,
            ..Default::default()
        };
        assert!((score.quality_average() - 7.0).abs() < 1e-9);
    }

    #[test]
    fn axis_averages_weight_by_group_tokens() {
        let file = ScoredFile {
            file_path: "a.ts".to_string(),
            total_original_tokens: 100,
            final_token_count: 90,
            impact_score: 0.0,
            average_complexity: 0.0,
            average_quality: 0.0,
            usage: Usage::default(),
            retries: 0,
            had_error: false,
            scored_chunk_groups: vec![group(1, 4.0, 8.0, 100), group(2, 8.0, 4.0, 300)],
            chunking_details: details(),
        };
        let (complexity, quality, _, _) = file.axis_averages();
        assert!((complexity - 7.0).abs() < 1e-9);
        assert!((quality - 5.0).abs() < 1e-9);
    }

    #[test]
    fn axis_averages_skip_failed_groups() {
        let mut failed = group(2, 0.0, 0.0, 1_000_000);
        failed.score.group_summary = Some("(scoring failed)".to_string());

        let file = ScoredFile {
            file_path: "a.ts".to_string(),
            total_original_tokens: 100,
            final_token_count: 90,
            impact_score: 0.0,
            average_complexity: 0.0,
            average_quality: 0.0,
            usage: Usage::default(),
            retries: 0,
            had_error: false,
            scored_chunk_groups: vec![group(1, 6.0, 6.0, 100), failed],
            chunking_details: details(),
        };
        let (complexity, ..) = file.axis_averages();
        assert!((complexity - 6.0).abs() < 1e-9);
    }

    #[test]
    fn from_review_clamps_axes() {
        let value = serde_json::json!({
            "complexity": 14.0,
            "code_quality": -3.0,
            "maintainability": 6.5,
            "best_practices": 7.0,
            "group_summary": "solid module"
        });
        let score = AiScore::from_review(&value);
        assert_eq!(score.complexity, 10.0);
        assert_eq!(score.code_quality, 0.0);
        assert_eq!(score.maintainability, 6.5);
        assert_eq!(score.group_summary.as_deref(), Some("solid module"));
    }

    #[test]
    fn sort_is_impact_descending_with_stable_ties() {
        let mk = |path: &str, impact: f64| ScoredFile {
            file_path: path.to_string(),
            total_original_tokens: 1,
            final_token_count: 1,
            impact_score: impact,
            average_complexity: 0.0,
            average_quality: 0.0,
            usage: Usage::default(),
            retries: 0,
            had_error: false,
            scored_chunk_groups: Vec::new(),
            chunking_details: details(),
        };
        let mut card = ProjectScorecard {
            run_id: "r".to_string(),
            repo_name: "repo".to_string(),
            model: "m".to_string(),
            preliminary_project_score: 0.0,
            final_project_score: None,
            main_domain: String::new(),
            tech_stack: String::new(),
            project_essence: String::new(),
            profile: ProjectProfile::default(),
            usage: Usage::default(),
            total_retries: 0,
            total_failed_files: 0,
            final_review: None,
            scored_files: vec![mk("b.ts", 10.0), mk("a.ts", 30.0), mk("c.ts", 10.0)],
            warnings: Vec::new(),
        };
        card.sort_files_by_impact();
        let order: Vec<&str> = card.scored_files.iter().map(|f| f.file_path.as_str()).collect();
        assert_eq!(order, vec!["a.ts", "b.ts", "c.ts"]);
    }
}
