use scorecard_chunker::ChunkerConfig;
use scorecard_scoring::ScoringConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const DEFAULT_BIND: &str = "127.0.0.1:7878";
const DEFAULT_SCORING_MODEL: &str = "gpt-4o-mini";
const DEFAULT_REVIEW_MODEL: &str = "gpt-4o";

/// Server-level configuration; environment overrides use the
/// `SCORECARD_*` variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: String,
    /// Where report artifacts live (one directory per repository).
    pub reports_root: PathBuf,
    /// Where repositories are cloned.
    pub repo_root: PathBuf,
    pub provider: String,
    pub scoring_model: String,
    pub review_model: String,
    pub ai_timeout_ms: u64,
    pub chunker: ChunkerConfig,
    pub scoring: ScoringConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            reports_root: PathBuf::from("reports"),
            repo_root: PathBuf::from("repos"),
            provider: "openai".to_string(),
            scoring_model: DEFAULT_SCORING_MODEL.to_string(),
            review_model: DEFAULT_REVIEW_MODEL.to_string(),
            ai_timeout_ms: 45_000,
            chunker: ChunkerConfig::default(),
            scoring: ScoringConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Defaults overlaid with any `SCORECARD_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(bind) = std::env::var("SCORECARD_BIND") {
            config.bind = bind;
        }
        if let Ok(root) = std::env::var("SCORECARD_REPORTS_ROOT") {
            config.reports_root = PathBuf::from(root);
        }
        if let Ok(root) = std::env::var("SCORECARD_REPO_ROOT") {
            config.repo_root = PathBuf::from(root);
        }
        if let Ok(provider) = std::env::var("SCORECARD_PROVIDER") {
            config.provider = provider;
        }
        if let Ok(model) = std::env::var("SCORECARD_SCORING_MODEL") {
            config.scoring_model = model;
        }
        if let Ok(model) = std::env::var("SCORECARD_REVIEW_MODEL") {
            config.review_model = model;
        }
        if let Ok(timeout) = std::env::var("SCORECARD_AI_TIMEOUT_MS") {
            if let Ok(parsed) = timeout.parse() {
                config.ai_timeout_ms = parsed;
            }
        }
        config
    }
}
