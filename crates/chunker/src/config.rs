use crate::error::{ChunkError, Result};
use serde::{Deserialize, Serialize};

/// Token budgets and heuristics for the chunker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Hard limit for a single chunk; larger nodes are sub-chunked or
    /// fallback-split.
    pub max_tokens_per_chunk: usize,

    /// Hard limit for one group's combined text (header included).
    pub max_tokens_per_group: usize,

    /// Budget for the per-file context header.
    pub max_context_tokens: usize,

    /// Maximum number of header items taken from the strategy.
    pub context_item_limit: usize,

    /// Comment-line ratio above which a chunk is treated as boilerplate.
    pub boilerplate_threshold: f64,

    /// Ignore extensions and chunk every file with the simple-text strategy.
    pub force_simple_strategy: bool,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_tokens_per_chunk: 800,
            max_tokens_per_group: 2500,
            max_context_tokens: 200,
            context_item_limit: 15,
            boilerplate_threshold: 0.6,
            force_simple_strategy: false,
        }
    }
}

impl ChunkerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_tokens_per_chunk == 0 {
            return Err(ChunkError::invalid_config("max_tokens_per_chunk must be > 0"));
        }
        if self.max_tokens_per_chunk > self.max_tokens_per_group {
            return Err(ChunkError::invalid_config(format!(
                "max_tokens_per_chunk ({}) cannot exceed max_tokens_per_group ({})",
                self.max_tokens_per_chunk, self.max_tokens_per_group
            )));
        }
        if self.max_context_tokens >= self.max_tokens_per_group {
            return Err(ChunkError::invalid_config(format!(
                "max_context_tokens ({}) must leave room in max_tokens_per_group ({})",
                self.max_context_tokens, self.max_tokens_per_group
            )));
        }
        if !(0.0..=1.0).contains(&self.boilerplate_threshold) {
            return Err(ChunkError::invalid_config("boilerplate_threshold must be in [0, 1]"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(ChunkerConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_chunk_budget_above_group_budget() {
        let config = ChunkerConfig {
            max_tokens_per_chunk: 5000,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_context_budget_consuming_group_budget() {
        let config = ChunkerConfig {
            max_context_tokens: 2500,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let config = ChunkerConfig {
            boilerplate_threshold: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
