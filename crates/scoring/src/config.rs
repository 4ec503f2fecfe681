use serde::{Deserialize, Serialize};

/// How the final-review dossier selects its evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DossierStrategy {
    /// Whole files by impact until the budget runs out.
    #[default]
    GlobalTopImpact,
    /// One highest-impact group per file, ranked across files.
    TopImpactPerFile,
}

/// Budgets and retry caps for the scoring engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Token ceiling for one multi-file batch call.
    pub batch_budget: usize,

    /// Token ceiling for the final-review dossier.
    pub dossier_budget: usize,

    /// Attempts per JSON-demanding AI call.
    pub ai_max_retries: usize,

    pub dossier_strategy: DossierStrategy,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            batch_budget: 5100,
            dossier_budget: 16_000,
            ai_max_retries: 3,
            dossier_strategy: DossierStrategy::GlobalTopImpact,
        }
    }
}
