//! Preliminary aggregation: file scores into a project profile.

use crate::types::{ProjectContext, ProjectProfile, ProjectScorecard, ScoredFile};
use scorecard_ai_client::Usage;

const WEIGHT_COMPLEXITY: f64 = 0.40;
const WEIGHT_QUALITY: f64 = 0.25;
const WEIGHT_MAINTAINABILITY: f64 = 0.15;
const WEIGHT_BEST_PRACTICES: f64 = 0.20;

/// Fold scored files into the preliminary scorecard. Each file's axis
/// averages (already group-token-weighted) enter the project profile
/// weighted by the file's original token count; files with no successful
/// group carry no weight and are counted as failures instead.
pub fn aggregate_scorecard(
    run_id: &str,
    repo_name: &str,
    model: &str,
    context: &ProjectContext,
    scored_files: Vec<ScoredFile>,
    mut warnings: Vec<String>,
) -> ProjectScorecard {
    let mut weight = 0.0;
    let mut profile_sum = (0.0, 0.0, 0.0, 0.0);
    let mut usage = Usage::default();
    let mut total_retries = 0u32;
    let mut total_failed_files = 0u32;

    for file in &scored_files {
        usage.add(file.usage);
        total_retries += file.retries;

        let (complexity, quality, maintainability, best_practices) = file.axis_averages();
        let scorable = file.scored_chunk_groups.iter().any(|g| g.score.is_success());
        if !scorable {
            total_failed_files += 1;
            if file.had_error {
                warnings.push(format!("File failed scoring: {}", file.file_path));
            }
            continue;
        }

        let w = file.total_original_tokens as f64;
        weight += w;
        profile_sum.0 += complexity * w;
        profile_sum.1 += quality * w;
        profile_sum.2 += maintainability * w;
        profile_sum.3 += best_practices * w;
    }

    let profile = if weight == 0.0 {
        ProjectProfile::default()
    } else {
        ProjectProfile {
            complexity: profile_sum.0 / weight,
            quality: profile_sum.1 / weight,
            maintainability: profile_sum.2 / weight,
            best_practices: profile_sum.3 / weight,
        }
    };

    let preliminary_project_score = WEIGHT_COMPLEXITY * profile.complexity
        + WEIGHT_QUALITY * profile.quality
        + WEIGHT_MAINTAINABILITY * profile.maintainability
        + WEIGHT_BEST_PRACTICES * profile.best_practices;

    let mut scorecard = ProjectScorecard {
        run_id: run_id.to_string(),
        repo_name: repo_name.to_string(),
        model: model.to_string(),
        preliminary_project_score,
        final_project_score: None,
        main_domain: context.primary_domain.clone(),
        tech_stack: context.primary_stack.clone(),
        project_essence: context.project_essence.clone(),
        profile,
        usage,
        total_retries,
        total_failed_files,
        final_review: None,
        scored_files,
        warnings,
    };
    scorecard.sort_files_by_impact();
    scorecard
}
