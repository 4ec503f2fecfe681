//! Dossier construction: the budgeted evidence bundle for final review.

use crate::config::DossierStrategy;
use crate::error::{Result, ScoringError};
use crate::types::ScoredFile;
use scorecard_chunker::FileChunkGroup;

/// Build the dossier text from scored files and their chunked sources.
///
/// `global_top_impact` admits whole files by impact until the budget is
/// exhausted; `top_impact_per_file` admits the single highest-impact group
/// of each file, ranked across files. At least one file must enter.
pub fn build_dossier(
    files: &[(&ScoredFile, &FileChunkGroup)],
    strategy: DossierStrategy,
    budget: usize,
) -> Result<String> {
    let dossier = match strategy {
        DossierStrategy::GlobalTopImpact => global_top_impact(files, budget),
        DossierStrategy::TopImpactPerFile => top_impact_per_file(files, budget),
    };

    if dossier.is_empty() {
        return Err(ScoringError::EmptyDossier);
    }
    Ok(dossier.join("\n"))
}

fn global_top_impact(files: &[(&ScoredFile, &FileChunkGroup)], budget: usize) -> Vec<String> {
    let mut ranked: Vec<&(&ScoredFile, &FileChunkGroup)> = files.iter().collect();
    ranked.sort_by(|a, b| {
        b.0.impact_score
            .partial_cmp(&a.0.impact_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut sections = Vec::new();
    let mut remaining = budget;

    for &(scored, chunked) in ranked {
        let cost: usize = chunked.grouped_chunks.iter().map(|g| g.total_tokens).sum();
        if cost == 0 || cost > remaining {
            continue;
        }
        remaining -= cost;

        let mut section = format!(
            "## {} (impact {:.1})\n",
            scored.file_path, scored.impact_score
        );
        for group in &chunked.grouped_chunks {
            let annotation = scored
                .scored_chunk_groups
                .iter()
                .find(|g| g.group_id == group.id)
                .map(|g| {
                    format!(
                        "complexity {:.1}, quality {:.1}",
                        g.score.complexity,
                        g.score.quality_average()
                    )
                })
                .unwrap_or_else(|| "unscored".to_string());
            section.push_str(&format!("### group {} ({annotation})\n", group.id));
            section.push_str(&group.combined_text);
            section.push('\n');
        }
        sections.push(section);
    }

    sections
}

fn top_impact_per_file(files: &[(&ScoredFile, &FileChunkGroup)], budget: usize) -> Vec<String> {
    struct Pick<'a> {
        scored: &'a ScoredFile,
        group_id: usize,
        impact: f64,
        tokens: usize,
        text: &'a str,
        annotation: String,
    }

    let mut picks: Vec<Pick<'_>> = Vec::new();
    for &(scored, chunked) in files {
        let best = scored
            .scored_chunk_groups
            .iter()
            .filter(|g| g.score.is_success())
            .max_by(|a, b| {
                let ia = a.score.quality_average() * a.score.complexity;
                let ib = b.score.quality_average() * b.score.complexity;
                ia.partial_cmp(&ib).unwrap_or(std::cmp::Ordering::Equal)
            });
        let Some(best) = best else {
            continue;
        };
        let Some(group) = chunked.grouped_chunks.iter().find(|g| g.id == best.group_id) else {
            continue;
        };
        picks.push(Pick {
            scored,
            group_id: group.id,
            impact: best.score.quality_average() * best.score.complexity,
            tokens: group.total_tokens,
            text: &group.combined_text,
            annotation: format!(
                "complexity {:.1}, quality {:.1}",
                best.score.complexity,
                best.score.quality_average()
            ),
        });
    }

    picks.sort_by(|a, b| b.impact.partial_cmp(&a.impact).unwrap_or(std::cmp::Ordering::Equal));

    let mut sections = Vec::new();
    let mut remaining = budget;
    for pick in picks {
        if pick.tokens == 0 || pick.tokens > remaining {
            continue;
        }
        remaining -= pick.tokens;
        sections.push(format!(
            "## {} group {} ({})\n{}\n",
            pick.scored.file_path, pick.group_id, pick.annotation, pick.text
        ));
    }

    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group_scorer::scored_file_from_single;
    use crate::types::AiScore;
    use scorecard_ai_client::Usage;
    use scorecard_chunker::{Chunker, ChunkerConfig};

    fn fixture(path: &str, complexity: f64, quality: f64) -> (ScoredFile, FileChunkGroup) {
        let code = format!("export function f_{}() {{ return {complexity}; }}\n", path.len());
        let chunked = Chunker::new(ChunkerConfig::default())
            .unwrap()
            .chunk_file(&code, path)
            .unwrap();
        let score = AiScore {
            complexity,
            code_quality: quality,
            maintainability: quality,
            best_practices: quality,
            ..Default::default()
        };
        let scored = scored_file_from_single(&chunked, score, Usage::default(), 0);
        (scored, chunked)
    }

    #[test]
    fn global_strategy_orders_by_impact_and_respects_budget() {
        let (low_s, low_c) = fixture("src/low.ts", 2.0, 4.0);
        let (high_s, high_c) = fixture("src/high.ts", 9.0, 9.0);
        let files = vec![(&low_s, &low_c), (&high_s, &high_c)];

        let dossier = build_dossier(&files, DossierStrategy::GlobalTopImpact, 16_000).unwrap();
        let high_pos = dossier.find("src/high.ts").unwrap();
        let low_pos = dossier.find("src/low.ts").unwrap();
        assert!(high_pos < low_pos);
        assert!(dossier.contains("complexity 9.0"));
    }

    #[test]
    fn tight_budget_admits_only_top_files() {
        let (low_s, low_c) = fixture("src/low.ts", 2.0, 4.0);
        let (high_s, high_c) = fixture("src/high.ts", 9.0, 9.0);
        let high_cost: usize = high_c.grouped_chunks.iter().map(|g| g.total_tokens).sum();

        let files = vec![(&low_s, &low_c), (&high_s, &high_c)];
        let dossier = build_dossier(&files, DossierStrategy::GlobalTopImpact, high_cost).unwrap();

        assert!(dossier.contains("src/high.ts"));
        assert!(!dossier.contains("src/low.ts"));
    }

    #[test]
    fn per_file_strategy_picks_one_group_each() {
        let (a_s, a_c) = fixture("src/a.ts", 5.0, 6.0);
        let (b_s, b_c) = fixture("src/b.ts", 7.0, 7.0);
        let files = vec![(&a_s, &a_c), (&b_s, &b_c)];

        let dossier = build_dossier(&files, DossierStrategy::TopImpactPerFile, 16_000).unwrap();
        assert!(dossier.contains("src/a.ts group 1"));
        assert!(dossier.contains("src/b.ts group 1"));
    }

    #[test]
    fn empty_input_is_an_error() {
        let files: Vec<(&ScoredFile, &FileChunkGroup)> = Vec::new();
        let err = build_dossier(&files, DossierStrategy::GlobalTopImpact, 16_000).unwrap_err();
        assert!(matches!(err, ScoringError::EmptyDossier));
    }
}
