//! Prompt assembly for every AI call in the pipeline.

use crate::types::{ProjectContext, ProjectProfile};

/// Sentinel used before the first group of a file has been summarized.
pub const FIRST_GROUP_SENTINEL: &str = "(first group of this file)";

/// Summary recorded on a group whose scoring call failed terminally.
pub const FAILED_GROUP_SENTINEL: &str = "(scoring failed)";

/// Boundary between files inside one batch prompt.
pub const BATCH_FILE_BOUNDARY: &str = "\n===== FILE: {path} =====\n";

pub const CONTEXT_SYSTEM: &str = "You are a software analyst. Given a repository's README excerpt and file tree, infer what the project is. Respond with a JSON object: {\"project_essence\": string, \"primary_domain\": string, \"primary_stack\": string, \"core_concepts\": [string]}.";

pub const SELECTION_SYSTEM: &str = "You are a code reviewer planning an audit. From the file tree, choose the files that best represent the project's own engineering quality. Prefer core logic over generated, vendored or configuration files. You may select whole directories. Append ' # <reason>' to any path you suspect is vendored or third-party code. Respond with a JSON object: {\"files\": [string]}.";

pub const GROUP_SCORING_SYSTEM: &str = "You are a strict senior code reviewer. Score the given code on four axes from 0 to 10: complexity (intellectual difficulty of the problem being solved), code_quality, maintainability, best_practices. Respond with a JSON object carrying those four numbers plus \"group_summary\" (one sentence), \"strengths\" and \"weaknesses\".";

pub const BATCH_SCORING_SYSTEM: &str = "You are a strict senior code reviewer. Several files follow, each introduced by a '===== FILE: <path> =====' boundary. Score every file independently on four axes from 0 to 10: complexity, code_quality, maintainability, best_practices. Respond with a JSON object {\"reviews\": [{\"file_path\": string, \"complexity\": number, \"code_quality\": number, \"maintainability\": number, \"best_practices\": number, \"group_summary\": string}]} with exactly one review per file.";

pub const FINAL_REVIEW_SYSTEM: &str = "You are calibrating a project quality scorecard. You receive the preliminary profile and a dossier of the highest-impact code. Judge whether the preliminary score over- or under-states the project and respond with a JSON object: {\"final_score_multiplier\": number between 0.8 and 1.25, \"tech_stack\": string, \"summary\": string, \"reasoning\": string}.";

pub fn context_user_prompt(repo_name: &str, readme_excerpt: &str, file_tree: &[String]) -> String {
    format!(
        "Repository: {repo_name}\n\nREADME excerpt:\n{readme}\n\nFile tree:\n{tree}\n",
        readme = if readme_excerpt.is_empty() {
            "(no README found)"
        } else {
            readme_excerpt
        },
        tree = file_tree.join("\n"),
    )
}

pub fn selection_user_prompt(context: &ProjectContext, file_tree: &[String]) -> String {
    format!(
        "Project essence: {essence}\nDomain: {domain}\nStack: {stack}\n\nFile tree:\n{tree}\n",
        essence = context.project_essence,
        domain = context.primary_domain,
        stack = context.primary_stack,
        tree = file_tree.join("\n"),
    )
}

/// Static inter-file context string reused for every scoring call of a run.
pub fn inter_file_context(context: &ProjectContext) -> String {
    format!(
        "Project: {} | Domain: {} | Stack: {}",
        context.project_essence, context.primary_domain, context.primary_stack
    )
}

pub fn group_user_prompt(
    inter_file: &str,
    intra_file: &str,
    file_path: &str,
    combined_text: &str,
) -> String {
    format!(
        "{inter_file}\nEarlier in this file: {intra_file}\n\nFile: {file_path}\n\n{combined_text}"
    )
}

pub fn batch_user_prompt(inter_file: &str, files: &[(&str, &str)]) -> String {
    let mut prompt = format!("{inter_file}\n");
    for (path, text) in files {
        prompt.push_str(&BATCH_FILE_BOUNDARY.replace("{path}", path));
        prompt.push_str(text);
    }
    prompt
}

pub fn final_review_user_prompt(
    repo_name: &str,
    preliminary_score: f64,
    profile: &ProjectProfile,
    file_count: usize,
    dossier: &str,
) -> String {
    format!(
        "Repository: {repo_name}\nPreliminary score: {preliminary_score:.2}\nProfile: complexity {c:.2}, quality {q:.2}, maintainability {m:.2}, best practices {b:.2}\nScored files: {file_count}\n\nDossier:\n{dossier}",
        c = profile.complexity,
        q = profile.quality,
        m = profile.maintainability,
        b = profile.best_practices,
    )
}
