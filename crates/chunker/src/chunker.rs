//! The chunker: strategy-driven fragmentation of one file into budgeted,
//! context-preserving groups.

use crate::config::ChunkerConfig;
use crate::error::Result;
use crate::strategy::{strategy_for, LanguageStrategy, NodeInfo, ParsedTree};
use crate::types::{
    Chunk, ChunkGroup, FileChunkGroup, SendStrategy, ShellContext, SkippedContent, TokenBreakdown,
};
use scorecard_tokenizer::count;

const CONTEXT_MARKER: &str = "// --- context ---";
const SHELL_PLACEHOLDER: &str = "\n// ... members elided ...\n";
const END_OF_SHELL: &str = "\n// --- end of enclosing scope ---\n";

pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Fragment `code` along language-aware boundaries and pack the result
    /// into sendable groups.
    pub fn chunk_file(&self, code: &str, file_path: &str) -> Result<FileChunkGroup> {
        let strategy = strategy_for(file_path, &self.config);
        let total_file_tokens = count(code);

        let tree = strategy.parse(code)?;

        let context_header = self.build_header(file_path, strategy.as_ref(), &tree, code);
        let header_tokens = count(&context_header);

        let mut chunks = self.collect_chunks(strategy.as_ref(), &tree, code);
        chunks.sort_by(|a, b| a.start_line.cmp(&b.start_line).then(a.end_line.cmp(&b.end_line)));

        let mut skipped_content = Vec::new();
        for chunk in &mut chunks {
            if chunk.oversized {
                continue;
            }
            if let Some(reason) = strategy.should_skip(chunk) {
                skipped_content.push(SkippedContent {
                    chunk_type: chunk.chunk_type.clone(),
                    start_line: chunk.start_line,
                    end_line: chunk.end_line,
                    reason: reason.clone(),
                    tokens: chunk.code_tokens,
                });
                chunk.skip_reason = Some(reason);
            }
        }

        let oversized_chunks: Vec<Chunk> =
            chunks.iter().filter(|c| c.oversized).cloned().collect();
        let has_oversized = !oversized_chunks.is_empty();

        let fits_whole =
            total_file_tokens + header_tokens <= self.config.max_tokens_per_group && !has_oversized;

        let (send_strategy, grouped_chunks) = if fits_whole {
            let group = self.full_file_group(code, &context_header, total_file_tokens);
            (SendStrategy::FullFile, vec![group])
        } else {
            let groups = self.pack_groups(&chunks, &context_header, header_tokens);
            let routing = match groups.len() {
                0 => SendStrategy::Unprocessed,
                1 => SendStrategy::SingleGroup,
                _ => SendStrategy::MultipleGroups,
            };
            if groups.is_empty() && !has_oversized {
                log::debug!("{file_path}: nothing sendable after skip filtering");
            }
            (routing, groups)
        };

        let final_token_count = grouped_chunks.iter().map(|g| g.total_tokens).sum();
        let token_breakdown = self.breakdown(
            total_file_tokens,
            header_tokens,
            &grouped_chunks,
            final_token_count,
        );

        Ok(FileChunkGroup {
            file_path: file_path.to_string(),
            total_file_tokens,
            chunks,
            grouped_chunks,
            oversized_chunks,
            send_strategy,
            final_token_count,
            skipped_content,
            context_header,
            token_breakdown,
        })
    }

    /// Header: file banner, marker, then strategy items (capped), tail
    /// truncated until the whole thing fits the context budget.
    fn build_header(
        &self,
        file_path: &str,
        strategy: &dyn LanguageStrategy,
        tree: &ParsedTree,
        code: &str,
    ) -> String {
        let mut lines: Vec<String> = vec![format!("// File: {file_path}"), CONTEXT_MARKER.to_string()];

        for item in strategy
            .header_items(tree, code)
            .into_iter()
            .take(self.config.context_item_limit)
        {
            for line in item.lines() {
                lines.push(line.to_string());
            }
        }

        let mut header = lines.join("\n") + "\n";
        while count(&header) > self.config.max_context_tokens && lines.len() > 2 {
            lines.pop();
            header = lines.join("\n") + "\n";
        }
        header
    }

    fn collect_chunks(
        &self,
        strategy: &dyn LanguageStrategy,
        tree: &ParsedTree,
        code: &str,
    ) -> Vec<Chunk> {
        let max_chunk = self.config.max_tokens_per_chunk;
        let mut chunks = Vec::new();

        for node in strategy.top_level_nodes(tree, code) {
            let tokens = count(node.text(code));
            if tokens <= max_chunk {
                chunks.push(make_chunk(&node, code, tokens, false, None));
                continue;
            }

            let subs = strategy.sub_nodes(tree, &node, code);
            if !subs.is_empty() {
                let shell = build_shell(&node, &subs, code);
                for sub in subs {
                    let sub_tokens = count(sub.text(code));
                    chunks.push(make_chunk(
                        &sub,
                        code,
                        sub_tokens,
                        sub_tokens > max_chunk,
                        Some(shell.clone()),
                    ));
                }
            } else {
                for part in strategy.fallback_split(&node, code, max_chunk) {
                    let part_tokens = count(part.text(code));
                    chunks.push(make_chunk(&part, code, part_tokens, false, None));
                }
            }
        }

        chunks
    }

    fn full_file_group(&self, code: &str, header: &str, total_file_tokens: usize) -> ChunkGroup {
        let end_line = code.lines().count().max(1);
        let synthetic = Chunk {
            original_text: code.to_string(),
            code_tokens: total_file_tokens,
            start_line: 1,
            end_line,
            chunk_type: "full_file".to_string(),
            shell_context: None,
            oversized: false,
            skip_reason: None,
        };
        let combined_text = format!("{header}{code}");
        let total_tokens = count(&combined_text);
        ChunkGroup {
            id: 1,
            chunks: vec![synthetic],
            combined_text,
            total_tokens,
            start_line: 1,
            end_line,
        }
    }

    /// Greedy grouping of active chunks under the per-group budget, then
    /// final text assembly with shell contexts and separators.
    fn pack_groups(&self, chunks: &[Chunk], header: &str, header_tokens: usize) -> Vec<ChunkGroup> {
        let budget = self.config.max_tokens_per_group.saturating_sub(header_tokens);

        let mut groups: Vec<Vec<Chunk>> = Vec::new();
        let mut current: Vec<Chunk> = Vec::new();
        let mut running = 0usize;
        let mut open_shell: Option<&ShellContext> = None;

        for chunk in chunks.iter().filter(|c| c.is_active()) {
            let mut cost = chunk.code_tokens + count(&separator_for(chunk));
            let entering_new_shell = match (&chunk.shell_context, open_shell) {
                (Some(shell), Some(open)) => shell != open,
                (Some(_), None) => true,
                (None, _) => false,
            };
            if entering_new_shell {
                let shell = chunk.shell_context.as_ref().expect("checked above");
                cost += shell.tokens + count(END_OF_SHELL);
            }

            if !current.is_empty() && running + cost > budget {
                groups.push(std::mem::take(&mut current));
                running = 0;
                open_shell = None;
                // The first chunk of the new group pays its shell again.
                if let Some(shell) = chunk.shell_context.as_ref() {
                    cost = chunk.code_tokens
                        + count(&separator_for(chunk))
                        + shell.tokens
                        + count(END_OF_SHELL);
                }
            }

            running += cost;
            open_shell = chunk.shell_context.as_ref();
            current.push(chunk.clone());
        }
        if !current.is_empty() {
            groups.push(current);
        }

        groups
            .into_iter()
            .enumerate()
            .map(|(idx, members)| self.assemble_group(idx + 1, members, header))
            .collect()
    }

    fn assemble_group(&self, id: usize, members: Vec<Chunk>, header: &str) -> ChunkGroup {
        let mut text = header.to_string();
        let mut open_shell: Option<ShellContext> = None;

        for chunk in &members {
            let switching = match (&chunk.shell_context, &open_shell) {
                (Some(shell), Some(open)) => shell != open,
                (Some(_), None) => true,
                (None, Some(_)) => true,
                (None, None) => false,
            };
            if switching {
                if open_shell.is_some() {
                    text.push_str(END_OF_SHELL);
                }
                if let Some(shell) = &chunk.shell_context {
                    text.push_str(&shell.text);
                }
                open_shell = chunk.shell_context.clone();
            }

            text.push_str(&separator_for(chunk));
            text.push_str(&chunk.original_text);
        }
        if open_shell.is_some() {
            text.push_str(END_OF_SHELL);
        }

        let start_line = members.iter().map(|c| c.start_line).min().unwrap_or(1);
        let end_line = members.iter().map(|c| c.end_line).max().unwrap_or(1);
        let total_tokens = count(&text);

        ChunkGroup {
            id,
            chunks: members,
            combined_text: text,
            total_tokens,
            start_line,
            end_line,
        }
    }

    fn breakdown(
        &self,
        original_file: usize,
        header_tokens: usize,
        groups: &[ChunkGroup],
        final_sent: usize,
    ) -> TokenBreakdown {
        let code_in_groups: usize = groups
            .iter()
            .map(|g| g.chunks.iter().map(|c| c.code_tokens).sum::<usize>())
            .sum();
        let file_header_in_groups = groups.len() * header_tokens;

        let mut shell_context_in_groups = 0usize;
        for group in groups {
            let mut seen: Vec<&ShellContext> = Vec::new();
            for chunk in &group.chunks {
                if let Some(shell) = &chunk.shell_context {
                    if !seen.contains(&shell) {
                        seen.push(shell);
                        shell_context_in_groups += shell.tokens;
                    }
                }
            }
        }

        // Separators absorb retokenization drift so the identity holds
        // exactly: final = code + header + shell + separator.
        let separator_in_groups = final_sent as i64
            - code_in_groups as i64
            - file_header_in_groups as i64
            - shell_context_in_groups as i64;

        let total_savings = original_file as i64 - final_sent as i64;
        let savings_percentage = if original_file == 0 {
            0.0
        } else {
            total_savings as f64 / original_file as f64
        };

        TokenBreakdown {
            original_file,
            code_in_groups,
            file_header_in_groups,
            shell_context_in_groups,
            separator_in_groups,
            final_sent,
            total_savings,
            savings_percentage,
        }
    }
}

fn make_chunk(
    node: &NodeInfo,
    code: &str,
    tokens: usize,
    oversized: bool,
    shell: Option<ShellContext>,
) -> Chunk {
    Chunk {
        original_text: node.text(code).to_string(),
        code_tokens: tokens,
        start_line: node.start_line,
        end_line: node.end_line,
        chunk_type: node.node_type.clone(),
        shell_context: shell,
        oversized,
        skip_reason: None,
    }
}

/// Separator preamble between chunks inside a group.
fn separator_for(chunk: &Chunk) -> String {
    format!(
        "\n// --- lines {}-{} ({}) ---\n",
        chunk.start_line, chunk.end_line, chunk.chunk_type
    )
}

/// Opening and closing scaffolding of a parent around its sub-chunks,
/// joined by a placeholder marker.
fn build_shell(node: &NodeInfo, subs: &[NodeInfo], code: &str) -> ShellContext {
    let first = subs.first().expect("shell requires sub-nodes");
    let last = subs.last().expect("shell requires sub-nodes");

    let opening = code[node.start_byte..first.start_byte].trim_end();
    let closing = code[last.end_byte..node.end_byte].trim_start();
    let text = format!("{opening}{SHELL_PLACEHOLDER}{closing}");
    let tokens = count(&text);

    ShellContext { text, tokens }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker() -> Chunker {
        Chunker::new(ChunkerConfig::default()).unwrap()
    }

    #[test]
    fn empty_file_is_one_full_file_group_with_header_only() {
        let result = chunker().chunk_file("", "src/empty.ts").unwrap();

        assert_eq!(result.send_strategy, SendStrategy::FullFile);
        assert_eq!(result.grouped_chunks.len(), 1);
        assert_eq!(result.total_file_tokens, 0);

        let group = &result.grouped_chunks[0];
        assert_eq!(group.chunks.len(), 1);
        assert_eq!(group.chunks[0].chunk_type, "full_file");
        assert_eq!(group.combined_text, result.context_header);
    }

    #[test]
    fn small_file_goes_full_file_and_ends_with_code() {
        let code = "export function add(a: number, b: number): number {\n    return a + b;\n}\n";
        let result = chunker().chunk_file(code, "src/add.ts").unwrap();

        assert_eq!(result.send_strategy, SendStrategy::FullFile);
        let group = &result.grouped_chunks[0];
        assert!(group.combined_text.ends_with(code));
        assert!(group.combined_text.starts_with("// File: src/add.ts"));
        assert_eq!(result.final_token_count, group.total_tokens);
    }

    #[test]
    fn header_respects_context_budget() {
        let mut imports = String::new();
        for i in 0..60 {
            imports.push_str(&format!("import {{ thing{i} }} from \"./module{i}\";\n"));
        }
        imports.push_str("export function f() { return 1; }\n");

        let result = chunker().chunk_file(&imports, "src/many.ts").unwrap();
        assert!(count(&result.context_header) <= 200);
        assert!(result.context_header.starts_with("// File: src/many.ts"));
    }

    #[test]
    fn large_flat_function_is_fallback_split_into_groups() {
        // One giant function: no sub-nodes, so the line splitter takes over.
        let mut body = String::new();
        for i in 0..400 {
            body.push_str(&format!("    const value{i} = compute({i}) + offset{i};\n"));
        }
        let code = format!("export function massive() {{\n{body}}}\n");

        let result = chunker().chunk_file(&code, "src/massive.ts").unwrap();

        assert_eq!(result.send_strategy, SendStrategy::MultipleGroups);
        assert!(result.oversized_chunks.is_empty());
        assert!(result.chunks.len() >= 2);
        assert!(result.chunks.iter().all(|c| c.chunk_type.starts_with("function_declaration_part_")));

        for group in &result.grouped_chunks {
            assert!(group.total_tokens <= 2500, "group {} over budget", group.id);
        }
    }

    #[test]
    fn class_too_big_for_chunk_gets_shell_context_subs() {
        let mut methods = String::new();
        for i in 0..120 {
            methods.push_str(&format!(
                "    method{i}(input: string): string {{\n        const processed = input.trim().toLowerCase();\n        return processed + \"-{i}\";\n    }}\n\n"
            ));
        }
        let code = format!("export class Grandiose {{\n{methods}}}\n");

        let result = chunker().chunk_file(&code, "src/grandiose.ts").unwrap();

        let with_shell: Vec<&Chunk> =
            result.chunks.iter().filter(|c| c.shell_context.is_some()).collect();
        assert!(!with_shell.is_empty());

        let shell = with_shell[0].shell_context.as_ref().unwrap();
        assert!(shell.text.contains("class Grandiose"));
        assert!(shell.text.contains("members elided"));

        // Groups that carry shelled chunks embed the shell text once.
        let group_with_shell = result
            .grouped_chunks
            .iter()
            .find(|g| g.chunks.iter().any(|c| c.shell_context.is_some()))
            .unwrap();
        assert!(group_with_shell.combined_text.contains("members elided"));
        assert!(group_with_shell.combined_text.contains("end of enclosing scope"));
    }

    #[test]
    fn breakdown_reconciles_exactly() {
        let mut body = String::new();
        for i in 0..300 {
            body.push_str(&format!("    const entry{i} = register({i});\n"));
        }
        let code = format!("export function setup() {{\n{body}}}\n");

        let result = chunker().chunk_file(&code, "src/setup.ts").unwrap();
        let b = &result.token_breakdown;

        assert_eq!(
            b.final_sent as i64,
            b.code_in_groups as i64
                + b.file_header_in_groups as i64
                + b.shell_context_in_groups as i64
                + b.separator_in_groups
        );
        assert_eq!(b.total_savings, b.original_file as i64 - b.final_sent as i64);
        assert_eq!(b.final_sent, result.final_token_count);
    }

    #[test]
    fn skipped_chunks_stay_out_of_groups() {
        // Large enough that full_file does not trigger, with a type alias
        // in the middle that the strategy skips.
        let mut body = String::new();
        for i in 0..260 {
            body.push_str(&format!("    const v{i} = use({i});\n"));
        }
        let code = format!(
            "type Payload = {{ kind: string }};\n\nexport function main() {{\n{body}}}\n"
        );

        let result = chunker().chunk_file(&code, "src/skip.ts").unwrap();

        let skipped: Vec<&Chunk> = result.chunks.iter().filter(|c| c.is_skipped()).collect();
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].chunk_type, "type_alias_declaration");
        assert_eq!(result.skipped_content.len(), 1);

        for group in &result.grouped_chunks {
            assert!(group.chunks.iter().all(|c| !c.is_skipped()));
        }
    }

    #[test]
    fn determinism_byte_identical_reruns() {
        let code = "export class A {\n    go() { return 1; }\n}\nexport function b() { return 2; }\n";
        let first = chunker().chunk_file(code, "src/a.ts").unwrap();
        let second = chunker().chunk_file(code, "src/a.ts").unwrap();
        assert_eq!(first, second);

        let first_json = serde_json::to_string(&first).unwrap();
        let second_json = serde_json::to_string(&second).unwrap();
        assert_eq!(first_json, second_json);
    }
}
