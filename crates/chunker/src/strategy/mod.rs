//! Language strategies: the per-language capability set behind the chunker.
//!
//! A strategy answers six questions about a file: how to parse it, what its
//! independent top-level units are, what lives inside a unit's body, what
//! belongs in the file's context header, which chunks are low-signal
//! boilerplate, and how to split an indivisible unit that still exceeds the
//! chunk budget. The chunker itself is language-blind.

mod declarative;
mod simple_text;
mod solidity;
mod typescript;

pub use declarative::DeclarativeStrategy;
pub use simple_text::SimpleTextStrategy;
pub use solidity::SolidityStrategy;
pub use typescript::{TypeScriptDialect, TypeScriptStrategy};

use crate::config::ChunkerConfig;
use crate::error::Result;
use crate::types::Chunk;
use scorecard_tokenizer::count;
use std::path::Path;

/// An owned view of one syntax node: byte range into the source plus
/// 1-based inclusive line range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInfo {
    pub node_type: String,
    pub start_byte: usize,
    pub end_byte: usize,
    pub start_line: usize,
    pub end_line: usize,
}

impl NodeInfo {
    pub fn text<'a>(&self, code: &'a str) -> &'a str {
        &code[self.start_byte..self.end_byte]
    }

    pub(crate) fn from_ts(node: tree_sitter::Node<'_>) -> Self {
        Self {
            node_type: node.kind().to_string(),
            start_byte: node.start_byte(),
            end_byte: node.end_byte(),
            start_line: node.start_position().row + 1,
            end_line: node.end_position().row + 1,
        }
    }
}

/// Parse result handed back to the chunker. Declarative and simple-text
/// strategies carry no tree and treat the whole file as one pseudo-node.
pub struct ParsedTree {
    pub(crate) tree: Option<tree_sitter::Tree>,
}

impl ParsedTree {
    pub fn empty() -> Self {
        Self { tree: None }
    }
}

pub trait LanguageStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn parse(&self, code: &str) -> Result<ParsedTree>;

    /// Independent top-level units of the file, in source order.
    fn top_level_nodes(&self, tree: &ParsedTree, code: &str) -> Vec<NodeInfo>;

    /// Children inside a node's body suitable as independent sub-chunks.
    fn sub_nodes(&self, tree: &ParsedTree, node: &NodeInfo, code: &str) -> Vec<NodeInfo>;

    /// Header items: imports, pragmas, small type frames and small
    /// constants. Each item is one source excerpt.
    fn header_items(&self, tree: &ParsedTree, code: &str) -> Vec<String>;

    /// Language-specific boilerplate heuristics; a returned reason marks
    /// the chunk skipped.
    fn should_skip(&self, chunk: &Chunk) -> Option<String>;

    /// Line-accumulating splitter for nodes the AST cannot divide. Parts
    /// reassemble to the node text exactly and are never oversized.
    fn fallback_split(&self, node: &NodeInfo, code: &str, max_tokens: usize) -> Vec<NodeInfo> {
        line_split(node, code, max_tokens)
    }
}

/// Extension → strategy. `force_simple_strategy` collapses every lookup to
/// the simple-text strategy.
pub fn strategy_for(path: &str, config: &ChunkerConfig) -> Box<dyn LanguageStrategy> {
    if config.force_simple_strategy {
        return Box::new(SimpleTextStrategy::new(config.boilerplate_threshold));
    }

    let ext = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "ts" | "mts" | "cts" => Box::new(TypeScriptStrategy::new(
            TypeScriptDialect::TypeScript,
            config.boilerplate_threshold,
        )),
        "tsx" => Box::new(TypeScriptStrategy::new(
            TypeScriptDialect::Tsx,
            config.boilerplate_threshold,
        )),
        "js" | "jsx" | "mjs" | "cjs" => Box::new(TypeScriptStrategy::new(
            TypeScriptDialect::JavaScript,
            config.boilerplate_threshold,
        )),
        "sol" => Box::new(SolidityStrategy::new(config.boilerplate_threshold)),
        "json" | "yaml" | "yml" | "toml" => Box::new(DeclarativeStrategy::new()),
        _ => Box::new(SimpleTextStrategy::new(config.boilerplate_threshold)),
    }
}

/// Locate the tree node matching an owned [`NodeInfo`] byte range.
pub(crate) fn find_node<'t>(
    tree: &'t tree_sitter::Tree,
    info: &NodeInfo,
) -> Option<tree_sitter::Node<'t>> {
    let mut node = tree
        .root_node()
        .descendant_for_byte_range(info.start_byte, info.end_byte)?;
    while node.start_byte() != info.start_byte || node.end_byte() != info.end_byte {
        node = node.parent()?;
    }
    Some(node)
}

/// Shared fallback splitter: accumulate whole lines until the next line
/// would exceed `max_tokens`. Part `n` carries type `<type>_part_<n>`.
pub(crate) fn line_split(node: &NodeInfo, code: &str, max_tokens: usize) -> Vec<NodeInfo> {
    let text = node.text(code);
    if text.is_empty() {
        return Vec::new();
    }

    let mut parts = Vec::new();
    let mut part_start_byte = node.start_byte;
    let mut part_start_line = node.start_line;
    let mut part_lines = 0usize;
    let mut part_tokens = 0usize;
    let mut cursor = node.start_byte;

    let flush = |parts: &mut Vec<NodeInfo>,
                     start_byte: usize,
                     end_byte: usize,
                     start_line: usize,
                     lines: usize| {
        if end_byte > start_byte {
            let n = parts.len() + 1;
            parts.push(NodeInfo {
                node_type: format!("{}_part_{}", node.node_type, n),
                start_byte,
                end_byte,
                start_line,
                end_line: start_line + lines.saturating_sub(1),
            });
        }
    };

    for line in text.split_inclusive('\n') {
        let line_tokens = count(line);
        if part_lines > 0 && part_tokens + line_tokens > max_tokens {
            flush(&mut parts, part_start_byte, cursor, part_start_line, part_lines);
            part_start_byte = cursor;
            part_start_line += part_lines;
            part_lines = 0;
            part_tokens = 0;
        }
        cursor += line.len();
        part_lines += 1;
        part_tokens += line_tokens;
    }
    flush(&mut parts, part_start_byte, cursor, part_start_line, part_lines);

    parts
}

/// Ratio of comment-looking lines to non-blank lines.
pub(crate) fn comment_ratio(text: &str) -> f64 {
    let mut total = 0usize;
    let mut comments = 0usize;
    for line in text.lines() {
        let trimmed = line.trim_start();
        if trimmed.is_empty() {
            continue;
        }
        total += 1;
        if trimmed.starts_with("//")
            || trimmed.starts_with("/*")
            || trimmed.starts_with('*')
            || trimmed.starts_with("*/")
        {
            comments += 1;
        }
    }
    if total == 0 {
        0.0
    } else {
        comments as f64 / total as f64
    }
}

/// True when the body between the first `{` and the final `}` is blank.
pub(crate) fn has_empty_body(text: &str) -> bool {
    let Some(open) = text.find('{') else {
        return false;
    };
    let Some(close) = text.rfind('}') else {
        return false;
    };
    close > open && text[open + 1..close].trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn whole_file_node(code: &str) -> NodeInfo {
        NodeInfo {
            node_type: "text".to_string(),
            start_byte: 0,
            end_byte: code.len(),
            start_line: 1,
            end_line: code.lines().count().max(1),
        }
    }

    #[test]
    fn line_split_parts_reassemble_exactly() {
        let code = "line one is here\nline two is here\nline three is here\nline four\n";
        let node = whole_file_node(code);
        let parts = line_split(&node, code, 6);

        assert!(parts.len() >= 2);
        let reassembled: String = parts.iter().map(|p| p.text(code)).collect();
        assert_eq!(reassembled, code);

        for (idx, part) in parts.iter().enumerate() {
            assert_eq!(part.node_type, format!("text_part_{}", idx + 1));
        }
    }

    #[test]
    fn line_split_line_ranges_are_contiguous() {
        let code = "a\nb\nc\nd\ne\nf\n";
        let node = whole_file_node(code);
        let parts = line_split(&node, code, 2);

        assert_eq!(parts[0].start_line, 1);
        for pair in parts.windows(2) {
            assert_eq!(pair[1].start_line, pair[0].end_line + 1);
        }
    }

    #[test]
    fn strategy_lookup_by_extension() {
        let config = ChunkerConfig::default();
        assert_eq!(strategy_for("src/app.ts", &config).name(), "typescript");
        assert_eq!(strategy_for("src/App.tsx", &config).name(), "typescript");
        assert_eq!(strategy_for("lib/index.js", &config).name(), "typescript");
        assert_eq!(strategy_for("contracts/Token.sol", &config).name(), "solidity");
        assert_eq!(strategy_for("package.json", &config).name(), "declarative");
        assert_eq!(strategy_for("README.md", &config).name(), "simple_text");
    }

    #[test]
    fn force_simple_collapses_every_lookup() {
        let config = ChunkerConfig {
            force_simple_strategy: true,
            ..Default::default()
        };
        assert_eq!(strategy_for("src/app.ts", &config).name(), "simple_text");
        assert_eq!(strategy_for("contracts/Token.sol", &config).name(), "simple_text");
    }

    #[test]
    fn comment_ratio_counts_comment_lines() {
        let text = "// one\n// two\nlet x = 1;\n";
        let ratio = comment_ratio(text);
        assert!((ratio - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(comment_ratio(""), 0.0);
    }

    #[test]
    fn empty_body_detection() {
        assert!(has_empty_body("interface Empty {}"));
        assert!(has_empty_body("interface Empty {\n\n}"));
        assert!(!has_empty_body("interface Full { a: string }"));
        assert!(!has_empty_body("type A = string"));
    }
}
