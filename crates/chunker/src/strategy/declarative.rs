//! Declarative strategy for single-atom files (JSON, YAML, TOML): no tree,
//! the whole file is one pseudo-node.

use super::{LanguageStrategy, NodeInfo, ParsedTree};
use crate::error::Result;
use crate::types::Chunk;

pub struct DeclarativeStrategy;

impl DeclarativeStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DeclarativeStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageStrategy for DeclarativeStrategy {
    fn name(&self) -> &'static str {
        "declarative"
    }

    fn parse(&self, _code: &str) -> Result<ParsedTree> {
        Ok(ParsedTree::empty())
    }

    fn top_level_nodes(&self, _tree: &ParsedTree, code: &str) -> Vec<NodeInfo> {
        if code.is_empty() {
            return Vec::new();
        }
        vec![NodeInfo {
            node_type: "document".to_string(),
            start_byte: 0,
            end_byte: code.len(),
            start_line: 1,
            end_line: code.lines().count().max(1),
        }]
    }

    fn sub_nodes(&self, _tree: &ParsedTree, _node: &NodeInfo, _code: &str) -> Vec<NodeInfo> {
        Vec::new()
    }

    fn header_items(&self, _tree: &ParsedTree, _code: &str) -> Vec<String> {
        Vec::new()
    }

    fn should_skip(&self, _chunk: &Chunk) -> Option<String> {
        None
    }
}
