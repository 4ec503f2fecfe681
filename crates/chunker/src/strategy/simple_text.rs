//! Simple-text fallback strategy: whole file as one `text` node, line
//! splitting when it exceeds the chunk budget.

use super::{comment_ratio, LanguageStrategy, NodeInfo, ParsedTree};
use crate::error::Result;
use crate::types::Chunk;

pub struct SimpleTextStrategy {
    boilerplate_threshold: f64,
}

impl SimpleTextStrategy {
    pub fn new(boilerplate_threshold: f64) -> Self {
        Self {
            boilerplate_threshold,
        }
    }
}

impl LanguageStrategy for SimpleTextStrategy {
    fn name(&self) -> &'static str {
        "simple_text"
    }

    fn parse(&self, _code: &str) -> Result<ParsedTree> {
        Ok(ParsedTree::empty())
    }

    fn top_level_nodes(&self, _tree: &ParsedTree, code: &str) -> Vec<NodeInfo> {
        if code.is_empty() {
            return Vec::new();
        }
        vec![NodeInfo {
            node_type: "text".to_string(),
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

    fn should_skip(&self, chunk: &Chunk) -> Option<String> {
        if comment_ratio(&chunk.original_text) > self.boilerplate_threshold {
            return Some("mostly comments".to_string());
        }
        None
    }
}
