//! Solidity strategy: contracts, libraries and interfaces as top-level
//! units, contract-body members as sub-chunks.

use super::{comment_ratio, find_node, has_empty_body, LanguageStrategy, NodeInfo, ParsedTree};
use crate::error::{ChunkError, Result};
use crate::types::Chunk;
use scorecard_tokenizer::count;
use tree_sitter::{Node, Parser};

const MAX_HEADER_ITEM_TOKENS: usize = 50;

pub struct SolidityStrategy {
    boilerplate_threshold: f64,
}

impl SolidityStrategy {
    pub fn new(boilerplate_threshold: f64) -> Self {
        Self {
            boilerplate_threshold,
        }
    }
}

const CONTAINER_KINDS: &[&str] = &[
    "contract_declaration",
    "interface_declaration",
    "library_declaration",
];

impl LanguageStrategy for SolidityStrategy {
    fn name(&self) -> &'static str {
        "solidity"
    }

    fn parse(&self, code: &str) -> Result<ParsedTree> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_solidity::LANGUAGE.into())
            .map_err(|err| ChunkError::parse(format!("Grammar rejected: {err}")))?;
        let tree = parser
            .parse(code, None)
            .ok_or_else(|| ChunkError::parse("Tree build failed"))?;
        Ok(ParsedTree { tree: Some(tree) })
    }

    fn top_level_nodes(&self, tree: &ParsedTree, _code: &str) -> Vec<NodeInfo> {
        let Some(tree) = tree.tree.as_ref() else {
            return Vec::new();
        };

        let root = tree.root_node();
        let mut cursor = root.walk();
        let mut nodes = Vec::new();

        for child in root.named_children(&mut cursor) {
            if matches!(child.kind(), "pragma_directive" | "import_directive" | "comment") {
                continue;
            }
            nodes.push(NodeInfo::from_ts(child));
        }

        nodes
    }

    fn sub_nodes(&self, tree: &ParsedTree, node: &NodeInfo, _code: &str) -> Vec<NodeInfo> {
        let Some(tree) = tree.tree.as_ref() else {
            return Vec::new();
        };
        let Some(ts_node) = find_node(tree, node) else {
            return Vec::new();
        };
        if !CONTAINER_KINDS.contains(&ts_node.kind()) {
            return Vec::new();
        }

        let Some(body) = contract_body(ts_node) else {
            return Vec::new();
        };

        let mut cursor = body.walk();
        body.named_children(&mut cursor)
            .filter(|member| member.kind() != "comment")
            .map(NodeInfo::from_ts)
            .collect()
    }

    fn header_items(&self, tree: &ParsedTree, code: &str) -> Vec<String> {
        let Some(tree) = tree.tree.as_ref() else {
            return Vec::new();
        };

        let root = tree.root_node();
        let mut cursor = root.walk();
        let mut items = Vec::new();

        for child in root.named_children(&mut cursor) {
            match child.kind() {
                "pragma_directive" | "import_directive" => {
                    items.push(code[child.start_byte()..child.end_byte()].to_string());
                }
                "state_variable_declaration"
                | "constant_variable_declaration"
                | "user_defined_type_definition" => {
                    let text = code[child.start_byte()..child.end_byte()].to_string();
                    if count(&text) <= MAX_HEADER_ITEM_TOKENS {
                        items.push(text);
                    }
                }
                _ => {}
            }
        }

        items
    }

    fn should_skip(&self, chunk: &Chunk) -> Option<String> {
        if chunk.chunk_type == "event_definition" {
            return Some("trivial event declaration".to_string());
        }
        if chunk.chunk_type == "interface_declaration" && has_empty_body(&chunk.original_text) {
            return Some("empty interface".to_string());
        }
        if comment_ratio(&chunk.original_text) > self.boilerplate_threshold {
            return Some("mostly comments".to_string());
        }
        None
    }
}

fn contract_body(node: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = node.walk();
    let result = node
        .named_children(&mut cursor)
        .find(|child| child.kind() == "contract_body");
    result
}
