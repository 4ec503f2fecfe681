//! TypeScript-family strategy (TypeScript, TSX, JavaScript dialects).

use super::{comment_ratio, find_node, has_empty_body, LanguageStrategy, NodeInfo, ParsedTree};
use crate::error::{ChunkError, Result};
use crate::types::Chunk;
use scorecard_tokenizer::count;
use tree_sitter::{Node, Parser};

/// Header items above this size stay out of the context frame.
const MAX_HEADER_ITEM_TOKENS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeScriptDialect {
    TypeScript,
    Tsx,
    JavaScript,
}

pub struct TypeScriptStrategy {
    dialect: TypeScriptDialect,
    boilerplate_threshold: f64,
}

impl TypeScriptStrategy {
    pub fn new(dialect: TypeScriptDialect, boilerplate_threshold: f64) -> Self {
        Self {
            dialect,
            boilerplate_threshold,
        }
    }

    fn grammar(&self) -> tree_sitter::Language {
        match self.dialect {
            TypeScriptDialect::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            TypeScriptDialect::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            TypeScriptDialect::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
        }
    }
}

/// True when a `const`/`let`/`var` declaration binds at least one function
/// or arrow function.
fn is_function_valued(decl: Node<'_>) -> bool {
    let mut cursor = decl.walk();
    for declarator in decl.named_children(&mut cursor) {
        if declarator.kind() != "variable_declarator" {
            continue;
        }
        if let Some(value) = declarator.child_by_field_name("value") {
            if matches!(value.kind(), "arrow_function" | "function_expression" | "function") {
                return true;
            }
        }
    }
    false
}

/// Unwrap `export ...` down to the exported declaration; bare re-exports
/// (`export { x }`) yield nothing.
fn unwrap_export(node: Node<'_>) -> Option<Node<'_>> {
    if node.kind() != "export_statement" {
        return Some(node);
    }
    if let Some(decl) = node.child_by_field_name("declaration") {
        return Some(decl);
    }
    let mut cursor = node.walk();
    let result = node
        .named_children(&mut cursor)
        .find(|child| child.kind().ends_with("_declaration") || child.kind().ends_with("_statement"));
    result
}

fn is_variable_declaration(kind: &str) -> bool {
    matches!(kind, "lexical_declaration" | "variable_declaration")
}

impl LanguageStrategy for TypeScriptStrategy {
    fn name(&self) -> &'static str {
        "typescript"
    }

    fn parse(&self, code: &str) -> Result<ParsedTree> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.grammar())
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
            if matches!(child.kind(), "import_statement" | "comment") {
                continue;
            }
            let Some(inner) = unwrap_export(child) else {
                continue;
            };
            if is_variable_declaration(inner.kind()) && !is_function_valued(inner) {
                continue;
            }
            nodes.push(NodeInfo::from_ts(inner));
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
        if !matches!(ts_node.kind(), "class_declaration" | "abstract_class_declaration") {
            return Vec::new();
        }

        let mut cursor = ts_node.walk();
        let Some(body) = ts_node
            .named_children(&mut cursor)
            .find(|child| child.kind() == "class_body")
        else {
            return Vec::new();
        };

        let mut body_cursor = body.walk();
        let mut subs = Vec::new();
        for member in body.named_children(&mut body_cursor) {
            match member.kind() {
                "method_definition" => subs.push(NodeInfo::from_ts(member)),
                "field_definition" | "public_field_definition" => {
                    let function_valued = member
                        .child_by_field_name("value")
                        .is_some_and(|value| {
                            matches!(value.kind(), "arrow_function" | "function_expression" | "function")
                        });
                    if function_valued {
                        subs.push(NodeInfo::from_ts(member));
                    }
                }
                _ => {}
            }
        }
        subs
    }

    fn header_items(&self, tree: &ParsedTree, code: &str) -> Vec<String> {
        let Some(tree) = tree.tree.as_ref() else {
            return Vec::new();
        };

        let root = tree.root_node();
        let mut cursor = root.walk();
        let mut items = Vec::new();

        for child in root.named_children(&mut cursor) {
            if child.kind() == "import_statement" {
                items.push(child_text(child, code));
                continue;
            }
            let Some(inner) = unwrap_export(child) else {
                continue;
            };
            let small_frame = matches!(
                inner.kind(),
                "type_alias_declaration" | "interface_declaration" | "enum_declaration"
            );
            let small_const = is_variable_declaration(inner.kind()) && !is_function_valued(inner);
            if small_frame || small_const {
                let text = child_text(inner, code);
                if count(&text) <= MAX_HEADER_ITEM_TOKENS {
                    items.push(text);
                }
            }
        }

        items
    }

    fn should_skip(&self, chunk: &Chunk) -> Option<String> {
        if chunk.chunk_type == "type_alias_declaration" {
            return Some("simple type definition".to_string());
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

fn child_text(node: Node<'_>, code: &str) -> String {
    code[node.start_byte()..node.end_byte()].to_string()
}
