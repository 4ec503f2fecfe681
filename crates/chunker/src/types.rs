use serde::{Deserialize, Serialize};

/// The trimmed outer scaffolding of a parent node, attached to each of its
/// sub-chunks: opening text up to the first sub-node, a placeholder marker,
/// closing text after the last sub-node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShellContext {
    pub text: String,
    pub tokens: usize,
}

/// An AST-derived or fallback-split contiguous code fragment.
///
/// Lines are 1-based and inclusive. A chunk is oversized iff its code still
/// exceeds the per-chunk budget after all sub-chunking attempts; it is
/// skipped iff it carries a skip reason.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    pub original_text: String,
    pub code_tokens: usize,
    pub start_line: usize,
    pub end_line: usize,
    #[serde(rename = "type")]
    pub chunk_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shell_context: Option<ShellContext>,
    pub oversized: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
}

impl Chunk {
    pub fn is_skipped(&self) -> bool {
        self.skip_reason.is_some()
    }

    /// Active chunks are the ones grouping may send: neither skipped nor
    /// oversized.
    pub fn is_active(&self) -> bool {
        !self.is_skipped() && !self.oversized
    }
}

/// An ordered collection of chunks concatenated (with header, shell
/// contexts and separators) into a single AI input.
///
/// `total_tokens` is one tokenization of the final combined text, not a sum
/// of parts. Groups within a file are numbered from 1 in file order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkGroup {
    pub id: usize,
    pub chunks: Vec<Chunk>,
    pub combined_text: String,
    pub total_tokens: usize,
    pub start_line: usize,
    pub end_line: usize,
}

/// Routing decision per file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendStrategy {
    /// Whole file fits one group: a single synthetic chunk carries the
    /// original code verbatim behind the header.
    FullFile,
    SingleGroup,
    MultipleGroups,
    /// Nothing sendable (only oversized or skipped content).
    Unprocessed,
}

impl SendStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            SendStrategy::FullFile => "full_file",
            SendStrategy::SingleGroup => "single_group",
            SendStrategy::MultipleGroups => "multiple_groups",
            SendStrategy::Unprocessed => "unprocessed",
        }
    }
}

/// Record of a chunk removed by a skip heuristic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkippedContent {
    #[serde(rename = "type")]
    pub chunk_type: String,
    pub start_line: usize,
    pub end_line: usize,
    pub reason: String,
    pub tokens: usize,
}

/// Exact token accounting over one file.
///
/// The identity `final_sent == code_in_groups + file_header_in_groups +
/// shell_context_in_groups + separator_in_groups` always holds; separator
/// tokens are derived by subtraction so retokenization drift lands there
/// rather than breaking the identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TokenBreakdown {
    pub original_file: usize,
    pub code_in_groups: usize,
    pub file_header_in_groups: usize,
    pub shell_context_in_groups: usize,
    pub separator_in_groups: i64,
    pub final_sent: usize,
    pub total_savings: i64,
    pub savings_percentage: f64,
}

/// Everything the chunker knows about one file, immutable once emitted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileChunkGroup {
    pub file_path: String,
    pub total_file_tokens: usize,
    /// All parsed chunks, including skipped and oversized ones.
    pub chunks: Vec<Chunk>,
    /// The sendable groups. Empty iff `send_strategy` is `unprocessed`.
    pub grouped_chunks: Vec<ChunkGroup>,
    pub oversized_chunks: Vec<Chunk>,
    pub send_strategy: SendStrategy,
    /// Sum of the groups' `total_tokens`.
    pub final_token_count: usize,
    pub skipped_content: Vec<SkippedContent>,
    pub context_header: String,
    pub token_breakdown: TokenBreakdown,
}
