//! Cross-cutting chunker invariants exercised over realistic inputs.

use scorecard_chunker::{Chunker, ChunkerConfig, FileChunkGroup, SendStrategy};
use scorecard_tokenizer::count;

fn chunk(code: &str, path: &str) -> FileChunkGroup {
    Chunker::new(ChunkerConfig::default())
        .unwrap()
        .chunk_file(code, path)
        .unwrap()
}

/// A Solidity contract whose body is far beyond one chunk budget.
fn big_contract() -> String {
    let mut functions = String::new();
    for i in 0..60 {
        functions.push_str(&format!(
            "    function action{i}(uint256 amount) external returns (uint256) {{\n        uint256 fee = amount / {denom};\n        balances[msg.sender] += amount - fee;\n        collected += fee;\n        return amount - fee;\n    }}\n\n",
            denom = i + 2
        ));
    }
    format!(
        "pragma solidity ^0.8.19;\n\ncontract Treasury {{\n    mapping(address => uint256) public balances;\n    uint256 public collected;\n\n{functions}}}\n"
    )
}

/// A TypeScript module with a mix of frames, functions and a large class.
fn mixed_module() -> String {
    let mut methods = String::new();
    for i in 0..30 {
        methods.push_str(&format!(
            "    handle{i}(event: Event): void {{\n        this.queue.push(event);\n        if (this.queue.length > {i}) {{\n            this.flush();\n        }}\n    }}\n\n"
        ));
    }
    format!(
        "import {{ Event }} from \"./events\";\n\ntype Handler = (e: Event) => void;\n\nexport function dispatch(e: Event): void {{\n    listeners.forEach((l) => l(e));\n}}\n\nexport class Bus {{\n    private queue: Event[] = [];\n\n{methods}    flush(): void {{\n        this.queue = [];\n    }}\n}}\n"
    )
}

#[test]
fn active_code_tokens_bounded_by_file_total() {
    for (code, path) in [
        (mixed_module(), "src/bus.ts"),
        (big_contract(), "contracts/Treasury.sol"),
    ] {
        let result = chunk(&code, path);
        let active_sum: usize = result
            .chunks
            .iter()
            .filter(|c| c.is_active())
            .map(|c| c.code_tokens)
            .sum();

        // Chunk-boundary retokenization can cost a couple of tokens per chunk.
        let epsilon = result.chunks.len() * 2;
        assert!(
            active_sum <= result.total_file_tokens + epsilon,
            "{path}: active {active_sum} > total {} + {epsilon}",
            result.total_file_tokens
        );
    }
}

#[test]
fn breakdown_identity_holds_for_every_strategy() {
    let cases = [
        (mixed_module(), "src/bus.ts"),
        (big_contract(), "contracts/Treasury.sol"),
        ("{\n  \"name\": \"pkg\"\n}\n".to_string(), "package.json"),
        ("plain text\nwith lines\n".to_string(), "NOTES.txt"),
        (String::new(), "src/empty.ts"),
    ];

    for (code, path) in cases {
        let result = chunk(&code, path);
        let b = &result.token_breakdown;
        assert_eq!(
            b.final_sent as i64,
            b.code_in_groups as i64
                + b.file_header_in_groups as i64
                + b.shell_context_in_groups as i64
                + b.separator_in_groups,
            "{path}: breakdown does not reconcile"
        );
        assert_eq!(b.final_sent, result.final_token_count, "{path}");
        assert_eq!(b.total_savings, b.original_file as i64 - b.final_sent as i64, "{path}");
        if b.original_file == 0 {
            assert_eq!(b.savings_percentage, 0.0, "{path}");
        }
    }
}

#[test]
fn every_active_chunk_lands_in_exactly_one_group() {
    let result = chunk(&big_contract(), "contracts/Treasury.sol");
    assert_ne!(result.send_strategy, SendStrategy::FullFile);

    for active in result.chunks.iter().filter(|c| c.is_active()) {
        let appearances: usize = result
            .grouped_chunks
            .iter()
            .map(|g| g.chunks.iter().filter(|c| *c == active).count())
            .sum();
        assert_eq!(
            appearances, 1,
            "chunk at lines {}-{} appears {appearances} times",
            active.start_line, active.end_line
        );
    }

    for group in &result.grouped_chunks {
        assert!(!group.chunks.is_empty());
        assert!(
            group.total_tokens <= 2500,
            "group {} carries {} tokens",
            group.id,
            group.total_tokens
        );
    }
}

#[test]
fn groups_are_numbered_in_file_order() {
    let result = chunk(&big_contract(), "contracts/Treasury.sol");
    for (idx, group) in result.grouped_chunks.iter().enumerate() {
        assert_eq!(group.id, idx + 1);
        assert_eq!(group.start_line, group.chunks.iter().map(|c| c.start_line).min().unwrap());
        assert_eq!(group.end_line, group.chunks.iter().map(|c| c.end_line).max().unwrap());
    }
    for pair in result.grouped_chunks.windows(2) {
        assert!(pair[0].start_line <= pair[1].start_line);
    }
}

#[test]
fn full_file_combined_text_ends_with_code_verbatim() {
    let code = "export const f = () => 1;\n";
    let result = chunk(code, "src/tiny.ts");

    assert_eq!(result.send_strategy, SendStrategy::FullFile);
    assert_eq!(result.grouped_chunks.len(), 1);
    assert!(result.grouped_chunks[0].combined_text.ends_with(code));
}

#[test]
fn fallback_parts_reassemble_to_parent_text() {
    let mut body = String::new();
    for i in 0..350 {
        body.push_str(&format!("    acc = merge(acc, step{i}(input));\n"));
    }
    let code = format!("export function pipeline(input: Data) {{\n{body}}}\n");
    let result = chunk(&code, "src/pipeline.ts");

    let parts: Vec<_> = result
        .chunks
        .iter()
        .filter(|c| c.chunk_type.starts_with("function_declaration_part_"))
        .collect();
    assert!(parts.len() >= 2);
    assert!(parts.iter().all(|c| !c.oversized));

    let reassembled: String = parts.iter().map(|c| c.original_text.as_str()).collect();
    assert_eq!(reassembled, code);
}

#[test]
fn rerun_is_byte_identical() {
    let code = big_contract();
    let first = chunk(&code, "contracts/Treasury.sol");
    let second = chunk(&code, "contracts/Treasury.sol");

    let first_json = serde_json::to_string(&first).unwrap();
    let second_json = serde_json::to_string(&second).unwrap();
    assert_eq!(first_json, second_json);
}

#[test]
fn four_thousand_token_file_splits_into_bounded_groups() {
    // Keep appending statements until the body crosses 4000 tokens.
    let mut body = String::new();
    let mut i = 0;
    loop {
        body.push_str(&format!("    total = accumulate(total, series{i}, weights{i});\n"));
        i += 1;
        if i % 25 == 0 && count(&body) > 4000 {
            break;
        }
    }
    let code = format!("export function analyze() {{\n{body}}}\n");

    let result = chunk(&code, "src/analyze.ts");

    assert_eq!(result.send_strategy, SendStrategy::MultipleGroups);
    assert!(result.chunks.len() >= 5, "expected >= 5 sub-chunks, got {}", result.chunks.len());
    assert!(result.grouped_chunks.len() >= 2);
    for group in &result.grouped_chunks {
        assert!(group.total_tokens <= 2500);
    }
}
