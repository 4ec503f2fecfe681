//! Selection parsing and resolution against the repository tree.

use crate::types::FlaggedFile;

/// One line of the AI's selection output after comment splitting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionEntry {
    Path(String),
    Flagged(FlaggedFile),
}

/// Split raw selection strings into paths and flagged entries. A line of
/// the form `<path> # <reason>` is a flag (suspected vendored code), not a
/// selection.
pub fn parse_selection_entries(raw: &[String]) -> Vec<SelectionEntry> {
    raw.iter()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() {
                return None;
            }
            match line.split_once('#') {
                Some((path, reason)) => {
                    let path = path.trim();
                    let reason = reason.trim();
                    if path.is_empty() {
                        None
                    } else {
                        Some(SelectionEntry::Flagged(FlaggedFile {
                            path: path.to_string(),
                            reason: reason.to_string(),
                        }))
                    }
                }
                None => Some(SelectionEntry::Path(line.to_string())),
            }
        })
        .collect()
}

/// Resolve selected paths against the repository tree: exact match, or
/// prefix-with-separator directory expansion. Paths matching nothing
/// produce a warning and are dropped.
pub fn resolve_selection(
    entries: &[SelectionEntry],
    repo_files: &[String],
) -> (Vec<String>, Vec<FlaggedFile>, Vec<String>) {
    let mut resolved: Vec<String> = Vec::new();
    let mut flagged = Vec::new();
    let mut warnings = Vec::new();

    for entry in entries {
        match entry {
            SelectionEntry::Flagged(flag) => flagged.push(flag.clone()),
            SelectionEntry::Path(path) => {
                let normalized = path.trim_matches('/');
                let dir_prefix = format!("{normalized}/");
                let mut matched = false;
                for file in repo_files {
                    if file == normalized || file.starts_with(&dir_prefix) {
                        matched = true;
                        if !resolved.contains(file) {
                            resolved.push(file.clone());
                        }
                    }
                }
                if !matched {
                    warnings.push(format!("Selected path matched nothing: {path}"));
                }
            }
        }
    }

    (resolved, flagged, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn comment_lines_become_flags() {
        let entries = parse_selection_entries(&raw(&[
            "src/core.ts",
            "lib/vendor.min.js # looks vendored",
            "  ",
        ]));

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], SelectionEntry::Path("src/core.ts".to_string()));
        assert_eq!(
            entries[1],
            SelectionEntry::Flagged(FlaggedFile {
                path: "lib/vendor.min.js".to_string(),
                reason: "looks vendored".to_string(),
            })
        );
    }

    #[test]
    fn resolution_expands_directories_and_warns_on_misses() {
        let repo = raw(&[
            "src/core.ts",
            "src/util/strings.ts",
            "contracts/Token.sol",
            "README.md",
        ]);
        let entries = parse_selection_entries(&raw(&["src", "contracts/Token.sol", "ghost.ts"]));

        let (resolved, flagged, warnings) = resolve_selection(&entries, &repo);

        assert_eq!(
            resolved,
            raw(&["src/core.ts", "src/util/strings.ts", "contracts/Token.sol"])
        );
        assert!(flagged.is_empty());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("ghost.ts"));
    }

    #[test]
    fn prefix_match_requires_separator() {
        let repo = raw(&["src/core.ts", "srcx/evil.ts"]);
        let entries = parse_selection_entries(&raw(&["src"]));
        let (resolved, _, _) = resolve_selection(&entries, &repo);
        assert_eq!(resolved, raw(&["src/core.ts"]));
    }

    #[test]
    fn duplicates_resolve_once() {
        let repo = raw(&["src/core.ts"]);
        let entries = parse_selection_entries(&raw(&["src", "src/core.ts"]));
        let (resolved, _, _) = resolve_selection(&entries, &repo);
        assert_eq!(resolved, raw(&["src/core.ts"]));
    }
}
