//! Report artifact layout and atomic persistence.
//!
//! ```text
//! <reports_root>/<repo>/run-<runId>/chunking-analysis.json
//! <reports_root>/<repo>/run-<runId>/file-selection.json
//! <reports_root>/<repo>/run-<runId>/project-scorecard.json
//! <reports_root>/<repo>/run-<runId>/final-reviews2/calibrated-scorecard-<ts>.json
//! ```

use chrono::Utc;
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};

pub fn run_dir(reports_root: &Path, repo_name: &str, run_id: &str) -> PathBuf {
    reports_root.join(repo_name).join(format!("run-{run_id}"))
}

pub fn final_reviews_dir(run_dir: &Path) -> PathBuf {
    run_dir.join("final-reviews2")
}

pub fn calibrated_scorecard_path(run_dir: &Path) -> PathBuf {
    final_reviews_dir(run_dir).join(format!(
        "calibrated-scorecard-{}.json",
        Utc::now().timestamp_millis()
    ))
}

/// Write JSON via a sibling temp file plus rename, so readers never see a
/// half-written artifact.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no parent"))?;
    std::fs::create_dir_all(parent)?;

    let json = serde_json::to_string_pretty(value)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;

    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// The most recently modified calibrated scorecard under
/// `final-reviews2/`, compared by full mtime.
pub fn latest_calibrated(run_dir: &Path) -> Option<PathBuf> {
    let dir = final_reviews_dir(run_dir);
    let entries = std::fs::read_dir(&dir).ok()?;

    let mut best: Option<(std::time::SystemTime, PathBuf)> = None;
    for entry in entries.flatten() {
        let path = entry.path();
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if !name.starts_with("calibrated-scorecard-") || !name.ends_with(".json") {
            continue;
        }
        let Ok(modified) = entry.metadata().and_then(|m| m.modified()) else {
            continue;
        };
        match &best {
            Some((current, _)) if *current >= modified => {}
            _ => best = Some((modified, path)),
        }
    }

    best.map(|(_, path)| path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn layout_paths_compose() {
        let dir = run_dir(Path::new("/tmp/reports"), "widget", "run42");
        assert_eq!(dir, PathBuf::from("/tmp/reports/widget/run-run42"));
        assert!(final_reviews_dir(&dir).ends_with("final-reviews2"));
    }

    #[test]
    fn atomic_write_creates_parents_and_leaves_no_temp() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("deep/nested/report.json");

        write_json_atomic(&path, &serde_json::json!({"ok": true})).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"ok\""));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn latest_calibrated_picks_newest_mtime() {
        let tmp = TempDir::new().unwrap();
        let run = tmp.path().join("run-1");
        let reviews = final_reviews_dir(&run);
        fs::create_dir_all(&reviews).unwrap();

        let old = reviews.join("calibrated-scorecard-100.json");
        let new = reviews.join("calibrated-scorecard-200.json");
        fs::write(&old, "{}").unwrap();
        fs::write(&new, "{}").unwrap();

        let past = std::time::SystemTime::now() - std::time::Duration::from_secs(3600);
        let file = fs::File::options().write(true).open(&old).unwrap();
        file.set_modified(past).unwrap();

        // An unrelated file never wins.
        fs::write(reviews.join("notes.txt"), "x").unwrap();

        assert_eq!(latest_calibrated(&run), Some(new));
    }

    #[test]
    fn latest_calibrated_is_none_without_artifacts() {
        let tmp = TempDir::new().unwrap();
        assert!(latest_calibrated(tmp.path()).is_none());
    }
}
