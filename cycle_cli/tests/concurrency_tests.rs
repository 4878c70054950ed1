//! Concurrency tests for the cadence binary.
//!
//! These tests verify that multiple processes can safely:
//! - Log periods to the same store simultaneously (file locking)
//! - Edit and read the store while other writers run

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

fn cli(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("cadence").expect("Failed to find cadence binary");
    cmd.env("XDG_CONFIG_HOME", dir.join("config"))
        .arg("--data-dir")
        .arg(dir.join("data"));
    cmd
}

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

fn stored_entries(dir: &Path) -> Vec<serde_json::Value> {
    let contents = fs::read_to_string(dir.join("data/period_entries.json"))
        .expect("Failed to read store");
    serde_json::from_str(&contents).expect("Store is not valid JSON")
}

fn start_date(i: u32) -> String {
    format!("2024-{:02}-01", i + 1)
}

#[test]
fn test_concurrent_period_logging() {
    let temp_dir = setup_test_dir();
    let root: PathBuf = temp_dir.path().to_path_buf();

    // Thundering herd: every process starts at once
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let root = root.clone();
            thread::spawn(move || {
                cli(&root)
                    .args(["log", "--start", &start_date(i)])
                    .assert()
                    .success();
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    let entries = stored_entries(&root);
    assert_eq!(entries.len(), 8, "Expected 8 periods, got {}", entries.len());
}

#[test]
fn test_concurrent_edits_and_reads() {
    let temp_dir = setup_test_dir();
    let root: PathBuf = temp_dir.path().to_path_buf();

    for i in 0..4 {
        cli(&root)
            .args(["log", "--start", &start_date(i)])
            .assert()
            .success();
    }
    let ids: Vec<String> = stored_entries(&root)
        .iter()
        .map(|e| e["id"].as_str().expect("id missing").to_string())
        .collect();

    let mut handles = Vec::new();
    for id in ids {
        let root = root.clone();
        handles.push(thread::spawn(move || {
            cli(&root)
                .args(["edit", id.as_str(), "--flow", "heavy"])
                .assert()
                .success();
        }));
    }
    for i in 0..4u64 {
        let root = root.clone();
        handles.push(thread::spawn(move || {
            thread::sleep(Duration::from_millis(i * 5));
            cli(&root).arg("history").assert().success();
        }));
    }

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    let entries = stored_entries(&root);
    assert_eq!(entries.len(), 4);
    assert!(entries.iter().all(|e| e["flow"] == "heavy"));
}
