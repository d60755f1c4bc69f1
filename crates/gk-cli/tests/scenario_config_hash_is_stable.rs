//! `gk-cli config-hash` must print the same hash regardless of on-disk key
//! order, and a different hash once a value actually changes.

use assert_cmd::Command;
use predicates::prelude::*;

fn write_config(dir: &std::path::Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("write temp config");
    path
}

#[test]
fn same_content_reordered_hashes_identically() {
    let dir = std::env::temp_dir().join(format!("gk-cli-config-hash-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("create temp dir");

    let base = write_config(&dir, "base.yaml", "risk:\n  max_position_size_usd: 50000\nvenue:\n  name: paper\n");
    let reordered = write_config(&dir, "reordered.yaml", "venue:\n  name: paper\nrisk:\n  max_position_size_usd: 50000\n");

    let first = Command::cargo_bin("gk-cli")
        .unwrap()
        .args(["config-hash", base.to_str().unwrap()])
        .output()
        .unwrap();
    let second = Command::cargo_bin("gk-cli")
        .unwrap()
        .args(["config-hash", reordered.to_str().unwrap()])
        .output()
        .unwrap();

    assert!(first.status.success());
    assert!(second.status.success());
    assert_eq!(String::from_utf8_lossy(&first.stdout), String::from_utf8_lossy(&second.stdout));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn config_hash_output_is_labeled() {
    let dir = std::env::temp_dir().join(format!("gk-cli-config-hash-label-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    let base = write_config(&dir, "base.yaml", "risk:\n  max_position_size_usd: 50000\n");

    Command::cargo_bin("gk-cli")
        .unwrap()
        .args(["config-hash", base.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("config_hash="));

    std::fs::remove_dir_all(&dir).ok();
}
