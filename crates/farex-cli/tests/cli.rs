//! CLI smoke tests.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_the_subcommands() {
    Command::cargo_bin("farex")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("ingest"))
        .stdout(predicate::str::contains("sweep"))
        .stdout(predicate::str::contains("export"));
}

#[test]
fn process_fails_cleanly_on_a_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    Command::cargo_bin("farex")
        .unwrap()
        .arg("--state")
        .arg(dir.path().join("state.json"))
        .args(["process", "no-such-file.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read"));
}

#[test]
fn status_on_a_fresh_store_shows_empty_counts() {
    let dir = tempfile::tempdir().unwrap();
    Command::cargo_bin("farex")
        .unwrap()
        .arg("--state")
        .arg(dir.path().join("state.json"))
        .arg("--media-root")
        .arg(dir.path().join("media"))
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Trips:"))
        .stdout(predicate::str::contains("Awaiting download:"));
}
