//! Integration tests for the sitebind CLI
//!
//! These tests run the actual binary and verify output and exit status.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const FIXTURE: &str = "tests/fixtures/profile";

fn fixture(file: &str) -> String {
    format!("{}/{}", FIXTURE, file)
}

fn sitebind_cmd() -> Command {
    Command::cargo_bin("sitebind").unwrap()
}

#[test]
fn test_help_flag() {
    sitebind_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("build"))
        .stdout(predicate::str::contains("capture"));
}

#[test]
fn test_build_prints_bound_markup() {
    sitebind_cmd()
        .arg("build")
        .arg(fixture("index.html"))
        .arg(fixture("styles/styles.css"))
        .arg(fixture("js/script.js"))
        .arg(fixture("data.json"))
        .assert()
        .success()
        .stdout(predicate::str::starts_with("<!DOCTYPE html>"))
        .stdout(predicate::str::contains(r#"href="https://github.com/ada""#))
        .stdout(predicate::str::contains(r#"src="ada.png""#))
        .stdout(predicate::str::contains("<script type=\"module\">"));
}

#[test]
fn test_build_missing_source_fails_without_output() {
    sitebind_cmd()
        .arg("build")
        .arg(fixture("index.html"))
        .arg("does/not/exist.css")
        .arg(fixture("js/script.js"))
        .arg(fixture("data.json"))
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("does/not/exist.css"));
}

#[test]
fn test_build_malformed_records_fails() {
    let temp_dir = TempDir::new().unwrap();
    let data = temp_dir.path().join("data.json");
    fs::write(&data, r#"{"selector": "not-an-array"}"#).unwrap();

    sitebind_cmd()
        .arg("build")
        .arg(fixture("index.html"))
        .arg(fixture("styles/styles.css"))
        .arg(fixture("js/script.js"))
        .arg(&data)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid binding records"));
}

#[test]
fn test_build_site_writes_output_file() {
    let temp_dir = TempDir::new().unwrap();
    let out = temp_dir.path().join("site.html");

    sitebind_cmd()
        .args(["build-site", FIXTURE, "--data"])
        .arg(fixture("data.json"))
        .arg("--output")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let markup = fs::read_to_string(&out).unwrap();
    assert!(markup.contains(">Ada King</h1>"));
}

#[cfg(not(feature = "cdp"))]
#[test]
fn test_capture_without_backend_writes_error_log() {
    let temp_dir = TempDir::new().unwrap();
    let log = temp_dir.path().join("error.log");
    let mobile = temp_dir.path().join("m.png");
    let desktop = temp_dir.path().join("d.png");

    sitebind_cmd()
        .arg("capture")
        .arg(fixture("index.html"))
        .arg(&mobile)
        .arg(&desktop)
        .arg("--error-log")
        .arg(&log)
        .assert()
        .failure()
        .code(1);

    assert!(fs::read_to_string(&log).unwrap().contains("cdp"));
    assert!(!mobile.exists());
    assert!(!desktop.exists());
}
