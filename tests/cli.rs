//! Integration tests for top-level CLI behavior.

use std::process::Command;

use chrono::Utc;
use depcapture::cassette::format::Cassette;
use depcapture::record::{DependencyRecord, HttpRequestRecord, HttpResponseRecord, Meta};

fn run_depcapture(args: &[&str]) -> std::process::Output {
    let bin = env!("CARGO_BIN_EXE_depcapture");
    Command::new(bin)
        .args(args)
        .env_remove("DEPCAPTURE_MODE")
        .env_remove("DEPCAPTURE_MOCK_PATH")
        .output()
        .expect("failed to run depcapture binary")
}

fn record(url: &str, status: u16, body: &str, error: &str) -> DependencyRecord {
    DependencyRecord {
        version: "v1beta2".into(),
        name: "cli-test".into(),
        kind: "Http".into(),
        meta: Meta::new(),
        request: HttpRequestRecord {
            method: "GET".into(),
            proto_major: 1,
            proto_minor: 1,
            url: url.into(),
            headers: Default::default(),
            body: vec![],
        },
        response: HttpResponseRecord {
            status_code: status,
            headers: Default::default(),
            body: body.as_bytes().to_vec(),
        },
        error: error.into(),
    }
}

fn write_cassette(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("cli.cassette.yaml");
    let cassette = Cassette {
        name: "cli".into(),
        recorded_at: Utc::now(),
        mocks: vec![
            record("http://127.0.0.1:9/status", 200, "ok", ""),
            record("http://127.0.0.1:9/down", 0, "", "connection refused"),
        ],
    };
    std::fs::write(&path, serde_yaml::to_string(&cassette).unwrap()).unwrap();
    path
}

#[test]
fn fetch_in_test_mode_replays_cassette() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_cassette(dir.path());
    let output = run_depcapture(&[
        "fetch",
        "--mode",
        "test",
        "--cassette",
        path.to_str().unwrap(),
        "http://127.0.0.1:9/status",
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("200 OK"));
    assert!(stdout.contains("ok"));
}

#[test]
fn fetch_in_test_mode_replays_recorded_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_cassette(dir.path());
    let output = run_depcapture(&[
        "fetch",
        "--mode",
        "test",
        "--cassette",
        path.to_str().unwrap(),
        "http://127.0.0.1:9/down",
    ]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("connection refused"));
}

#[test]
fn fetch_in_test_mode_without_match_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_cassette(dir.path());
    let output = run_depcapture(&[
        "fetch",
        "--mode",
        "test",
        "--cassette",
        path.to_str().unwrap(),
        "http://127.0.0.1:9/unknown",
    ]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("no mock available"));
}

#[test]
fn fetch_with_invalid_mode_fails() {
    let output = run_depcapture(&["fetch", "--mode", "capture", "http://127.0.0.1:9/"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("not in a valid sdk mode"));
}

#[test]
fn inspect_prints_summary() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_cassette(dir.path());
    let output = run_depcapture(&["inspect", path.to_str().unwrap()]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("2 mocks"));
    assert!(stdout.contains("GET http://127.0.0.1:9/status"));
    assert!(stdout.contains("error=connection refused"));
}

#[test]
fn inspect_json_is_parseable() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_cassette(dir.path());
    let output = run_depcapture(&["inspect", "--json", path.to_str().unwrap()]);
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value.as_array().unwrap().len(), 2);
    assert_eq!(value[0]["status"], 200);
}

#[test]
fn unknown_subcommand_fails() {
    let output = run_depcapture(&["nope"]);
    assert!(!output.status.success());
}
