//! End-to-end tests for the `ws` binary.
//!
//! Each test runs the built binary against scripts and timelines written to
//! a temporary directory, with `HOME` pointed there so no user config leaks in.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn ws_binary() -> String {
    env!("CARGO_BIN_EXE_ws").to_string()
}

fn ws(home: &Path, args: &[&str]) -> Output {
    Command::new(ws_binary())
        .env("HOME", home)
        .env_remove("XDG_CONFIG_HOME")
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("failed to run ws")
}

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "ws should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout.clone()).unwrap()
}

const SCRIPT: &str = r##"{
    "planned_duration_secs": 90,
    "steps": [
        {"op": "plan"},
        {"op": "add", "id": "w", "name": "Write", "colors": {
            "light": {"background": "#fff", "text": "#111", "border": "#ccc"},
            "dark": {"background": "#111", "text": "#fff", "border": "#333"}
        }},
        {"op": "add", "id": "w2", "name": "Review"},
        {"op": "begin", "at": 0},
        {"op": "start", "id": "w", "at": 0},
        {"op": "start", "id": "w2", "at": 60000},
        {"op": "complete", "id": "w2", "at": 125000},
        {"op": "finish"}
    ]
}"##;

#[test]
fn test_replay_prints_summary() {
    let temp = TempDir::new().unwrap();
    let script = write(temp.path(), "script.json", SCRIPT);

    let output = stdout(&ws(temp.path(), &["replay", script.to_str().unwrap()]));

    assert!(output.starts_with("You took 35s more than planned\n"));
    assert!(output.contains("Active time   2m 5s\n"));
    assert!(output.contains("Idle time     0s\n"));
    assert!(output.contains("Overtime      35s\n"));
    assert!(output.contains("  Write   1m 0s\n"));
    assert!(output.contains("  Review  1m 5s\n"));
}

#[test]
fn test_replay_json_uses_configured_theme() {
    let temp = TempDir::new().unwrap();
    let script = write(temp.path(), "script.json", SCRIPT);
    let config = write(temp.path(), "ws.toml", "theme = \"dark\"\n");

    let output = stdout(&ws(
        temp.path(),
        &[
            "--config",
            config.to_str().unwrap(),
            "replay",
            script.to_str().unwrap(),
            "--json",
        ],
    ));
    let json: serde_json::Value = serde_json::from_str(&output).unwrap();

    assert_eq!(json["plannedTime"], 90);
    assert_eq!(json["spentTime"], 125);
    assert_eq!(json["overtime"], 35);
    assert_eq!(json["status"]["category"], "took_longer");
    assert_eq!(json["status"]["tone"], "late");
    assert_eq!(json["activities"][0]["colors"]["background"], "#111");
}

#[test]
fn test_replay_failure_names_step() {
    let temp = TempDir::new().unwrap();
    let script = write(
        temp.path(),
        "script.json",
        r#"{"steps": [
            {"op": "plan"},
            {"op": "add", "id": "a", "name": "A"},
            {"op": "begin", "at": 0},
            {"op": "complete", "id": "a", "at": 1000}
        ]}"#,
    );

    let output = ws(temp.path(), &["replay", script.to_str().unwrap()]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("step 3 (complete) failed"), "{stderr}");
    assert!(
        stderr.contains("cannot complete activity a from PENDING state"),
        "{stderr}"
    );
}

#[test]
fn test_summary_of_recorded_entries() {
    let temp = TempDir::new().unwrap();
    let entries = write(
        temp.path(),
        "entries.json",
        r#"[
            {"id": "1", "activityId": "w", "activityName": "Write", "startTime": 0, "endTime": 60000},
            {"id": "2", "activityId": null, "activityName": null, "startTime": 60000, "endTime": 90000},
            {"id": "3", "activityId": "w2", "activityName": "Review", "startTime": 120000, "endTime": null}
        ]"#,
    );

    let output = stdout(&ws(
        temp.path(),
        &[
            "summary",
            entries.to_str().unwrap(),
            "--planned",
            "300",
            "--now",
            "180000",
            "--timer-active",
            "--json",
        ],
    ));
    let json: serde_json::Value = serde_json::from_str(&output).unwrap();

    assert_eq!(json["idleTime"], 60);
    assert_eq!(json["activeTime"], 120);
    assert_eq!(json["spentTime"], 180);
    assert_eq!(json["status"]["category"], "on_track");
    assert_eq!(json["status"]["remaining"], 120);
    assert_eq!(json["activities"].as_array().unwrap().len(), 2);
}

#[test]
fn test_summary_rejects_bad_time() {
    let temp = TempDir::new().unwrap();
    let entries = write(temp.path(), "entries.json", "[]");

    let output = ws(
        temp.path(),
        &["summary", entries.to_str().unwrap(), "--now", "soon"],
    );

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid time: soon"));
}

#[test]
fn test_no_subcommand_prints_help() {
    let temp = TempDir::new().unwrap();
    let output = stdout(&ws(temp.path(), &[]));
    assert!(output.contains("Usage: ws"));
}
