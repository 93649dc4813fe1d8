//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary data
//! directory, seeding the preference store through `prefs import`.

use std::path::Path;
use std::process::Command;

use serde_json::{json, Value};

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_routine-sync-cli"))
        .args(args)
        .env("ROUTINE_SYNC_DATA_DIR", data_dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_cli_success(data_dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(data_dir, args);
    assert_eq!(code, 0, "CLI command {args:?} failed: {stderr}");
    stdout
}

/// Seed a store with two routines scheduled every day.
fn seed(data_dir: &Path) {
    let every_day = [1, 2, 3, 4, 5, 6, 7];
    let snapshot = json!({
        "flutter.routines_count": 2,
        "flutter.routine_0": json!({
            "id": "morning",
            "title": "Morning",
            "activeDays": every_day,
            "items": [{"text": "Drink water"}, {"text": "Stretch"}],
        }).to_string(),
        "flutter.routine_1": json!({
            "id": "evening",
            "title": "Evening",
            "activeDays": every_day,
            "items": [{"text": "Read"}],
        }).to_string(),
    });
    let file = data_dir.join("snapshot.json");
    std::fs::write(&file, snapshot.to_string()).unwrap();
    let out = run_cli_success(data_dir, &["prefs", "import", file.to_str().unwrap()]);
    assert!(out.contains("Imported 3"));
}

#[test]
fn test_routine_show_without_data() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_cli_success(dir.path(), &["routine", "show"]);
    assert!(out.contains("No routine for today"));

    let out = run_cli_success(dir.path(), &["routine", "show", "--json"]);
    let view: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(view["status"], "no_routine");
}

#[test]
fn test_routine_steps_hand_over() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());

    let out = run_cli_success(dir.path(), &["routine", "show", "--json"]);
    let view: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(view["status"], "step");
    assert_eq!(view["routine"]["id"], "morning");
    assert_eq!(view["text"], "Drink water");

    let out = run_cli_success(dir.path(), &["routine", "skip"]);
    assert!(out.contains("Step 1 skipped"));

    let out = run_cli_success(dir.path(), &["routine", "complete", "--json"]);
    let outcome: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(outcome["handoff"]["finished"], "morning");
    assert_eq!(outcome["handoff"]["next_routine"], "evening");

    let out = run_cli_success(dir.path(), &["routine", "show"]);
    assert!(out.contains("Evening [evening]"));
    assert!(out.contains("Step 1/1: Read"));
}

#[test]
fn test_skip_routine_with_nothing_left() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());
    run_cli_success(dir.path(), &["routine", "skip-routine"]);
    let out = run_cli_success(dir.path(), &["routine", "skip-routine"]);
    assert!(out.contains("No more routines today"));

    let out = run_cli_success(dir.path(), &["routine", "complete"]);
    assert!(out.contains("No step to act on"));
}

#[test]
fn test_task_list_and_complete() {
    let dir = tempfile::tempdir().unwrap();
    let tasks = json!([
        json!({"id": "t1", "title": "Pay rent"}).to_string(),
        json!({"id": "t2", "title": "Call home"}).to_string(),
        json!({"id": "t3", "title": "Laundry"}).to_string(),
    ])
    .to_string();
    run_cli_success(
        dir.path(),
        &["prefs", "set", "flutter.tasks", &Value::String(tasks).to_string()],
    );

    let out = run_cli_success(dir.path(), &["task", "list"]);
    assert!(out.contains("Pay rent"));
    assert!(out.contains("+1 more"));

    run_cli_success(dir.path(), &["task", "complete", "t1"]);
    let out = run_cli_success(dir.path(), &["task", "list", "--json"]);
    let pending: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(pending["total_pending"], 2);

    let (_, stderr, code) = run_cli(dir.path(), &["task", "complete", "missing"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_water_add() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_cli_success(dir.path(), &["water", "add", "--json"]);
    let update: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(update["added_ml"], 125);
    assert_eq!(update["status"]["intake_ml"], 125);
    assert_eq!(update["status"]["goal_ml"], 1500);
}

#[test]
fn test_energy_requires_record() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["energy", "battery", "-10"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("no energy record"));

    let out = run_cli_success(dir.path(), &["energy", "show", "--json"]);
    let snapshot: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(snapshot["battery"], 100);
    assert_eq!(snapshot["recorded"], false);
}

#[test]
fn test_alert_check() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_cli_success(dir.path(), &["alert", "check", "Motion detected", "--hour", "23"]);
    assert_eq!(out.trim(), "ignore");

    run_cli_success(
        dir.path(),
        &[
            "prefs",
            "set",
            "flutter.notification_alarm_settings",
            &Value::String(json!({"enabled": true}).to_string()).to_string(),
        ],
    );
    let out = run_cli_success(dir.path(), &["alert", "check", "Motion detected", "--hour", "23"]);
    assert_eq!(out.trim(), "alarm");
}

#[test]
fn test_prefs_roundtrip_and_errors() {
    let dir = tempfile::tempdir().unwrap();
    run_cli_success(dir.path(), &["prefs", "set", "flutter.water_goal", "2000"]);
    let out = run_cli_success(dir.path(), &["prefs", "get", "flutter.water_goal"]);
    assert_eq!(out.trim(), "2000");

    let out = run_cli_success(dir.path(), &["prefs", "export"]);
    let snapshot: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(snapshot["flutter.water_goal"], 2000);

    run_cli_success(dir.path(), &["prefs", "remove", "flutter.water_goal"]);
    let (_, stderr, code) = run_cli(dir.path(), &["prefs", "get", "flutter.water_goal"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("no such key"));

    let (_, _, code) = run_cli(dir.path(), &["prefs", "set", "k", "{\"nested\": 1}"]);
    assert_eq!(code, 1);
}

#[test]
fn test_config_get_set() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_cli_success(dir.path(), &["config", "get", "day.rollover_hour"]);
    assert_eq!(out.trim(), "2");

    run_cli_success(dir.path(), &["config", "set", "tasks.max_display", "4"]);
    let out = run_cli_success(dir.path(), &["config", "get", "tasks.max_display"]);
    assert_eq!(out.trim(), "4");

    let (_, stderr, code) = run_cli(dir.path(), &["config", "set", "day.rollover_hour", "99"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));

    run_cli_success(dir.path(), &["config", "reset"]);
    let out = run_cli_success(dir.path(), &["config", "get", "tasks.max_display"]);
    assert_eq!(out.trim(), "2");
}
