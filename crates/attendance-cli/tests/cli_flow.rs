use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::path::Path;
use tempfile::tempdir;

const TUTOR: &str = "ST1TUTOR";
const STUDENT: &str = "ST1STUDENT";

fn attendance(db: &Path, height: u64) -> Command {
    let mut cmd = Command::cargo_bin("attendance").unwrap();
    cmd.env_remove("ATTENDANCE_CALLER")
        .env_remove("ATTENDANCE_CONFIG")
        .env_remove("ATTENDANCE_DB")
        .env_remove("ATTENDANCE_HEIGHT")
        .env_remove("RUST_LOG")
        .arg("--db")
        .arg(db)
        .arg("--height")
        .arg(height.to_string())
        .arg("--quiet");
    cmd
}

fn stdout_json(output: &std::process::Output) -> Value {
    let text = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(text.trim()).expect("stdout must be one JSON document")
}

fn create_session(db: &Path, code: &str, seq: u64, expires_at: u64) -> std::process::Output {
    attendance(db, 10)
        .args(["create-session", "--institution", "1", "--code", code])
        .args(["--seq", &seq.to_string(), "--topic", "Intro"])
        .args(["--badge-uri", "ipfs://badge", "--tutor", TUTOR])
        .args(["--expires-at", &expires_at.to_string()])
        .output()
        .unwrap()
}

fn claim(db: &Path, code: &str, height: u64) -> std::process::Output {
    attendance(db, height)
        .args(["claim", "--institution", "1", "--code", code, "--student", STUDENT])
        .output()
        .unwrap()
}

#[test]
fn test_init_reports_ledger_constants() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("ledger.db");

    let output = attendance(&db, 0).arg("init").output().unwrap();
    assert!(output.status.success());
    let v = stdout_json(&output);
    assert_eq!(v["ok"]["streak-threshold"], json!(15));
    assert_eq!(v["ok"]["next-attendance-id"], json!(1));
    assert!(db.exists());
}

#[test]
fn test_create_then_claim_prints_receipt() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("ledger.db");

    let created = create_session(&db, "W1D1", 1, 100);
    assert_eq!(created.status.code(), Some(0));
    assert_eq!(stdout_json(&created), json!({ "ok": true }));

    let claimed = claim(&db, "W1D1", 50);
    assert_eq!(claimed.status.code(), Some(0));
    assert_eq!(
        stdout_json(&claimed),
        json!({ "ok": { "attendance-id": 1, "new-streak": 1, "streak-awarded": false } })
    );
}

#[test]
fn test_ledger_failures_exit_with_their_code() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("ledger.db");

    let missing = claim(&db, "NOPE", 5);
    assert_eq!(missing.status.code(), Some(100));
    assert_eq!(stdout_json(&missing), json!({ "err": 100 }));

    assert!(create_session(&db, "W1D1", 1, 100).status.success());
    assert!(claim(&db, "W1D1", 5).status.success());

    let dup = claim(&db, "W1D1", 6);
    assert_eq!(dup.status.code(), Some(101));
    assert_eq!(stdout_json(&dup), json!({ "err": 101 }));

    let expired = {
        assert!(create_session(&db, "W1D2", 2, 20).status.success());
        claim(&db, "W1D2", 21)
    };
    assert_eq!(expired.status.code(), Some(103));

    let seq_taken = create_session(&db, "W1D3", 2, 100);
    assert_eq!(seq_taken.status.code(), Some(104));
}

#[test]
fn test_query_reads_streak_state() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("ledger.db");
    assert!(create_session(&db, "W1D1", 1, 100).status.success());
    assert!(claim(&db, "W1D1", 5).status.success());

    let streak = attendance(&db, 5)
        .args(["query", "get-streak", STUDENT, "1"])
        .output()
        .unwrap();
    assert!(streak.status.success());
    assert_eq!(stdout_json(&streak), json!({ "ok": 1 }));

    let owner = attendance(&db, 5)
        .args(["query", "get-attendance-owner", "u1"])
        .output()
        .unwrap();
    assert_eq!(stdout_json(&owner), json!({ "ok": STUDENT }));

    let absent = attendance(&db, 5)
        .args(["query", "get-last-seq", "ST1NOBODY", "1"])
        .output()
        .unwrap();
    assert_eq!(stdout_json(&absent), json!({ "ok": null }));
}

#[test]
fn test_query_never_creates_a_missing_ledger() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("typo.db");

    attendance(&db, 5)
        .args(["query", "get-streak", STUDENT, "1"])
        .assert()
        .code(2)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("failed to open ledger read-only"));
    assert!(!db.exists());
}

#[test]
fn test_submit_positional_claim() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("ledger.db");

    attendance(&db, 10)
        .args(["submit", "create-session", "1", "W1D1", "1", "Intro", "0"])
        .args(["ipfs://badge", "100", "true", TUTOR, "--caller", TUTOR])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"{"ok":true}"#));

    attendance(&db, 20)
        .args(["submit", "claim-attendance", "1", "W1D1"])
        .env("ATTENDANCE_CALLER", STUDENT)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""attendance-id":1"#));
}

#[test]
fn test_bad_arguments_are_usage_errors() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("ledger.db");

    attendance(&db, 5)
        .args(["claim", "--institution", "1", "--code", "W1D1", "--student", "two words"])
        .assert()
        .code(64)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("invalid principal"));

    attendance(&db, 5)
        .args(["query", "get-streak", STUDENT])
        .assert()
        .code(64)
        .stderr(predicate::str::contains("get-streak takes 2 argument(s), got 1"));

    attendance(&db, 5)
        .args(["submit", "mint-everything", "--caller", TUTOR])
        .assert()
        .code(64)
        .stderr(predicate::str::contains("unknown operation"));
}

#[test]
fn test_explain_known_and_unknown_codes() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("ledger.db");

    attendance(&db, 0)
        .args(["explain", "103"])
        .assert()
        .success()
        .stdout(predicate::str::contains("103: Session expired (ERR-EXPIRED)"));

    attendance(&db, 0).args(["explain", "7"]).assert().code(64);
}

#[test]
fn test_presets_lists_every_duration() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("ledger.db");

    let output = attendance(&db, 0).arg("presets").output().unwrap();
    assert!(output.status.success());
    let rows = stdout_json(&output);
    let names: Vec<&str> = rows
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["preset"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["10m", "1h", "6h", "1d"]);
    assert_eq!(rows[3]["blocks"], json!(144));
}

#[test]
fn test_presets_follow_configured_block_time() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("ledger.db");
    let config = dir.path().join("ledger.yaml");
    std::fs::write(&config, "chain:\n  block_time_minutes: 5\n").unwrap();

    let output = attendance(&db, 0)
        .arg("--config")
        .arg(&config)
        .arg("presets")
        .output()
        .unwrap();
    assert!(output.status.success());
    let rows = stdout_json(&output);
    assert_eq!(rows[1]["preset"], json!("1h"));
    assert_eq!(rows[1]["blocks"], json!(12));
    assert_eq!(rows[1]["approx"], json!("~1 hour"));
}
