//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run against an isolated data
//! directory and verify outputs.

use std::path::Path;
use std::process::Command;

/// Run a CLI command against `data_dir` and return (stdout, stderr, code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .args(["run", "-p", "nephroscreen-cli", "--"])
        .args(args)
        .env("NEPHROSCREEN_DATA_DIR", data_dir)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn write_config(data_dir: &Path) {
    std::fs::write(
        data_dir.join("config.toml"),
        r#"
[screening]
default_language = "english"
allow_relative_mode = true

[crm]
enabled = false
timeout_secs = 10

[qr_codes."KN-0042"]
location_code = "TN-CHN-01"
unit = "Mobile Camp A"
"#,
    )
    .expect("config written");
}

#[test]
fn status_without_session_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["screen", "status"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("no active session"));
}

#[test]
fn start_rejects_unknown_qr() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path());
    let (_, stderr, code) = run_cli(dir.path(), &["screen", "start", "--qr", "KN-9999"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("no screening location resolved"));
}

#[test]
fn start_intake_and_answer_flow() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path());

    let (stdout, _, code) = run_cli(dir.path(), &["screen", "start", "--qr", "KN-0042"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("\"phase\": \"intake\""));

    let (stdout, _, code) = run_cli(
        dir.path(),
        &[
            "screen", "intake", "--name", "Meena", "--age", "52", "--gender", "female",
        ],
    );
    assert_eq!(code, 0);
    assert!(stdout.contains("IntakeCompleted"));

    let (stdout, _, code) = run_cli(
        dir.path(),
        &[
            "screen",
            "answer",
            "--question",
            "comorbidity",
            "--value",
            "No",
        ],
    );
    assert_eq!(code, 0);
    assert!(stdout.contains("StepChanged"));
    // comorbidity = No hides the duration question.
    assert!(stdout.contains("family_history"));
}

#[test]
fn qr_resolve_and_list() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path());

    let (stdout, _, code) = run_cli(dir.path(), &["qr", "resolve", "KN-0042"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("TN-CHN-01"));

    let (_, stderr, code) = run_cli(dir.path(), &["qr", "resolve", "KN-9999"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown QR code"));
}

#[test]
fn corrupt_report_token_is_a_message_not_a_crash() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["report", "show", "KNR1.garbage.deadbeef"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("report unavailable or corrupt"));
}

#[test]
fn stats_zones_on_empty_database() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["stats", "zones"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("\"total\": 0"));
}
