//! Integration tests for the CLI binary.
//!
//! Runs the `dvault` binary against temporary data directories.
//!
//! This test is registered as a [[test]] in the dropvault-cli crate
//! so that CARGO_BIN_EXE_dvault is available.

use std::path::Path;
use std::process::{Command, Output};

/// Get a Command pointing to the `dvault` binary.
fn dvault_binary() -> Command {
    Command::new(env!("CARGO_BIN_EXE_dvault"))
}

/// Run `dvault --data-dir DIR ARGS...`.
fn dvault(dir: &Path, args: &[&str]) -> Output {
    dvault_binary()
        .arg("--data-dir")
        .arg(dir)
        .args(args)
        .output()
        .expect("failed to execute dvault")
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "dvault should exit with success, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn cli_responds_to_help() {
    let output = dvault_binary()
        .arg("--help")
        .output()
        .expect("failed to execute dvault --help");

    assert_success(&output);
    let stdout = stdout_of(&output);
    assert!(
        stdout.contains("dvault") || stdout.contains("Usage"),
        "dvault --help output should contain usage information, got: {stdout}"
    );
}

#[test]
fn cli_responds_to_version() {
    let output = dvault_binary()
        .arg("--version")
        .output()
        .expect("failed to execute dvault --version");

    assert_success(&output);
    assert!(stdout_of(&output).contains("0.1"));
}

#[test]
fn cli_exits_with_error_on_unknown_flag() {
    let output = dvault_binary()
        .arg("--nonexistent-flag")
        .output()
        .expect("failed to execute dvault");

    assert!(
        !output.status.success(),
        "dvault with unknown flag should exit with error"
    );
}

#[test]
fn cli_database_table_record_cycle() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path();

    let out = dvault(dir, &["db", "list"]);
    assert_success(&out);
    assert!(stdout_of(&out).contains("No databases"));

    assert_success(&dvault(dir, &["db", "create", "shop"]));
    assert_success(&dvault(dir, &["table", "create", "shop", "orders"]));
    assert_success(&dvault(dir, &["record", "insert", "shop", "orders", r#"{"a":1}"#]));
    assert_success(&dvault(dir, &["record", "insert", "shop", "orders", r#"{"a":2}"#]));

    let out = dvault(dir, &["db", "list"]);
    assert_eq!(stdout_of(&out).trim(), "shop");

    let out = dvault(dir, &["table", "list", "shop"]);
    assert_eq!(stdout_of(&out).trim(), "orders");

    let out = dvault(dir, &["record", "view", "shop", "orders", "--json"]);
    assert_success(&out);
    let rows: serde_json::Value = serde_json::from_str(&stdout_of(&out)).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.contains(&serde_json::json!({"a": 1})));
    assert!(rows.contains(&serde_json::json!({"a": 2})));

    let out = dvault(dir, &["record", "view", "shop", "orders"]);
    assert_success(&out);
    assert!(stdout_of(&out).contains("2 record(s)"));
}

#[test]
fn cli_reports_store_errors() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path();

    assert_success(&dvault(dir, &["db", "create", "d"]));
    let out = dvault(dir, &["db", "create", "d"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("Already exists"));

    let out = dvault(dir, &["record", "insert", "d", "missing", "{}"]);
    assert!(!out.status.success());

    let out = dvault(dir, &["record", "insert", "d", "missing", "not json"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("not valid JSON"));
}

#[test]
fn cli_mailbox_and_users_on_fresh_dir() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path();

    let out = dvault(dir, &["mailbox", "pending", "abcdef0123456789"]);
    assert_success(&out);
    assert_eq!(stdout_of(&out).trim(), "0");

    let out = dvault(dir, &["user", "list"]);
    assert_success(&out);
    assert!(stdout_of(&out).contains("No users registered"));
}
