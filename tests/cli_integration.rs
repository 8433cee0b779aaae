// CLI integration tests for the DDL/DML command mapping.
use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;

fn cmd(dir: &Path) -> Command {
    let exe = env!("CARGO_BIN_EXE_dsbase");
    let mut command = Command::new(exe);
    command.arg("--dir").arg(dir).args(["--base", "school"]);
    command
}

fn run(dir: &Path, args: &[&str]) -> Output {
    cmd(dir).args(args).output().expect("spawn dsbase")
}

fn parse_json(output: &[u8]) -> Value {
    let text = std::str::from_utf8(output).expect("utf8");
    serde_json::from_str(text.trim()).expect("valid json")
}

fn ok_json(dir: &Path, args: &[&str]) -> Value {
    let output = run(dir, args);
    assert!(
        output.status.success(),
        "{args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    parse_json(&output.stdout)
}

#[test]
fn create_put_get_delete_flow() {
    let temp = tempfile::tempdir().expect("tempdir");
    let dir = temp.path().join("bases");

    let created = ok_json(&dir, &["create", "people", "info", "--versions", "2"]);
    assert_eq!(created["created"]["table"], "people");
    assert_eq!(created["created"]["max_versions"], 2);
    assert!(dir.join("school").join("people").join("info.json").is_file());

    for (value, expected) in [("Alice", 1), ("Alicia", 2), ("Ali", 3)] {
        let put = ok_json(&dir, &["put", "people", "r1", "info", "name", value]);
        assert_eq!(put["version"], expected);
    }

    let row = ok_json(&dir, &["get", "people", "r1"]);
    let series = &row["families"]["info"]["name"];
    assert_eq!(series["2"], "Alicia");
    assert_eq!(series["3"], "Ali");
    assert!(series.get("1").is_none());

    let deleted = ok_json(&dir, &["delete", "people", "r1", "info", "name", "2"]);
    assert_eq!(deleted["deleted"]["version"], 2);

    let cell = ok_json(&dir, &["get", "people", "r1", "info", "name"]);
    assert_eq!(cell["version"], 3);
    assert_eq!(cell["value"], "Ali");

    let count = ok_json(&dir, &["count", "people"]);
    assert_eq!(count["count"], 1);
}

#[test]
fn errors_map_to_exit_codes() {
    let temp = tempfile::tempdir().expect("tempdir");
    let dir = temp.path().join("bases");
    ok_json(&dir, &["create", "people", "info"]);

    let missing = run(&dir, &["count", "nope"]);
    assert_eq!(missing.status.code(), Some(3));
    let err = parse_json(&missing.stderr);
    assert_eq!(err["error"]["kind"], "NotFound");
    assert_eq!(err["error"]["table"], "nope");

    let dup = run(&dir, &["create", "people", "info"]);
    assert_eq!(dup.status.code(), Some(4));

    ok_json(&dir, &["disable", "people"]);
    let disabled = run(&dir, &["put", "people", "r1", "info", "name", "x"]);
    assert_eq!(disabled.status.code(), Some(5));
    assert_eq!(parse_json(&disabled.stderr)["error"]["kind"], "Disabled");
    ok_json(&dir, &["enable", "people"]);

    let bad_rename = run(&dir, &["alter", "people", "rename", "info"]);
    assert_eq!(bad_rename.status.code(), Some(6));
    let noop = run(&dir, &["alter", "people", "rename", "info:info"]);
    assert_eq!(noop.status.code(), Some(7));

    let usage = run(&dir, &["put", "people", "r1"]);
    assert_eq!(usage.status.code(), Some(2));
}

#[test]
fn alter_truncate_and_drop() {
    let temp = tempfile::tempdir().expect("tempdir");
    let dir = temp.path().join("bases");
    ok_json(&dir, &["create", "people", "info"]);
    ok_json(&dir, &["put", "people", "r1", "info", "name", "Alice"]);

    let altered = ok_json(&dir, &["alter", "people", "add", "contact"]);
    assert_eq!(
        altered["altered"]["column_families"],
        serde_json::json!(["info", "contact"])
    );
    let altered = ok_json(&dir, &["alter", "people", "rename", "info:profile"]);
    assert_eq!(
        altered["altered"]["column_families"],
        serde_json::json!(["profile", "contact"])
    );
    let row = ok_json(&dir, &["get", "people", "r1"]);
    assert_eq!(row["families"]["profile"]["name"]["1"], "Alice");

    ok_json(&dir, &["truncate", "people"]);
    let count = ok_json(&dir, &["count", "people"]);
    assert_eq!(count["count"], 0);

    ok_json(&dir, &["create", "courses", "meta"]);
    let listed = ok_json(&dir, &["list"]);
    assert_eq!(listed["tables"], serde_json::json!(["courses", "people"]));

    let dropped = ok_json(&dir, &["drop", "--all"]);
    assert_eq!(dropped["dropped_count"], 2);
    assert!(!dir.join("school").join("people").exists());
}

#[test]
fn scan_in_cell_format() {
    let temp = tempfile::tempdir().expect("tempdir");
    let dir = temp.path().join("bases");
    ok_json(&dir, &["create", "people", "info", "contact"]);
    ok_json(&dir, &["put", "people", "r1", "info", "name", "Alice"]);
    ok_json(&dir, &["put", "people", "r2", "contact", "email", "b@example.com"]);

    let output = run(&dir, &["scan", "people", "--format", "cells"]);
    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).expect("utf8");
    assert!(text.contains("column=info:name, version=1, value=Alice"));
    assert!(text.contains("column=contact:email, version=1, value=b@example.com"));
    assert!(text.ends_with("2 row(s)\n"));

    let scan = ok_json(&dir, &["scan", "people", "--family", "contact"]);
    assert_eq!(scan["row_count"], 1);
}

#[test]
fn info_commands_read_metadata() {
    let temp = tempfile::tempdir().expect("tempdir");
    let dir = temp.path().join("bases");

    let whoami = ok_json(&dir, &["whoami"]);
    assert_eq!(whoami["whoami"], "admin");
    let version = ok_json(&dir, &["version"]);
    assert_eq!(version["version"], 1);
    let status = ok_json(&dir, &["status"]);
    assert_eq!(status["status"]["servers"], serde_json::json!(["Server1"]));
    let bases = ok_json(&dir, &["bases"]);
    assert_eq!(bases["bases"], serde_json::json!(["school"]));
}
