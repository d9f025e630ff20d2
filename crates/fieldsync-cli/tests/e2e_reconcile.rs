//! E2E tests for init, apply, diff, and list against a temp project.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn fs_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("fieldsync"));
    cmd.current_dir(dir);
    cmd.env("FIELDSYNC_LOG", "error");
    cmd.env_remove("FIELDSYNC_DB");
    cmd.env_remove("FORMAT");
    cmd
}

fn init_project(dir: &Path) {
    fs_cmd(dir).args(["init"]).assert().success();
}

fn write_config(dir: &Path, body: &str) {
    fs::write(dir.join(".fieldsync/config.toml"), body).expect("write config");
}

fn stdout_json(dir: &Path, args: &[&str]) -> Value {
    let output = fs_cmd(dir).args(args).output().expect("command runs");
    assert!(
        output.status.success(),
        "{args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid JSON on stdout")
}

#[test]
fn init_seeds_stock_values() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());

    assert!(dir.path().join(".fieldsync/fields.db").exists());
    assert!(dir.path().join(".fieldsync/config.toml").exists());

    let priorities = stdout_json(dir.path(), &["list", "priority", "--json"]);
    assert_eq!(
        priorities,
        json!(["blocker", "critical", "major", "minor", "trivial"])
    );

    let components = stdout_json(dir.path(), &["list", "component", "--json"]);
    assert_eq!(
        components,
        json!([
            {"name": "component1", "owner": "somebody"},
            {"name": "component2", "owner": "somebody"},
        ])
    );
}

#[test]
fn init_twice_keeps_existing_values() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());
    write_config(dir.path(), "[ticket-field-config]\npriority = \"P1\"\n");
    fs_cmd(dir.path()).args(["apply", "-q"]).assert().success();

    let out = stdout_json(dir.path(), &["init", "--json"]);
    assert_eq!(out["seeded"], false);
    assert_eq!(out["config_created"], false);
    assert_eq!(
        stdout_json(dir.path(), &["list", "priority", "--json"]),
        json!(["P1"])
    );
}

#[test]
fn apply_reports_changes_then_goes_quiet() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());
    write_config(
        dir.path(),
        "[ticket-field-config]\n\
         priority = \"P1,P2,P3\"\n\
         component = \"new/blog,new/site\"\n\
         component_owner = \"admin\"\n",
    );

    let report = stdout_json(dir.path(), &["apply", "--json"]);
    assert_eq!(report["changed"], true);
    assert_eq!(report["comment"]["priority"]["Added"], json!(["P1", "P2", "P3"]));
    assert_eq!(
        report["comment"]["priority"]["Removed"],
        json!(["blocker", "critical", "major", "minor", "trivial"])
    );
    assert_eq!(report["comment"]["component"]["Reordered"], json!([]));
    assert!(report["comment"].get("resolution").is_none());

    fs_cmd(dir.path())
        .args(["apply", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    fs_cmd(dir.path())
        .args(["apply"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no changes"));

    let components = stdout_json(dir.path(), &["list", "component", "--json"]);
    assert_eq!(
        components,
        json!([
            {"name": "new/blog", "owner": "admin"},
            {"name": "new/site", "owner": "admin"},
        ])
    );
}

#[test]
fn apply_reorders_resolutions() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());
    write_config(
        dir.path(),
        "[ticket-field-config]\n\
         resolution = [\"fixed\", \"wontfix\", \"invalid\", \"duplicate\", \"worksforme\"]\n",
    );

    let report = stdout_json(dir.path(), &["apply", "--json"]);
    assert_eq!(
        report["comment"]["resolution"]["Reordered"],
        json!([["invalid", "wontfix"], ["wontfix", "invalid"]])
    );

    fs_cmd(dir.path())
        .args(["list", "resolution"])
        .assert()
        .success()
        .stdout("1\tfixed\n2\twontfix\n3\tinvalid\n4\tduplicate\n5\tworksforme\n");
}

#[test]
fn diff_previews_without_writing() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());
    write_config(dir.path(), "[ticket-field-config]\nticket_type = \"defect,task\"\n");

    let preview = stdout_json(dir.path(), &["diff", "--json"]);
    assert_eq!(preview["changed"], true);
    assert_eq!(preview["comment"]["ticket_type"]["Removed"], json!(["enhancement"]));

    fs_cmd(dir.path())
        .args(["diff", "--exit-code", "-q"])
        .assert()
        .code(2);

    assert_eq!(
        stdout_json(dir.path(), &["list", "ticket_type", "--json"]),
        json!(["defect", "enhancement", "task"])
    );

    fs_cmd(dir.path()).args(["apply", "-q"]).assert().success();
    let clean = stdout_json(dir.path(), &["diff", "--json"]);
    assert_eq!(clean, json!({"changed": false, "comment": {}}));
}

#[test]
fn missing_section_fails_with_code() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());
    write_config(dir.path(), "[set-from-config-plugin]\npriority = \"P1\"\n");

    let output = fs_cmd(dir.path())
        .args(["apply", "--json"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());

    let err: Value = serde_json::from_slice(&output.stderr).expect("JSON error on stderr");
    assert_eq!(err["error"]["error_code"], "E1001");

    assert_eq!(
        stdout_json(dir.path(), &["list", "priority", "--json"]),
        json!(["blocker", "critical", "major", "minor", "trivial"])
    );
}

#[test]
fn section_override_reads_other_table() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());
    write_config(dir.path(), "[set-from-config-plugin]\nseverity = \"High,Low\"\n");

    fs_cmd(dir.path())
        .args(["apply", "--section", "set-from-config-plugin", "-q"])
        .assert()
        .success();
    assert_eq!(
        stdout_json(dir.path(), &["list", "severity", "--json"]),
        json!(["High", "Low"])
    );
}

#[test]
fn missing_owner_fails_in_text_mode() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());
    write_config(dir.path(), "[ticket-field-config]\ncomponent = \"a,b\"\n");

    fs_cmd(dir.path())
        .args(["apply"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[E1002]"))
        .stderr(predicate::str::contains("component_owner"));
}

#[test]
fn apply_without_init_points_at_init() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join(".fieldsync")).unwrap();
    write_config(dir.path(), "[ticket-field-config]\npriority = \"P1\"\n");

    fs_cmd(dir.path())
        .args(["apply"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("fieldsync init"));
}

#[test]
fn config_errors_come_before_missing_store() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join(".fieldsync")).unwrap();
    write_config(dir.path(), "[other]\npriority = \"P1\"\n");

    for command in ["apply", "diff"] {
        fs_cmd(dir.path())
            .args([command])
            .assert()
            .failure()
            .stderr(predicate::str::contains("error[E1001]"))
            .stderr(predicate::str::contains("fieldsync init").not());
    }
    assert!(!dir.path().join(".fieldsync/fields.db").exists());
}

#[test]
fn malformed_field_option_keeps_stored_values() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());
    write_config(
        dir.path(),
        "[ticket-field-config]\npriority = { first = \"P1\" }\n",
    );

    let output = fs_cmd(dir.path())
        .args(["apply", "--json"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let err: Value = serde_json::from_slice(&output.stderr).expect("JSON error on stderr");
    assert_eq!(err["error"]["error_code"], "E1004");

    assert_eq!(
        stdout_json(dir.path(), &["list", "priority", "--json"]),
        json!(["blocker", "critical", "major", "minor", "trivial"])
    );
}

#[test]
fn section_hint_follows_section_override() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());

    fs_cmd(dir.path())
        .args(["apply", "--section", "custom-fields"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Add a [custom-fields] table"));
}

#[test]
fn field_flag_limits_the_run() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());
    write_config(
        dir.path(),
        "[ticket-field-config]\npriority = \"P1\"\nseverity = \"S1\"\n",
    );

    let report = stdout_json(dir.path(), &["apply", "--field", "severity", "--json"]);
    assert!(report["comment"].get("priority").is_none());
    assert_eq!(report["comment"]["severity"]["Added"], json!(["S1"]));
}

#[test]
fn db_flag_and_env_select_the_store() {
    let dir = TempDir::new().unwrap();
    let alt = dir.path().join("alt.db");
    let alt_arg = alt.to_str().unwrap();

    fs_cmd(dir.path())
        .args(["init", "--empty", "--db", alt_arg])
        .assert()
        .success();
    assert!(alt.exists());
    assert!(!dir.path().join(".fieldsync/fields.db").exists());

    let output = fs_cmd(dir.path())
        .env("FIELDSYNC_DB", alt_arg)
        .args(["list", "priority", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let values: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(values, json!([]));
}
