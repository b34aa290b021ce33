mod support;

use predicates::str::contains;
use serde_json::Value;

use support::{ids, TestDir};

#[test]
fn add_returns_task_and_state() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TestDir::new();

    let out = dir.json(&[
        "add",
        "--title",
        "Write report",
        "--responsible",
        "Ana",
        "--start",
        "2024-05-01",
        "--end",
        "2024-05-03",
        "--priority",
        "high",
    ]);
    assert_eq!(out["schema_version"], "tk.v1");
    assert_eq!(out["command"], "add");
    assert_eq!(out["status"], "success");
    assert_eq!(out["data"]["task"]["id"], 1);
    assert_eq!(out["data"]["task"]["priority"], "high");
    assert_eq!(out["data"]["task"]["completed"], false);
    assert_eq!(out["data"]["state"]["next_id"], 2);
    assert_eq!(out["data"]["state"]["pending"], 1);
    assert_eq!(out["data"]["state"]["can_undo"], true);
    assert_eq!(out["data"]["state"]["can_redo"], false);

    assert!(dir.file("tasks.json").exists());
    assert!(dir.file("session.json").exists());
    Ok(())
}

#[test]
fn add_rejects_invalid_fields_without_recording() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TestDir::new();

    dir.cmd()
        .args(["add", "--title", "No owner", "--start", "2024-05-01", "--end", "2024-05-02"])
        .assert()
        .code(2)
        .stderr(contains("responsible"));

    dir.cmd()
        .args([
            "add",
            "--title",
            "Backwards",
            "--responsible",
            "Ana",
            "--start",
            "2024-05-03",
            "--end",
            "2024-05-01",
        ])
        .assert()
        .code(2);

    let out = dir.json(&[
        "add",
        "--title",
        "Bad date",
        "--responsible",
        "Ana",
        "--start",
        "May 1st",
        "--end",
        "2024-05-01",
    ]);
    assert_eq!(out["status"], "error");
    assert_eq!(out["error"]["kind"], "user_error");
    assert_eq!(out["error"]["code"], 2);

    let history = dir.json(&["history"]);
    assert_eq!(history["data"]["entries"].as_array().map(Vec::len), Some(1));
    assert_eq!(history["data"]["can_undo"], false);
    Ok(())
}

#[test]
fn complete_is_idempotent() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TestDir::new();
    dir.add("A");

    let first = dir.json(&["complete", "1"]);
    assert_eq!(first["data"]["changed"], true);
    assert_eq!(first["data"]["task"]["completed"], true);
    assert_eq!(first["data"]["state"]["completed"], 1);

    let second = dir.json(&["complete", "1"]);
    assert_eq!(second["data"]["changed"], false);

    let history = dir.json(&["history"]);
    assert_eq!(history["data"]["entries"].as_array().map(Vec::len), Some(3));
    Ok(())
}

#[test]
fn unknown_task_is_user_error() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TestDir::new();

    for cmd in ["complete", "delete", "show"] {
        let out = dir.json(&[cmd, "42"]);
        assert_eq!(out["status"], "error");
        assert_eq!(out["error"]["details"]["id"], 42);
        assert_eq!(out["next_steps"][0], "tk list");
    }

    dir.cmd()
        .args(["edit", "42", "--title", "Nope"])
        .assert()
        .code(2)
        .stderr(contains("Task not found: 42"));
    Ok(())
}

#[test]
fn edit_merges_flags_over_current_values() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TestDir::new();
    dir.add("Draft");

    let out = dir.json(&["edit", "1", "--title", "Final", "--observations", "reviewed"]);
    let task = &out["data"]["task"];
    assert_eq!(out["data"]["changed"], true);
    assert_eq!(task["title"], "Final");
    assert_eq!(task["responsible"], "Ana");
    assert_eq!(task["start_date"], "2024-05-01");
    assert_eq!(task["observations"], "reviewed");

    let same = dir.json(&["edit", "1", "--title", "Final"]);
    assert_eq!(same["data"]["changed"], false);

    dir.cmd()
        .args(["edit", "1", "--end", "2024-04-01"])
        .assert()
        .code(2);
    let shown = dir.json(&["show", "1"]);
    assert_eq!(shown["data"]["end_date"], "2024-05-03");
    Ok(())
}

#[test]
fn delete_and_clear_completed_preserve_order() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TestDir::new();
    for title in ["A", "B", "C", "D"] {
        dir.add(title);
    }
    dir.cmd().args(["complete", "2"]).assert().success();
    dir.cmd().args(["complete", "4"]).assert().success();

    let out = dir.json(&["clear-completed"]);
    assert_eq!(out["data"]["removed"], 2);
    assert_eq!(ids(&out["data"]["state"]), vec![1, 3]);

    let none = dir.json(&["clear-completed"]);
    assert_eq!(none["data"]["removed"], 0);

    let deleted = dir.json(&["delete", "1"]);
    assert_eq!(deleted["data"]["task"]["title"], "A");
    assert_eq!(ids(&deleted["data"]["state"]), vec![3]);

    let added = dir.json(&[
        "add",
        "--title",
        "E",
        "--responsible",
        "Rui",
        "--start",
        "2024-06-01",
        "--end",
        "2024-06-01",
    ]);
    assert_eq!(added["data"]["task"]["id"], 5);
    Ok(())
}

#[test]
fn list_groups_pending_and_completed() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TestDir::new();
    dir.add("Open item");
    dir.add("Done item");
    dir.cmd().args(["complete", "2"]).assert().success();

    dir.cmd()
        .arg("list")
        .assert()
        .success()
        .stdout(contains("Pending (1):"))
        .stdout(contains("#1 Open item | Ana | 2024-05-01 to 2024-05-03 | Unset"))
        .stdout(contains("Completed (1):"))
        .stdout(contains("#2 Done item"));

    let pending = dir.json(&["list", "--pending"]);
    assert_eq!(pending["data"]["filter"], "pending");
    let titles: Vec<&str> = pending["data"]["tasks"]
        .as_array()
        .expect("tasks")
        .iter()
        .filter_map(|task| task["title"].as_str())
        .collect();
    assert_eq!(titles, vec!["Open item"]);

    dir.cmd()
        .args(["list", "--pending", "--completed"])
        .assert()
        .code(2);
    Ok(())
}

#[test]
fn quiet_suppresses_human_output() {
    let dir = TestDir::new();
    dir.add("A");
    dir.cmd().args(["-q", "list"]).assert().success().stdout("");
}

#[test]
fn show_renders_priority_label() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TestDir::new();
    dir.add("A");
    dir.cmd()
        .args(["edit", "1", "--priority", "medium", "--description", "details here"])
        .assert()
        .success();

    dir.cmd()
        .args(["show", "1"])
        .assert()
        .success()
        .stdout(contains("Task #1: A"))
        .stdout(contains("- priority: Medium"))
        .stdout(contains("- description: details here"));

    let out: Value = dir.json(&["show", "1"]);
    assert_eq!(out["data"]["priority"], "medium");
    Ok(())
}

#[test]
fn unusable_saved_ids_do_not_block_commands() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TestDir::new();
    std::fs::write(
        dir.file("tasks.json"),
        r#"{"tasks":[{"id":18446744073709551615,"title":"Big","responsible":"Rui","start_date":"2024-01-01","end_date":"2024-01-01"}]}"#,
    )?;

    let out = dir.json(&["list"]);
    assert_eq!(out["status"], "success");
    assert_eq!(out["data"]["tasks"].as_array().map(Vec::len), Some(0));
    let warning = out["warnings"][0].as_str().unwrap_or_default();
    assert!(warning.contains("out of range"));

    dir.add("Fresh");
    let shown = dir.json(&["show", "1"]);
    assert_eq!(shown["data"]["title"], "Fresh");
    Ok(())
}

#[test]
fn priority_is_optional_and_can_be_cleared() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TestDir::new();
    dir.add("No priority");

    let shown = dir.json(&["show", "1"]);
    assert_eq!(shown["data"]["priority"], "unset");

    let raised = dir.json(&["edit", "1", "--priority", "low"]);
    assert_eq!(raised["status"], "success");
    let cleared = dir.json(&["edit", "1", "--priority", ""]);
    assert_eq!(cleared["status"], "success");
    assert_eq!(dir.json(&["show", "1"])["data"]["priority"], "unset");
    Ok(())
}
