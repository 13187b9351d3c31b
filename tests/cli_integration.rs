#[allow(deprecated)]
use assert_cmd::Command;
use chrono::{Duration as Days, Utc};
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, Stdio};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

// ─── helpers ───────────────────────────────────────────────────────

struct TestEnv {
    dir: TempDir,
}

impl TestEnv {
    fn new() -> Self {
        let dir = TempDir::new().expect("create tempdir");
        Self { dir }
    }

    fn data_dir(&self) -> PathBuf {
        self.dir.path().join(".taskboard")
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("taskboard").expect("binary");
        cmd.current_dir(self.dir.path());
        cmd.env_remove("TASKBOARD_DIR");
        cmd.env_remove("TASKBOARD_LOG");
        cmd
    }

    fn run_json(&self, args: &[&str]) -> Value {
        let mut a: Vec<&str> = args.to_vec();
        a.push("--json");
        let output = self.cmd().args(&a).output().expect("run");
        let stdout = String::from_utf8_lossy(&output.stdout);
        serde_json::from_str(&stdout)
            .unwrap_or_else(|e| panic!("parse JSON failed: {e}\nstdout: {stdout}"))
    }

    fn run_ok(&self, args: &[&str]) -> Value {
        let v = self.run_json(args);
        assert_eq!(v["success"], true, "expected success=true: {v}");
        v
    }

    fn run_err(&self, args: &[&str]) -> Value {
        let v = self.run_json(args);
        assert_eq!(v["success"], false, "expected success=false: {v}");
        v
    }

    fn add(&self, title: &str) -> String {
        let v = self.run_ok(&["add", title]);
        v["data"]["task"]["id"].as_str().unwrap().to_string()
    }

    fn list(&self, extra: &[&str]) -> Vec<Value> {
        let mut args = vec!["list"];
        args.extend_from_slice(extra);
        let v = self.run_ok(&args);
        v["data"]["tasks"].as_array().unwrap().clone()
    }

    fn write_file(&self, name: &str, content: &str) -> PathBuf {
        let p = self.dir.path().join(name);
        fs::write(&p, content).expect("write file");
        p
    }

    fn write_config(&self, content: &str) {
        fs::create_dir_all(self.data_dir()).unwrap();
        fs::write(self.data_dir().join("config.json"), content).unwrap();
    }

    fn spawn_shell(&self) -> Child {
        #[allow(deprecated)]
        let bin = assert_cmd::cargo::cargo_bin("taskboard");
        std::process::Command::new(bin)
            .arg("shell")
            .current_dir(self.dir.path())
            .env_remove("TASKBOARD_DIR")
            .env_remove("TASKBOARD_LOG")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .expect("spawn shell")
    }

    fn start_empty(&self) {
        let file = self.write_file("start-empty.json", "[]");
        self.run_ok(&["data", "import", file.to_str().unwrap()]);
    }

    fn titles(&self, extra: &[&str]) -> Vec<String> {
        self.list(extra)
            .iter()
            .map(|t| t["title"].as_str().unwrap().to_string())
            .collect()
    }

    fn backup_count(&self) -> u64 {
        let v = self.run_ok(&["data", "info"]);
        v["data"]["backup_count"].as_u64().unwrap()
    }
}

fn day(offset: i64) -> String {
    (Utc::now() + Days::days(offset)).format("%Y-%m-%d").to_string()
}

fn sorted(mut v: Vec<String>) -> Vec<String> {
    v.sort();
    v
}

/// Send `line` to a running shell and wait for its first line of output.
fn send_line(child: &mut Child, stdin: &mut std::process::ChildStdin, line: &str) -> String {
    writeln!(stdin, "{line}").unwrap();
    let stdout = child.stdout.as_mut().unwrap();
    let mut out = String::new();
    BufReader::new(stdout).read_line(&mut out).unwrap();
    out
}

fn find<'a>(tasks: &'a [Value], id: &str) -> &'a Value {
    tasks
        .iter()
        .find(|t| t["id"] == id)
        .unwrap_or_else(|| panic!("task {id} not in {tasks:?}"))
}

// ─── 1. first run ──────────────────────────────────────────────────

#[test]
fn test_first_run_shows_default_tasks() {
    let env = TestEnv::new();
    let tasks = env.list(&[]);
    assert_eq!(tasks.len(), 8);
    assert_eq!(tasks[0]["title"], "Complete project documentation");
}

#[test]
fn test_first_run_does_not_write_data() {
    let env = TestEnv::new();
    env.list(&[]);
    let v = env.run_ok(&["data", "info"]);
    assert_eq!(v["data"]["has_data"], false);
    assert_eq!(v["data"]["data_size"], "0 KB");
    assert_eq!(v["data"]["backup_count"], 0);
}

#[test]
fn test_text_output() {
    let env = TestEnv::new();
    env.cmd()
        .args(["add", "Buy milk", "--priority", "low"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added task: Buy milk"));
    env.cmd()
        .args(["list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[To Do] Buy milk"));
}

// ─── 2. mutations ──────────────────────────────────────────────────

#[test]
fn test_add_puts_task_first_with_defaults() {
    let env = TestEnv::new();
    let v = env.run_ok(&["add", "Buy milk", "--priority", "Low"]);
    assert_eq!(v["data"]["durable"], true);
    let id = v["data"]["task"]["id"].as_str().unwrap().to_string();
    assert!(!id.is_empty());

    let tasks = env.list(&[]);
    assert_eq!(tasks.len(), 9);
    assert_eq!(tasks[0]["id"], id.as_str());
    assert_eq!(tasks[0]["status"], "To Do");
    assert_eq!(tasks[0]["priority"], "Low");
    assert!(tasks[0]["created_at"].as_str().unwrap().ends_with('Z'));
}

#[test]
fn test_add_rejects_bad_input() {
    let env = TestEnv::new();
    let v = env.run_err(&["add", "  "]);
    assert_eq!(v["error"]["code"], "VALIDATION_ERROR");
    let v = env.run_err(&["add", "x", "--priority", "urgent"]);
    assert_eq!(v["error"]["code"], "VALIDATION_ERROR");
    let v = env.run_err(&["add", "x", "--due", "someday"]);
    assert_eq!(v["error"]["code"], "VALIDATION_ERROR");
    let v = env.run_err(&["add", "x", "--status", "Bogus"]);
    assert_eq!(v["error"]["code"], "INVALID_STATUS");
}

#[test]
fn test_move_validates_status() {
    let env = TestEnv::new();
    let id = env.add("Buy milk");
    let v = env.run_ok(&["move", &id, "Done"]);
    assert_eq!(v["data"]["task"]["status"], "Done");

    let v = env.run_err(&["move", &id, "Bogus"]);
    assert_eq!(v["error"]["code"], "INVALID_STATUS");
    let v = env.run_ok(&["show", &id]);
    assert_eq!(v["data"]["task"]["status"], "Done");
}

#[test]
fn test_move_accepts_loose_status_names() {
    let env = TestEnv::new();
    let id = env.add("Loose");
    let v = env.run_ok(&["move", &id, "in-progress"]);
    assert_eq!(v["data"]["task"]["status"], "In Progress");
}

#[test]
fn test_update_fields() {
    let env = TestEnv::new();
    let id = env.add("Draft");
    let created = env.run_ok(&["show", &id])["data"]["task"]["created_at"].clone();
    env.run_ok(&[
        "update", &id, "--title", "Final", "--description", "notes", "--priority", "high",
        "--due", "2030-01-15",
    ]);
    let task = env.run_ok(&["show", &id])["data"]["task"].clone();
    assert_eq!(task["title"], "Final");
    assert_eq!(task["description"], "notes");
    assert_eq!(task["priority"], "High");
    assert_eq!(task["due_date"], "2030-01-15T00:00:00.000Z");
    assert_eq!(task["created_at"], created);

    env.run_ok(&["update", &id, "--clear-due", "--clear-description"]);
    let task = env.run_ok(&["show", &id])["data"]["task"].clone();
    assert!(task["due_date"].is_null());
    assert!(task["description"].is_null());
}

#[test]
fn test_update_requires_a_field() {
    let env = TestEnv::new();
    let id = env.add("Nothing");
    let v = env.run_err(&["update", &id]);
    assert_eq!(v["error"]["code"], "VALIDATION_ERROR");
}

#[test]
fn test_missing_ids_are_noops() {
    let env = TestEnv::new();
    env.add("Keep me");
    let v = env.run_ok(&["update", "missing", "--title", "x"]);
    assert_eq!(v["data"]["changed"], false);
    let v = env.run_ok(&["move", "missing", "Done"]);
    assert_eq!(v["data"]["changed"], false);
    let v = env.run_ok(&["delete", "missing"]);
    assert_eq!(v["data"]["deleted"], false);
    assert_eq!(env.list(&[]).len(), 9);
}

#[test]
fn test_delete_removes_task() {
    let env = TestEnv::new();
    let id = env.add("Temporary");
    let v = env.run_ok(&["delete", &id]);
    assert_eq!(v["data"]["deleted"], true);
    let v = env.run_err(&["show", &id]);
    assert_eq!(v["error"]["code"], "TASK_NOT_FOUND");
}

#[test]
fn test_archive_ignores_unknown_ids() {
    let env = TestEnv::new();
    let id = env.add("Old news");
    let v = env.run_ok(&["archive", &id, "no-such-id"]);
    assert_eq!(v["data"]["requested"], 2);
    assert_eq!(v["data"]["archived"], 1);

    assert!(env.list(&[]).iter().all(|t| t["id"] != id.as_str()));
    let archived = env.list(&["--archived"]);
    assert_eq!(archived.len(), 1);
    assert_eq!(find(&archived, &id)["status"], "Archived");
    assert_eq!(env.list(&["--all"]).len(), 9);
}

#[test]
fn test_status_counts() {
    let env = TestEnv::new();
    let v = env.run_ok(&["status"]);
    let counts = &v["data"]["counts"];
    assert_eq!(counts["total"], 8);
    assert_eq!(counts["by_status"]["To Do"], 3);
    assert_eq!(counts["by_status"]["In Progress"], 2);
    assert_eq!(counts["by_status"]["Done"], 3);
    assert_eq!(counts["by_status"]["Archived"], 0);
    assert_eq!(counts["by_priority"]["High"], 3);
}

// ─── 2b. queries ───────────────────────────────────────────────────

fn seed_dated_tasks(env: &TestEnv) {
    env.start_empty();
    let noon = format!("{}T12:00:00Z", day(0));
    env.run_ok(&["add", "Late report", "--priority", "high", "--due", &day(-2)]);
    env.run_ok(&["add", "Noon call", "--due", &noon]);
    env.run_ok(&["add", "Soon review", "--priority", "low", "--due", &day(3)]);
    env.run_ok(&["add", "Later plan", "--due", &day(20)]);
    env.run_ok(&[
        "add", "Someday", "--priority", "high", "--description", "Grocery list",
    ]);
}

#[test]
fn test_list_search() {
    let env = TestEnv::new();
    seed_dated_tasks(&env);
    assert_eq!(env.titles(&["--search", "GROCERY"]), vec!["Someday"]);
    assert_eq!(
        sorted(env.titles(&["--search", "late"])),
        vec!["Late report", "Later plan"]
    );
    assert!(env.titles(&["--search", "nothing like this"]).is_empty());
}

#[test]
fn test_list_priority_filter() {
    let env = TestEnv::new();
    seed_dated_tasks(&env);
    assert_eq!(
        sorted(env.titles(&["--priority", "high"])),
        vec!["Late report", "Someday"]
    );
    assert_eq!(
        sorted(env.titles(&["--priority", "High", "--priority", "low"])),
        vec!["Late report", "Someday", "Soon review"]
    );
    let v = env.run_err(&["list", "--priority", "urgent"]);
    assert_eq!(v["error"]["code"], "VALIDATION_ERROR");
}

#[test]
fn test_list_due_filters() {
    let env = TestEnv::new();
    seed_dated_tasks(&env);
    assert_eq!(env.titles(&["--due", "overdue"]), vec!["Late report"]);
    assert_eq!(env.titles(&["--due", "today"]), vec!["Noon call"]);
    assert_eq!(
        sorted(env.titles(&["--due", "thisWeek"])),
        vec!["Noon call", "Soon review"]
    );
    assert_eq!(env.titles(&["--due", "no-due-date"]), vec!["Someday"]);
    let v = env.run_err(&["list", "--due", "tomorrow"]);
    assert_eq!(v["error"]["code"], "VALIDATION_ERROR");
}

#[test]
fn test_list_filters_combine_with_scope() {
    let env = TestEnv::new();
    seed_dated_tasks(&env);
    let id = env.list(&["--search", "Late report"])[0]["id"]
        .as_str()
        .unwrap()
        .to_string();
    env.run_ok(&["archive", &id]);
    assert!(env.titles(&["--due", "overdue"]).is_empty());
    assert_eq!(
        env.titles(&["--archived", "--due", "overdue"]),
        vec!["Late report"]
    );
    assert_eq!(
        env.titles(&["--all", "--priority", "high"]),
        vec!["Someday", "Late report"]
    );
}

#[test]
fn test_status_dashboard() {
    let env = TestEnv::new();
    seed_dated_tasks(&env);
    let someday = env.list(&["--search", "Someday"])[0]["id"]
        .as_str()
        .unwrap()
        .to_string();
    env.run_ok(&["move", &someday, "Done"]);

    let v = env.run_ok(&["status"]);
    let dash = &v["data"]["dashboard"];
    assert_eq!(dash["total"], 5);
    assert_eq!(dash["completed"], 1);

    let titles = |key: &str| -> Vec<String> {
        dash[key]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["title"].as_str().unwrap().to_string())
            .collect()
    };
    let overdue = titles("overdue");
    assert!(overdue.contains(&"Late report".to_string()));
    assert!(!overdue.contains(&"Soon review".to_string()));
    assert_eq!(dash["overdue_count"], overdue.len());

    let upcoming = titles("upcoming");
    assert_eq!(upcoming.last().map(String::as_str), Some("Soon review"));
    assert!(!upcoming.contains(&"Later plan".to_string()));
    assert!(!upcoming.contains(&"Late report".to_string()));

    env.cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Completed: 1 of 5"))
        .stdout(predicate::str::contains("Late report"));
}

// ─── 3. persistence ────────────────────────────────────────────────

#[test]
fn test_changes_survive_restart() {
    let env = TestEnv::new();
    let id = env.add("Persistent");
    env.run_ok(&["move", &id, "In Progress"]);
    let tasks = env.list(&[]);
    assert_eq!(find(&tasks, &id)["status"], "In Progress");
}

#[test]
fn test_empty_board_is_not_reseeded() {
    let env = TestEnv::new();
    let file = env.write_file("empty.json", "[]");
    env.run_ok(&["data", "import", file.to_str().unwrap()]);
    assert!(env.list(&[]).is_empty());
    assert!(env.list(&[]).is_empty());
}

#[test]
fn test_backups_capped_at_ten() {
    let env = TestEnv::new();
    for i in 0..12 {
        env.add(&format!("task {i}"));
    }
    assert_eq!(env.backup_count(), 10);
}

#[test]
fn test_backup_retention_from_config() {
    let env = TestEnv::new();
    env.write_config(r#"{"backup_retention": 3}"#);
    for i in 0..5 {
        env.add(&format!("task {i}"));
    }
    assert_eq!(env.backup_count(), 3);
}

#[test]
fn test_invalid_config_reported() {
    let env = TestEnv::new();
    env.write_config(r#"{"backup_retention": 0}"#);
    let v = env.run_err(&["list"]);
    assert_eq!(v["error"]["code"], "CONFIG_ERROR");
}

#[test]
fn test_full_store_keeps_working() {
    let env = TestEnv::new();
    env.write_config(r#"{"quota_bytes": 200}"#);
    let v = env.run_ok(&["add", "Too big to store"]);
    assert_eq!(v["data"]["durable"], false);
    env.cmd()
        .args(["add", "Still fine"])
        .assert()
        .success()
        .stderr(predicate::str::contains("kept in memory"));
}

#[test]
fn test_data_dir_flag() {
    let env = TestEnv::new();
    let other = env.dir.path().join("elsewhere");
    let other = other.to_str().unwrap();
    env.run_ok(&["add", "Elsewhere", "--data-dir", other]);
    let v = env.run_ok(&["list", "--data-dir", other]);
    assert_eq!(v["data"]["total"], 9);
    assert!(env.dir.path().join("elsewhere").join("taskboard.db").exists());
    assert!(!env.data_dir().exists());
}

// ─── 4. data management ────────────────────────────────────────────

#[test]
fn test_export_without_data() {
    let env = TestEnv::new();
    let v = env.run_err(&["data", "export"]);
    assert_eq!(v["error"]["code"], "NO_DATA_TO_EXPORT");
}

#[test]
fn test_export_writes_dated_file() {
    let env = TestEnv::new();
    env.add("Exported");
    let out = env.dir.path().join("exports");
    let v = env.run_ok(&["data", "export", "--out", out.to_str().unwrap()]);
    assert_eq!(v["data"]["message"], "Data exported successfully");
    let file = PathBuf::from(v["data"]["file"].as_str().unwrap());
    let name = file.file_name().unwrap().to_str().unwrap().to_string();
    assert!(name.starts_with("todo-app-data-") && name.ends_with(".json"));

    let contents: Value = serde_json::from_str(&fs::read_to_string(&file).unwrap()).unwrap();
    let tasks = contents.as_array().unwrap();
    assert_eq!(tasks.len(), 9);
    assert_eq!(tasks[0]["title"], "Exported");
    assert!(tasks[0]["createdAt"].is_string());
}

#[test]
fn test_export_to_stdout() {
    let env = TestEnv::new();
    env.add("Piped");
    env.cmd()
        .args(["data", "export", "--stdout"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("[").and(predicate::str::contains("Piped")));
}

#[test]
fn test_import_invalid_json_keeps_data() {
    let env = TestEnv::new();
    let id = env.add("Survivor");
    let file = env.write_file("bad.json", "{not json");
    let v = env.run_err(&["data", "import", file.to_str().unwrap()]);
    assert_eq!(v["error"]["code"], "MALFORMED_DATA");
    assert_eq!(v["error"]["message"], "Invalid file format");
    find(&env.list(&[]), &id);
}

#[test]
fn test_import_missing_file() {
    let env = TestEnv::new();
    let v = env.run_err(&["data", "import", "nope.json"]);
    assert_eq!(v["error"]["code"], "VALIDATION_ERROR");
}

#[test]
fn test_import_tolerates_bad_records() {
    let env = TestEnv::new();
    let file = env.write_file(
        "loose.json",
        r#"[{"id": "x1", "title": "Imported", "status": "Someday", "priority": 3,
             "dueDate": "garbage", "createdAt": "2024-01-01T00:00:00.000Z"},
            42]"#,
    );
    let v = env.run_ok(&["data", "import", file.to_str().unwrap()]);
    assert_eq!(v["data"]["tasks"], 1);
    let task = env.run_ok(&["show", "x1"])["data"]["task"].clone();
    assert_eq!(task["status"], "To Do");
    assert_eq!(task["priority"], "Medium");
    assert!(task["due_date"].is_null());
    assert_eq!(task["created_at"], "2024-01-01T00:00:00.000Z");
}

#[test]
fn test_restore_without_backups() {
    let env = TestEnv::new();
    let v = env.run_err(&["data", "restore"]);
    assert_eq!(v["error"]["code"], "NO_BACKUP_FOUND");
}

#[test]
fn test_restore_from_latest_backup() {
    let env = TestEnv::new();
    let a = env.add("First");
    let b = env.add("Second");
    let file = env.write_file("empty.json", "[]");
    env.run_ok(&["data", "import", file.to_str().unwrap()]);
    assert!(env.list(&[]).is_empty());

    let v = env.run_ok(&["data", "restore"]);
    assert_eq!(v["data"]["message"], "Data restored from latest backup");
    assert_eq!(v["data"]["tasks"], 10);
    let tasks = env.list(&[]);
    find(&tasks, &a);
    find(&tasks, &b);
}

#[test]
fn test_clear_removes_data_and_backups() {
    let env = TestEnv::new();
    env.add("Doomed");
    let v = env.run_ok(&["data", "clear"]);
    assert_eq!(v["data"]["message"], "All data cleared successfully");
    assert_eq!(env.backup_count(), 0);
    let v = env.run_err(&["data", "restore"]);
    assert_eq!(v["error"]["code"], "NO_BACKUP_FOUND");
    assert_eq!(env.list(&[]).len(), 8);
}

#[test]
fn test_reset_brings_back_defaults() {
    let env = TestEnv::new();
    let file = env.write_file("empty.json", "[]");
    env.run_ok(&["data", "import", file.to_str().unwrap()]);
    let v = env.run_ok(&["data", "reset"]);
    assert_eq!(v["data"]["tasks"], 8);
    assert_eq!(env.list(&[]).len(), 8);
}

// ─── 5. shell ──────────────────────────────────────────────────────

#[test]
fn test_shell_session_saves_on_exit() {
    let env = TestEnv::new();
    env.cmd()
        .arg("shell")
        .write_stdin("add \"From shell\" --priority high\n\nlist\nquit\nadd ignored\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Added task: From shell"));

    let tasks = env.list(&[]);
    assert_eq!(tasks[0]["title"], "From shell");
    assert_eq!(tasks[0]["priority"], "High");
    assert!(tasks.iter().all(|t| t["title"] != "ignored"));
}

#[test]
fn test_shell_reports_errors_and_continues() {
    let env = TestEnv::new();
    env.cmd()
        .arg("shell")
        .write_stdin("move 1 Bogus\nadd \"unterminated\nadd After\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("Invalid status 'Bogus'"))
        .stderr(predicate::str::contains("Unterminated quote"));
    assert_eq!(env.list(&[])[0]["title"], "After");
}

#[test]
fn test_shell_deferred_saves_flush_on_exit() {
    let env = TestEnv::new();
    env.write_config(r#"{"immediate_save": false, "debounce_ms": 60000}"#);
    env.cmd()
        .arg("shell")
        .write_stdin("add One\nadd Two\n")
        .assert()
        .success();
    let titles: Vec<_> = env.list(&[]).iter().map(|t| t["title"].clone()).collect();
    assert_eq!(titles[0], "Two");
    assert_eq!(titles[1], "One");
}

#[test]
fn test_shell_debounced_save_fires_while_idle() {
    let env = TestEnv::new();
    env.write_config(r#"{"immediate_save": false, "debounce_ms": 200}"#);
    let mut child = env.spawn_shell();
    let mut stdin = child.stdin.take().unwrap();
    let out = send_line(&mut child, &mut stdin, "add Idle");
    assert!(out.contains("Added task: Idle"), "unexpected output: {out}");

    thread::sleep(Duration::from_millis(1500));
    // No chance to flush on exit: only the debounce timer can have saved.
    child.kill().unwrap();
    child.wait().unwrap();
    drop(stdin);

    assert_eq!(env.titles(&[])[0], "Idle");
}

#[cfg(unix)]
#[test]
fn test_shell_flushes_on_terminate_signal() {
    let env = TestEnv::new();
    env.write_config(r#"{"immediate_save": false, "debounce_ms": 600000}"#);
    let mut child = env.spawn_shell();
    let mut stdin = child.stdin.take().unwrap();
    let out = send_line(&mut child, &mut stdin, "add Pending");
    assert!(out.contains("Added task: Pending"), "unexpected output: {out}");

    let sent = std::process::Command::new("kill")
        .args(["-TERM", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(sent.success());
    let status = child.wait().unwrap();
    assert!(status.success(), "shell exited with {status}");
    drop(stdin);

    assert_eq!(env.titles(&[])[0], "Pending");
}
