use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_path(file_name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("taskmaster-{nanos}-{file_name}"))
}

fn run_interactive_with_store(store_path: &Path, input: &str) -> std::process::Output {
    let exe = env!("CARGO_BIN_EXE_taskmaster");

    let mut child = Command::new(exe)
        .env("TASKMASTER_STORE_PATH", store_path)
        .env("TASKMASTER_CONFIG_PATH", store_path.with_extension("config.json"))
        .env("TASKMASTER_DISABLE_NOTIFICATIONS", "1")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn interactive session");

    {
        let stdin = child.stdin.as_mut().expect("stdin");
        stdin
            .write_all(input.as_bytes())
            .expect("failed to write to stdin");
    }

    child
        .wait_with_output()
        .expect("failed to read interactive output")
}

fn run_interactive(input: &str) -> std::process::Output {
    let store_path = temp_path("cli-interactive.json");
    let output = run_interactive_with_store(&store_path, input);
    std::fs::remove_file(&store_path).ok();
    output
}

#[test]
fn interactive_help_shows_usage() {
    let output = run_interactive("help\nexit\n");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage") || stdout.contains("USAGE"));
}

#[test]
fn interactive_question_mark_shows_usage() {
    let output = run_interactive("?\nexit\n");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage") || stdout.contains("USAGE"));
}

#[test]
fn interactive_invalid_command_prints_error() {
    let output = run_interactive("nope\nexit\n");
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_input"));
}

#[test]
fn interactive_unterminated_quote_prints_error() {
    let output = run_interactive("add \"half open\nexit\n");
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unterminated quote"));
}

#[test]
fn interactive_session_ends_at_end_of_input() {
    let output = run_interactive("add \"demo task\"\n");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Added task: demo task"));
}

#[test]
fn interactive_form_keeps_type_and_priority_between_adds() {
    let store_path = temp_path("cli-interactive-sticky.json");
    let output = run_interactive_with_store(
        &store_path,
        "add \"first goal\" --type yearly --priority important --due 2030-01-01\n\
         add \"second goal\"\n\
         quit\n",
    );

    let stored: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&store_path).unwrap()).unwrap();
    std::fs::remove_file(&store_path).ok();

    assert!(output.status.success());
    let yearly = stored["yearly"].as_array().unwrap();
    assert_eq!(yearly.len(), 2);
    assert_eq!(yearly[0]["title"], "first goal");
    assert_eq!(yearly[0]["dueDate"], "2030-01-01");
    assert_eq!(yearly[1]["title"], "second goal");
    assert_eq!(yearly[1]["priority"], "important");
    assert!(yearly[1].get("dueDate").is_none());
    assert!(stored["daily"].as_array().unwrap().is_empty());
}

#[test]
fn interactive_commands_share_one_store() {
    let store_path = temp_path("cli-interactive-shared.json");
    let output = run_interactive_with_store(
        &store_path,
        "add \"only task\"\nlist --json\nexit\n",
    );
    std::fs::remove_file(&store_path).ok();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let listed = stdout
        .lines()
        .find(|line| line.starts_with('{'))
        .expect("json listing");
    let all: serde_json::Value = serde_json::from_str(listed).unwrap();
    assert_eq!(all["daily"][0]["title"], "only task");
}

#[test]
fn interactive_blank_title_adds_nothing_without_error() {
    let store_path = temp_path("cli-interactive-blank.json");
    let output = run_interactive_with_store(&store_path, "add \"   \"\nexit\n");

    let written = store_path.exists();
    std::fs::remove_file(&store_path).ok();

    assert!(output.status.success());
    assert!(!String::from_utf8_lossy(&output.stderr).contains("ERROR"));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Nothing added"));
    assert!(!written);
}

#[test]
fn interactive_rejected_time_and_repeat_days_do_not_stick() {
    let store_path = temp_path("cli-interactive-reset.json");
    let output = run_interactive_with_store(
        &store_path,
        "add \"bad slot\" --remind-on 2030-01-01 --at 25:00 --repeat mon\n\
         add \"stretch\" --remind-on 2030-01-01\n\
         exit\n",
    );

    let stored: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&store_path).unwrap()).unwrap();
    std::fs::remove_file(&store_path).ok();

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("ERROR: invalid_input"));
    let daily = stored["daily"].as_array().unwrap();
    assert_eq!(daily.len(), 1);
    assert_eq!(daily[0]["title"], "stretch");
    assert!(daily[0].get("repeatDays").is_none());
    assert!(daily[0]["reminder"].as_str().unwrap().contains("T12:00:00"));
}

#[test]
fn interactive_override_outside_list_is_rejected() {
    let store_path = temp_path("cli-interactive-override.json");
    let output = run_interactive_with_store(
        &store_path,
        "add \"no effect\" --config-override theme=noir\n\
         list --config-override theme=noir\n\
         exit\n",
    );

    let written = store_path.exists();
    std::fs::remove_file(&store_path).ok();

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.matches("only applies to list").count(), 1);
    assert!(String::from_utf8_lossy(&output.stdout).contains("Daily Tasks (0)"));
    assert!(!written);
}
