//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run, each against its own data
//! directory, and verify the JSON they print.

use std::path::Path;
use std::process::Command;

/// Run a CLI command with `SYCLAR_HOME` set to `home`.
fn run_cli(home: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new("cargo")
        .args(["run", "-q", "-p", "syclar-cli", "--"])
        .args(args)
        .env("SYCLAR_HOME", home)
        .env_remove("OPENAI_API_KEY")
        .env_remove("SYCLAR_ADMIN_KEY")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (output.status.code().unwrap_or(-1), stdout, stderr)
}

fn run_json(home: &Path, args: &[&str]) -> serde_json::Value {
    let (code, stdout, stderr) = run_cli(home, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("{args:?} printed non-JSON ({e}): {stdout}"))
}

#[test]
fn test_rank_from_points() {
    let home = tempfile::tempdir().unwrap();
    let rank = run_json(home.path(), &["rank", "from-points", "0"]);
    assert_eq!(rank["display"], "C class Rank #500");

    let rank = run_json(home.path(), &["rank", "from-points", "-20"]);
    assert_eq!(rank["number"], 502);
}

#[test]
fn test_rank_add_persists() {
    let home = tempfile::tempdir().unwrap();
    run_json(home.path(), &["rank", "add", "-30"]);
    let rank = run_json(home.path(), &["rank", "show"]);
    assert_eq!(rank["points"], -30);
    assert_eq!(rank["display"], "C class Rank #503");

    run_json(home.path(), &["rank", "reset"]);
    let rank = run_json(home.path(), &["rank", "show"]);
    assert_eq!(rank["points"], 0);
}

#[test]
fn test_track_decays_without_allowance() {
    let home = tempfile::tempdir().unwrap();
    run_json(home.path(), &["track", "start"]);
    let tick = run_json(
        home.path(),
        &["track", "tick", "--seconds", "120", "--url", "https://www.youtube.com/watch?v=1"],
    );
    assert_eq!(tick["decayed_minutes"], 2);
    assert_eq!(tick["rank"]["points"], -2);

    let tick = run_json(home.path(), &["track", "tick", "--seconds", "60", "--url", "https://docs.rs"]);
    assert_eq!(tick["decayed_minutes"], 0);

    let status = run_json(home.path(), &["track", "status"]);
    assert_eq!(status["tracker"]["tracking"], true);
    assert_eq!(status["would_protect"], false);
}

#[test]
fn test_track_long_tick_output_is_bounded() {
    let home = tempfile::tempdir().unwrap();
    run_json(home.path(), &["track", "start"]);
    let seconds = (30 * 24 * 60 * 60).to_string();
    let tick = run_json(
        home.path(),
        &["track", "tick", "--seconds", &seconds, "--url", "https://reddit.com"],
    );
    assert_eq!(tick["decayed_minutes"], 30 * 24 * 60);
    assert!(tick["events"].as_array().unwrap().len() <= 121);
    assert!(tick["events_dropped"].as_u64().unwrap() > 0);
    assert_eq!(tick["events"].as_array().unwrap().last().unwrap()["type"], "rank_changed");
}

#[test]
fn test_task_lifecycle() {
    let home = tempfile::tempdir().unwrap();
    let task = run_json(home.path(), &["task", "add", "Write release notes"]);
    let id = task["id"].as_str().unwrap().to_string();

    let breakdown = run_json(home.path(), &["task", "breakdown", &id]);
    assert_eq!(breakdown["mock"], true);
    assert_eq!(breakdown["added"], 4);

    let tasks = run_json(home.path(), &["task", "list"]);
    assert_eq!(tasks.as_array().unwrap().len(), 1);
    assert_eq!(tasks[0]["estimateLabel"], "5h 30m");

    let done = run_json(home.path(), &["task", "complete", &id]);
    assert_eq!(done["events"][0]["type"], "task_completed");

    let rank = run_json(home.path(), &["rank", "show"]);
    assert_eq!(rank["points"], 10);

    let stats = run_json(home.path(), &["stats", "show"]);
    assert_eq!(stats["stats"]["totalCycles"], 1);
    assert_eq!(stats["trophies"][0]["id"], "first_cycle");
}

#[test]
fn test_focus_requires_known_task() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(home.path(), &["focus", "start", "missing"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("error:"), "{stderr}");

    let task = run_json(home.path(), &["task", "add", "Deep work"]);
    let id = task["id"].as_str().unwrap();
    let started = run_json(home.path(), &["focus", "start", id]);
    assert_eq!(started["state"], "running");
    let status = run_json(home.path(), &["focus", "status"]);
    assert_eq!(status["task_id"], id);

    let stopped = run_json(home.path(), &["focus", "stop"]);
    assert_eq!(stopped["type"], "focus_stopped");
}

#[test]
fn test_plan_generate_and_start_stone() {
    let home = tempfile::tempdir().unwrap();
    run_json(
        home.path(),
        &["plan", "update-pillar", "1", "--name", "Career", "--win", "Ship v1"],
    );
    let stones = run_json(home.path(), &["plan", "generate", "1"]);
    assert_eq!(stones.as_array().unwrap().len(), 4);
    let stone_id = stones[0]["id"].as_str().unwrap().to_string();

    let started = run_json(home.path(), &["plan", "start-stone", &stone_id]);
    assert_eq!(started["stone"]["inProgress"], true);

    let (code, _, _) = run_cli(home.path(), &["plan", "start-stone", stones[1]["id"].as_str().unwrap()]);
    assert_ne!(code, 0);

    let tasks = run_json(home.path(), &["task", "list"]);
    assert_eq!(tasks[0]["label"], stones[0]["name"]);
}

#[test]
fn test_waitlist_rejects_duplicates() {
    let home = tempfile::tempdir().unwrap();
    let joined = run_json(home.path(), &["waitlist", "join", "a@example.com"]);
    assert_eq!(joined["total"], 1);

    let (code, _, stderr) = run_cli(home.path(), &["waitlist", "join", "a@example.com"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("Email already registered"), "{stderr}");

    let count = run_json(home.path(), &["waitlist", "count"]);
    assert_eq!(count["count"], 1);
}

#[test]
fn test_story_and_accomplishments() {
    let home = tempfile::tempdir().unwrap();
    let story = run_json(home.path(), &["story", "add", "Finished the draft"]);
    let id = story["id"].as_i64().unwrap().to_string();
    assert_eq!(run_json(home.path(), &["story", "list"]).as_array().unwrap().len(), 1);
    assert_eq!(run_json(home.path(), &["story", "delete", &id])["deleted"], true);

    let (code, _, _) = run_cli(home.path(), &["accomplish", "save", "c1", "[1]"]);
    assert_ne!(code, 0);
    let (code, _, _) = run_cli(home.path(), &["accomplish", "save", "c1", r#"{"day":1}"#]);
    assert_eq!(code, 0);
    assert_eq!(run_json(home.path(), &["accomplish", "load", "c1"])["day"], 1);
}

#[test]
fn test_config_get_set() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["config", "get", "focus.block_minutes"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "5");

    let (code, _, _) = run_cli(home.path(), &["config", "set", "focus.block_minutes", "10"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(home.path(), &["config", "get", "focus.block_minutes"]);
    assert_eq!(stdout.trim(), "10");

    let (code, _, stderr) = run_cli(home.path(), &["config", "get", "nope.key"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("unknown config key"), "{stderr}");
}
