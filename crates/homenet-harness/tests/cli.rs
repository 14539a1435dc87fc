//! homenet-nettest binary against local nodes

#![cfg(unix)]

use serde_json::Value;
use std::path::Path;
use std::process::{Command, Output};

fn nettest(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_homenet-nettest"))
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to run homenet-nettest")
}

/// A single local node followed by the given `wait_until_succeeds` commands
fn write_plan(dir: &Path, timing: &str, commands: &[&str]) {
    let mut plan = format!("{}\n[[nodes]]\nname = \"a\"\nexec = []\n\n", timing);
    plan.push_str("[[steps]]\naction = \"start_all\"\n");
    for command in commands {
        plan.push_str(&format!(
            "\n[[steps]]\naction = \"wait_until_succeeds\"\nnode = \"a\"\ncommand = {:?}\n",
            command
        ));
    }
    std::fs::write(dir.join("plan.toml"), plan).unwrap();
}

#[test]
fn test_passing_plan_exits_zero_and_writes_report() {
    let dir = tempfile::tempdir().unwrap();
    write_plan(dir.path(), "", &["true", "echo reachable"]);

    let output = nettest(dir.path(), &["--plan", "plan.toml", "--report", "report.json"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let report: Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("report.json")).unwrap())
            .unwrap();
    let steps = report["steps"].as_array().unwrap();
    assert_eq!(steps.len(), 3);
    assert_eq!(steps[0]["step"], "start_all()");
    assert_eq!(steps[2]["step"], "a.wait_until_succeeds(\"echo reachable\")");
    assert_eq!(steps[2]["output"], "reachable\n");
    assert!(report["started_at"].is_string());
}

#[test]
fn test_failing_step_is_named_and_stops_the_run() {
    let dir = tempfile::tempdir().unwrap();
    // The plan's own deadline would keep the run going for an hour
    write_plan(
        dir.path(),
        "[timing]\ncommand_timeout = \"1h\"",
        &["false", "touch after-failure"],
    );

    let output = nettest(
        dir.path(),
        &["--plan", "plan.toml", "--timeout", "1s", "--poll-interval", "100ms"],
    );
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("step 1"), "{}", stderr);
    assert!(stderr.contains("a.wait_until_succeeds(\"false\")"), "{}", stderr);
    assert!(stderr.contains("Timed out after 1s"), "{}", stderr);
    // Reported once, not logged and then printed again
    let stdout = String::from_utf8_lossy(&output.stdout);
    let reports = stdout.matches("failed: Timed out").count()
        + stderr.matches("failed: Timed out").count();
    assert_eq!(reports, 1, "{}{}", stdout, stderr);
    assert!(!dir.path().join("after-failure").exists());
    assert!(!dir.path().join("report.json").exists());
}

#[test]
fn test_poll_interval_override() {
    let dir = tempfile::tempdir().unwrap();
    // Succeeds on the third attempt; an hourly poll would blow the deadline
    let counter = "n=$(cat count 2>/dev/null || echo 0); n=$((n + 1)); echo $n > count; \
                   test $n -ge 3";
    write_plan(
        dir.path(),
        "[timing]\npoll_interval = \"1h\"\ncommand_timeout = \"30s\"",
        &[counter],
    );

    let output = nettest(dir.path(), &["--plan", "plan.toml", "--poll-interval", "50ms"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let attempts = std::fs::read_to_string(dir.path().join("count")).unwrap();
    assert_eq!(attempts.trim(), "3");
}

#[test]
fn test_invalid_plan_exits_non_zero() {
    let dir = tempfile::tempdir().unwrap();
    let plan = r#"
        [[nodes]]
        name = "a"

        [[steps]]
        action = "start_all"

        [[steps]]
        action = "wait_until_succeeds"
        node = "b"
        command = "true"
    "#;
    std::fs::write(dir.path().join("plan.toml"), plan).unwrap();

    let output = nettest(dir.path(), &["--plan", "plan.toml"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown node: b"));
}
