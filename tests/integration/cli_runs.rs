use std::fs;
use std::process::Command;

fn binary() -> Command {
    Command::new(env!("CARGO_BIN_EXE_sched-sim"))
}

#[test]
fn rr_run_writes_log_report_and_timeline() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let tasks = tmp.path().join("tasks.txt");
    let log = tmp.path().join("rr.log");
    let report = tmp.path().join("report.json");
    fs::write(&tasks, "1 0 3\n2 0 3\n").expect("write tasks");

    let output = binary()
        .arg("RR")
        .arg(format!("--tasks={}", tasks.display()))
        .arg(format!("--log={}", log.display()))
        .arg(format!("--report={}", report.display()))
        .args(["--quantum=2", "--lockstep", "--timeline", "--check"])
        .output()
        .expect("run sched-sim");
    assert!(
        output.status.success(),
        "sched-sim failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Using Round Robin scheduler\n"), "{stdout}");
    assert!(stdout.contains("Summary of task scheduling"));
    assert!(stdout.contains("Task 1 |##..# |"), "{stdout}");
    assert!(stdout.contains("Task 2 |..##.#|"), "{stdout}");

    let log_text = fs::read_to_string(&log).expect("read log");
    assert!(log_text.contains("5: Task 1: running -> finished, total time worked: 3"));
    assert!(log_text.contains("6: Task 2: running -> finished, total time worked: 3"));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report).expect("read report"))
            .expect("parse report");
    assert_eq!(json["policy"], "RR");
    assert_eq!(json["outcome"], "all_finished");
    assert_eq!(json["tick"], 6);
    assert_eq!(json["tasks"][1]["current_runtime"], 3);

    let charted = binary()
        .arg("RR")
        .arg(format!("--tasks={}", tasks.display()))
        .arg(format!("--log={}", log.display()))
        .arg("--chart-log")
        .output()
        .expect("run sched-sim");
    assert!(charted.status.success());
    let chart = String::from_utf8_lossy(&charted.stdout);
    assert!(!chart.contains("Summary of task scheduling"), "{chart}");
    assert!(chart.contains("Task 1 |##..# |"), "{chart}");
    assert!(chart.contains("Task 2 |..##.#|"), "{chart}");
}

#[test]
fn chart_log_rejects_a_garbled_log() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let tasks = tmp.path().join("tasks.txt");
    let log = tmp.path().join("bad.log");
    fs::write(&tasks, "1 0 3\n").expect("write tasks");
    fs::write(&log, "0: Task 1: initiated in idle\nnot a log line\n").expect("write log");

    let output = binary()
        .arg("FCFS")
        .arg(format!("--tasks={}", tasks.display()))
        .arg(format!("--log={}", log.display()))
        .arg("--chart-log")
        .output()
        .expect("run sched-sim");
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("not a transition line"));
}

#[test]
fn default_file_names_in_working_directory() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    fs::write(tmp.path().join("tasks.txt"), "7 0 2\n").expect("write tasks");

    let output = binary()
        .args(["FCFS", "--lockstep", "--log-format=jsonl"])
        .current_dir(tmp.path())
        .output()
        .expect("run sched-sim");
    assert!(output.status.success());

    let log_text = fs::read_to_string(tmp.path().join("log_FCFS.txt")).expect("read log");
    let first: serde_json::Value =
        serde_json::from_str(log_text.lines().next().expect("one line")).expect("jsonl line");
    assert_eq!(first["task"], 7);
    assert_eq!(first["from"], "idle");
}

#[test]
fn configuration_errors_exit_2_before_running() {
    let tmp = tempfile::tempdir().expect("create temp dir");

    let output = binary()
        .arg("LOTTERY")
        .current_dir(tmp.path())
        .output()
        .expect("run sched-sim");
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown scheduler type 'LOTTERY'"));

    let output = binary()
        .args(["SRT", "--tasks=missing.txt"])
        .current_dir(tmp.path())
        .output()
        .expect("run sched-sim");
    assert_eq!(output.status.code(), Some(2));
    assert!(!tmp.path().join("log_SRT.txt").exists());
}

#[test]
fn help_exits_zero() {
    let output = binary().arg("--help").output().expect("run sched-sim");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("FEED"));
}
