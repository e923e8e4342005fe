use std::fs;

use sched_sim::{load_tasks, LoadError, TaskState};

#[test]
fn loading_twice_gives_identical_tasks() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let path = tmp.path().join("tasks.txt");
    fs::write(&path, "# id arrival runtime\n1 0 5\n\n2 3 2\n  3 3 7  \n").expect("write tasks");

    let first = load_tasks(&path).expect("first load");
    let second = load_tasks(&path).expect("second load");
    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
    for task in &first {
        assert_eq!(task.state, TaskState::Idle);
        assert_eq!(task.current_runtime, 0);
        assert_eq!(task.start_time, None);
    }
}

#[test]
fn missing_file_is_an_io_error() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let err = load_tasks(tmp.path().join("absent.txt")).unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }), "{err}");
}

#[test]
fn malformed_line_reports_line_number() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let path = tmp.path().join("tasks.txt");
    fs::write(&path, "1 0 5\n2 x 1\n").expect("write tasks");
    match load_tasks(&path) {
        Err(LoadError::Malformed { line, .. }) => assert_eq!(line, 2),
        other => panic!("expected malformed error, got {other:?}"),
    }
}
