//! Runs on the wall-clock driver, the CLI default.
//!
//! Tick counts here depend on thread scheduling, so assertions stick to
//! what holds for every interleaving.

use std::time::Duration;

use sched_sim::oracle::check_run;
use sched_sim::sim::TickMode;
use sched_sim::{EngineOutcome, PolicyKind, TaskState};

use crate::support::{run_with, task_lines, Run};

fn periodic(micros: u64) -> TickMode {
    TickMode::Periodic(Duration::from_micros(micros))
}

fn assert_starts_idle(r: &Run) {
    assert!(
        r.log.iter().all(|line| !line.contains("initiated in running")),
        "{:?}",
        r.log
    );
    for task in &r.report.tasks {
        let lines = task_lines(r, task.id);
        assert_eq!(lines[0], format!("0: Task {}: initiated in idle", task.id));
        if let Some(start) = task.start_time {
            assert_eq!(
                lines[1],
                format!("{start}: Task {}: idle -> running, total time worked: 0", task.id)
            );
        }
    }
}

#[test]
fn first_dispatch_reaches_the_log() {
    let spec: Vec<(u32, u64, u64)> = (1..=8).map(|id| (id, 0, 3)).collect();
    for _ in 0..3 {
        let r = run_with(PolicyKind::Rr, 2, &spec, 2_500, periodic(1_000));
        assert!(matches!(r.report.outcome, EngineOutcome::AllFinished { .. }));
        assert_starts_idle(&r);
        let violations = check_run(&r.report.events, &r.report.tasks);
        assert!(violations.is_empty(), "{violations:?}");
    }
}

#[test]
fn fast_clock_stops_at_timeout() {
    let spec: Vec<(u32, u64, u64)> = (1..=50).map(|id| (id, 0, 100)).collect();
    let r = run_with(PolicyKind::Fcfs, 10, &spec, 200, periodic(5));

    assert_eq!(r.report.outcome, EngineOutcome::TimedOut { tick: 200 });
    let worked: u64 = r.report.tasks.iter().map(|t| t.current_runtime).sum();
    assert!(worked <= 200, "worked {worked} ticks in 200");
    assert!(r
        .report
        .tasks
        .iter()
        .all(|t| (t.state == TaskState::Finished) == (t.current_runtime == t.total_runtime)));
    assert!(r.report.events.iter().all(|e| e.tick <= 200));
    assert_starts_idle(&r);
}
