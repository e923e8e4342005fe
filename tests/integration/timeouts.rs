use sched_sim::oracle::check_run;
use sched_sim::{EngineOutcome, PolicyKind, TaskState};

use crate::support::run;

#[test]
fn timeout_reports_partial_progress() {
    let r = run(PolicyKind::Rr, 3, &[(1, 0, 10), (2, 0, 10), (3, 50, 1)], 7);
    assert_eq!(r.report.outcome, EngineOutcome::TimedOut { tick: 7 });
    assert_eq!(r.report.runners_cancelled, 3);

    let tasks = &r.report.tasks;
    assert_eq!((tasks[0].current_runtime, tasks[0].state), (4, TaskState::Running));
    assert_eq!((tasks[1].current_runtime, tasks[1].state), (3, TaskState::Preempted));
    assert_eq!((tasks[2].current_runtime, tasks[2].state), (0, TaskState::Idle));

    assert_eq!(
        r.console,
        vec![
            "Using Round Robin scheduler",
            "Scheduler timed out at tick 7 with 0 of 3 tasks finished",
            "Summary of task scheduling",
            "Task with ID 1 arrived at time 0, started at time 0 and worked for 4 out of 10 time units",
            "Task with ID 2 arrived at time 0, started at time 3 and worked for 3 out of 10 time units",
            "Task with ID 3 arrived at time 50, never started and worked for 0 out of 1 time units",
        ]
    );
    assert!(check_run(&r.report.events, &r.report.tasks).is_empty());
}

#[test]
fn finishing_before_timeout_exits_early() {
    let r = run(PolicyKind::Fcfs, 10, &[(1, 0, 2)], 2500);
    assert_eq!(r.report.outcome, EngineOutcome::AllFinished { tick: 2 });
    assert_eq!(r.report.runners_cancelled, 0);
}

#[test]
fn timeout_while_nothing_has_arrived() {
    let r = run(PolicyKind::Spn, 10, &[(1, 20, 2)], 5);
    assert_eq!(r.report.outcome, EngineOutcome::TimedOut { tick: 5 });
    assert_eq!(r.report.tasks[0].start_time, None);
    assert_eq!(r.report.stats.idle_ticks, 5);
}
