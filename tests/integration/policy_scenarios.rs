//! End-to-end scenarios for each policy, in lockstep mode.
//!
//! Lines are compared per task: runners of different tasks log the same
//! tick in no particular order.

use sched_sim::oracle::check_run;
use sched_sim::{EngineOutcome, PolicyKind};

use crate::support::{run, start_times, task_lines, Run};

fn assert_clean(run: &Run) {
    let violations = check_run(&run.report.events, &run.report.tasks);
    assert!(violations.is_empty(), "violations: {violations:?}");
}

#[test]
fn fcfs_runs_in_arrival_order() {
    let r = run(PolicyKind::Fcfs, 10, &[(1, 0, 3), (2, 1, 2)], 100);
    assert_eq!(r.report.outcome, EngineOutcome::AllFinished { tick: 5 });
    assert_eq!(start_times(&r), vec![Some(0), Some(3)]);
    assert_eq!(
        task_lines(&r, 1),
        vec![
            "0: Task 1: initiated in idle",
            "0: Task 1: idle -> running, total time worked: 0",
            "3: Task 1: running -> finished, total time worked: 3",
        ]
    );
    assert_eq!(
        task_lines(&r, 2),
        vec![
            "0: Task 2: initiated in idle",
            "3: Task 2: idle -> running, total time worked: 0",
            "5: Task 2: running -> finished, total time worked: 2",
        ]
    );
    assert_clean(&r);
}

#[test]
fn round_robin_interleaves_by_quantum() {
    let r = run(PolicyKind::Rr, 2, &[(1, 0, 3), (2, 0, 3)], 100);
    assert_eq!(r.report.outcome, EngineOutcome::AllFinished { tick: 6 });
    assert_eq!(
        task_lines(&r, 1)[1..],
        [
            "0: Task 1: idle -> running, total time worked: 0",
            "2: Task 1: running -> preempted, total time worked: 2",
            "4: Task 1: preempted -> running, total time worked: 2",
            "5: Task 1: running -> finished, total time worked: 3",
        ]
    );
    assert_eq!(
        task_lines(&r, 2)[1..],
        [
            "2: Task 2: idle -> running, total time worked: 0",
            "4: Task 2: running -> preempted, total time worked: 2",
            "5: Task 2: preempted -> running, total time worked: 2",
            "6: Task 2: running -> finished, total time worked: 3",
        ]
    );
    assert_clean(&r);
}

#[test]
fn srt_preempts_for_shorter_arrival_and_keeps_progress() {
    let r = run(PolicyKind::Srt, 10, &[(1, 0, 10), (2, 3, 2)], 100);
    assert_eq!(r.report.outcome, EngineOutcome::AllFinished { tick: 12 });
    assert_eq!(start_times(&r), vec![Some(0), Some(3)]);
    assert_eq!(
        task_lines(&r, 1)[1..],
        [
            "0: Task 1: idle -> running, total time worked: 0",
            "3: Task 1: running -> preempted, total time worked: 3",
            "5: Task 1: preempted -> running, total time worked: 3",
            "12: Task 1: running -> finished, total time worked: 10",
        ]
    );
    assert_clean(&r);
}

#[test]
fn feedback_slices_grow_then_run_to_completion() {
    let r = run(PolicyKind::Feed, 1, &[(1, 0, 8), (2, 0, 8)], 100);
    assert_eq!(r.report.outcome, EngineOutcome::AllFinished { tick: 16 });
    // Level 0: one tick, level 1: two ticks, level 2: until finished.
    assert_eq!(
        task_lines(&r, 1)[1..],
        [
            "0: Task 1: idle -> running, total time worked: 0",
            "1: Task 1: running -> preempted, total time worked: 1",
            "2: Task 1: preempted -> running, total time worked: 1",
            "4: Task 1: running -> preempted, total time worked: 3",
            "6: Task 1: preempted -> running, total time worked: 3",
            "11: Task 1: running -> finished, total time worked: 8",
        ]
    );
    assert_eq!(
        task_lines(&r, 2)[1..],
        [
            "1: Task 2: idle -> running, total time worked: 0",
            "2: Task 2: running -> preempted, total time worked: 1",
            "4: Task 2: preempted -> running, total time worked: 1",
            "6: Task 2: running -> preempted, total time worked: 3",
            "11: Task 2: preempted -> running, total time worked: 3",
            "16: Task 2: running -> finished, total time worked: 8",
        ]
    );
    assert_clean(&r);
}

#[test]
fn spn_and_hrrn_diverge_on_long_wait() {
    // At tick 10: task 2 has waited 9 of 20 (ratio 1.45), task 3 has waited
    // 1 of 15 (ratio ~1.07). SPN takes the shorter task 3, HRRN task 2.
    let spec = [(1, 0, 10), (2, 1, 20), (3, 9, 15)];

    let spn = run(PolicyKind::Spn, 10, &spec, 1000);
    assert_eq!(spn.report.outcome, EngineOutcome::AllFinished { tick: 45 });
    assert_eq!(start_times(&spn), vec![Some(0), Some(25), Some(10)]);
    assert_clean(&spn);

    let hrrn = run(PolicyKind::Hrrn, 10, &spec, 1000);
    assert_eq!(hrrn.report.outcome, EngineOutcome::AllFinished { tick: 45 });
    assert_eq!(start_times(&hrrn), vec![Some(0), Some(10), Some(30)]);
    assert_clean(&hrrn);
}

#[test]
fn idle_gap_before_late_arrival() {
    let r = run(PolicyKind::Rr, 2, &[(1, 0, 1), (2, 5, 1)], 100);
    assert_eq!(r.report.outcome, EngineOutcome::AllFinished { tick: 6 });
    assert_eq!(start_times(&r), vec![Some(0), Some(5)]);
    assert_eq!(r.report.stats.idle_ticks, 4);
    assert_clean(&r);
}

#[test]
fn console_banner_names_policy() {
    for kind in PolicyKind::ALL {
        let r = run(kind, 2, &[(1, 0, 1)], 100);
        assert_eq!(
            r.console[0],
            format!("Using {} scheduler", kind.description())
        );
        assert_eq!(r.console[1], "Summary of task scheduling");
        assert_eq!(r.log.len(), 3, "{kind}: {:?}", r.log);
    }
}
