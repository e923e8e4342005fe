//! Random small task sets under every policy, in lockstep mode.
//!
//! Every run must pass the oracle, finish every task, and be work
//! conserving: all six policies keep the server busy whenever some task is
//! eligible, so the last finish tick equals the end of the FCFS busy period.

use std::sync::Arc;

use proptest::prelude::*;

use sched_sim::oracle::check_run;
use sched_sim::sim::TickMode;
use sched_sim::{EngineOutcome, EventLog, PolicyKind, SimConfig, Simulation, Task, TaskState};

fn task_set_strategy() -> impl Strategy<Value = Vec<Task>> {
    prop::collection::vec((0u64..8, 1u64..6), 1..5).prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (arrival, runtime))| Task::new(i as u32 + 1, arrival, runtime))
            .collect()
    })
}

fn policy_strategy() -> impl Strategy<Value = PolicyKind> {
    prop::sample::select(PolicyKind::ALL.to_vec())
}

/// Tick at which a work-conserving single server drains `tasks`.
fn busy_period_end(tasks: &[Task]) -> u64 {
    let mut by_arrival: Vec<&Task> = tasks.iter().collect();
    by_arrival.sort_by_key(|t| t.arrival_time);
    by_arrival.iter().fold(0, |t, task| {
        t.max(task.arrival_time) + task.total_runtime
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn runs_are_consistent_and_work_conserving(
        tasks in task_set_strategy(),
        policy in policy_strategy(),
        quantum in 1u64..4,
    ) {
        let config = SimConfig {
            quantum,
            timeout: 1_000,
            tick_mode: TickMode::Lockstep,
            ..SimConfig::new(policy)
        };
        let log = Arc::new(EventLog::silent());
        let report = Simulation::new(config, tasks.clone(), log)
            .run()
            .expect("simulation run");

        let violations = check_run(&report.events, &report.tasks);
        prop_assert!(violations.is_empty(), "{policy}: {violations:?}");

        prop_assert_eq!(
            report.outcome,
            EngineOutcome::AllFinished { tick: busy_period_end(&tasks) }
        );
        prop_assert_eq!(report.runners_cancelled, 0);
        for task in &report.tasks {
            prop_assert_eq!(task.state, TaskState::Finished);
            prop_assert_eq!(task.current_runtime, task.total_runtime);
            prop_assert!(task.start_time.is_some_and(|s| s >= task.arrival_time));
        }

        if !policy.is_preemptive() {
            prop_assert!(report
                .events
                .iter()
                .all(|e| e.to != TaskState::Preempted));
        }
    }

    #[test]
    fn timeouts_never_overrun(
        tasks in task_set_strategy(),
        policy in policy_strategy(),
        timeout in 1u64..10,
    ) {
        let config = SimConfig {
            quantum: 2,
            timeout,
            tick_mode: TickMode::Lockstep,
            ..SimConfig::new(policy)
        };
        let log = Arc::new(EventLog::silent());
        let report = Simulation::new(config, tasks, log)
            .run()
            .expect("simulation run");

        let end = report.outcome.tick().expect("loop ended on its own");
        prop_assert!(end <= timeout);
        let worked: u64 = report.tasks.iter().map(|t| t.current_runtime).sum();
        prop_assert!(worked <= end);
        prop_assert!(check_run(&report.events, &report.tasks).is_empty());
    }
}
