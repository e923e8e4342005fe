//! Shared helpers: simulation runs with in-memory sinks.

use std::sync::Arc;

use sched_sim::output_sink::VecSink;
use sched_sim::sim::TickMode;
use sched_sim::{PolicyKind, RunReport, SimConfig, Simulation, Task};

pub struct Run {
    pub report: RunReport,
    pub console: Vec<String>,
    pub log: Vec<String>,
}

pub fn tasks(spec: &[(u32, u64, u64)]) -> Vec<Task> {
    spec.iter()
        .map(|&(id, arrival, runtime)| Task::new(id, arrival, runtime))
        .collect()
}

/// Lockstep run.
pub fn run(policy: PolicyKind, quantum: u64, spec: &[(u32, u64, u64)], timeout: u64) -> Run {
    run_with(policy, quantum, spec, timeout, TickMode::Lockstep)
}

pub fn run_with(
    policy: PolicyKind,
    quantum: u64,
    spec: &[(u32, u64, u64)],
    timeout: u64,
    tick_mode: TickMode,
) -> Run {
    let config = SimConfig {
        quantum,
        timeout,
        tick_mode,
        ..SimConfig::new(policy)
    };
    let run_log = Arc::new(VecSink::new());
    let console = Arc::new(VecSink::new());
    let log = Arc::new(config.event_log(run_log.clone(), console.clone()));
    let report = Simulation::new(config, tasks(spec), log)
        .run()
        .expect("simulation run");
    Run {
        report,
        console: console.lines(),
        log: run_log.lines(),
    }
}

/// Run-log lines of one task, in order.
pub fn task_lines(run: &Run, id: u32) -> Vec<String> {
    run.report
        .events
        .iter()
        .filter(|e| e.task == id)
        .map(|e| e.to_string())
        .collect()
}

pub fn start_times(run: &Run) -> Vec<Option<u64>> {
    run.report.tasks.iter().map(|t| t.start_time).collect()
}
