//! Tick-driven CPU scheduling simulator.
//!
//! ## Scope
//! A set of synthetic tasks (arrival tick, required ticks of work) is run
//! under one of six policies: FCFS, SPN, HRRN, RR, SRT and a three-level
//! feedback queue. Every task is driven by its own OS thread; a single
//! clock thread produces ticks; the policy engine runs on the caller's
//! thread and decides which one task holds the (single) server.
//!
//! ## Key invariants
//! - At most one task is `running` at any tick.
//! - `current_runtime` grows by exactly one per tick spent `running` and
//!   never exceeds `total_runtime`.
//! - Only a task's runner moves it to `finished`; only the engine moves it to
//!   `running` or `preempted`.
//! - Nothing depends on the order in which runners observe a tick.
//!
//! ## Run flow
//! `task file -> loader -> Simulation -> {clock driver, runners, engine} -> EventLog -> summary`
//!
//! ## Notable entry points
//! - [`Simulation`] / [`SimConfig`]: one complete run.
//! - [`Policy`] / [`PolicyKind`]: the decision functions.
//! - [`oracle::check_run`]: invariant checker for recorded runs.
//! - [`timeline::Timeline`]: per-task state chart.

pub mod cli;
pub mod engine;
pub mod error;
pub mod event_log;
pub mod loader;
pub mod oracle;
pub mod output_sink;
pub mod policy;
pub mod runner;
pub mod sim;
pub mod simulation;
pub mod task;
pub mod timeline;
pub mod workload;

pub use engine::{Engine, EngineOutcome, EngineStats};
pub use error::{ConfigError, SetupError, SimError};
pub use event_log::{EventLog, LogFormat};
pub use loader::{load_tasks, parse_tasks, LoadError};
pub use policy::{Dispatch, Policy, PolicyKind, StopReason};
pub use simulation::{RunReport, SimConfig, Simulation};
pub use task::{Task, TaskState, TaskTable, TransitionError};
