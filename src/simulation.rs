//! One scheduler run, end to end.
//!
//! # Lifecycle
//!
//! 1. Validate the configuration. Nothing has been spawned yet, so a
//!    configuration error leaves no threads behind.
//! 2. Register and spawn one runner per task. If any spawn fails, the clock
//!    is closed, the runners already started are joined, and the error is
//!    returned.
//! 3. Optional startup delay, then start the clock driver.
//! 4. Run the policy engine on the calling thread.
//! 5. Close the clock (cancelling runners of unfinished tasks), join every
//!    runner, release the driver.
//! 6. Print the summary and return a [`RunReport`].

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::engine::{Engine, EngineOutcome, EngineStats};
use crate::error::{ConfigError, SetupError, SimError};
use crate::event_log::{EventLog, LogFormat};
use crate::output_sink::OutputSink;
use crate::policy::{PolicyKind, DEFAULT_QUANTUM};
use crate::runner::{RunnerExit, TaskRunner};
use crate::sim::{Clock, ClockDriver, TickMode, TransitionEvent, DEFAULT_TRACE_CAPACITY};
use crate::task::{Task, TaskTable};

/// Default timeout in ticks.
pub const DEFAULT_TIMEOUT: u64 = 2500;

/// Parameters of one run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimConfig {
    pub policy: PolicyKind,
    /// Slice length for RR and SRT, level-0 slice for FEED.
    pub quantum: u64,
    /// Tick at which the policy loop gives up.
    pub timeout: u64,
    pub tick_mode: TickMode,
    /// Pause between spawning runners and starting the clock.
    pub startup_delay: Duration,
    pub log_format: LogFormat,
    pub trace_capacity: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            policy: PolicyKind::Fcfs,
            quantum: DEFAULT_QUANTUM,
            timeout: DEFAULT_TIMEOUT,
            tick_mode: TickMode::default(),
            startup_delay: Duration::ZERO,
            log_format: LogFormat::Text,
            trace_capacity: DEFAULT_TRACE_CAPACITY,
        }
    }
}

impl SimConfig {
    pub fn new(policy: PolicyKind) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.quantum == 0 {
            return Err(ConfigError::ZeroQuantum);
        }
        if self.timeout == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if let TickMode::Periodic(period) = self.tick_mode {
            if period.is_zero() {
                return Err(ConfigError::ZeroTickPeriod);
            }
        }
        Ok(())
    }

    /// Event log writing to the given sinks in this configuration's format.
    pub fn event_log(
        &self,
        run_log: Arc<dyn OutputSink>,
        console: Arc<dyn OutputSink>,
    ) -> EventLog {
        EventLog::new(run_log, console)
            .with_format(self.log_format)
            .with_trace_capacity(self.trace_capacity)
    }
}

/// Starts runner threads.
///
/// The seam exists so setup failure can be exercised; [`OsThreads`] is the
/// only production implementation.
pub trait RunnerSpawner {
    fn spawn(&mut self, name: String, runner: TaskRunner) -> io::Result<JoinHandle<RunnerExit>>;
}

/// Named OS threads.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsThreads;

impl RunnerSpawner for OsThreads {
    fn spawn(&mut self, name: String, runner: TaskRunner) -> io::Result<JoinHandle<RunnerExit>> {
        thread::Builder::new().name(name).spawn(move || runner.run())
    }
}

/// Result of a completed run.
#[derive(Clone, Debug, Serialize)]
pub struct RunReport {
    pub policy: PolicyKind,
    pub quantum: u64,
    pub timeout: u64,
    #[serde(flatten)]
    pub outcome: EngineOutcome,
    pub stats: EngineStats,
    /// Runners stopped by the clock closing rather than by finishing.
    pub runners_cancelled: usize,
    /// Final task records in load order.
    pub tasks: Vec<Task>,
    /// Retained transitions in log order.
    #[serde(skip)]
    pub events: Vec<TransitionEvent>,
    /// Transitions that fell out of the trace ring.
    pub events_evicted: u64,
}

impl RunReport {
    pub fn all_finished(&self) -> bool {
        matches!(self.outcome, EngineOutcome::AllFinished { .. })
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// A configured run over a loaded task set.
pub struct Simulation {
    config: SimConfig,
    tasks: Vec<Task>,
    log: Arc<EventLog>,
    spawner: Box<dyn RunnerSpawner>,
}

impl Simulation {
    pub fn new(config: SimConfig, tasks: Vec<Task>, log: Arc<EventLog>) -> Self {
        Self {
            config,
            tasks,
            log,
            spawner: Box::new(OsThreads),
        }
    }

    pub fn with_spawner(mut self, spawner: impl RunnerSpawner + 'static) -> Self {
        self.spawner = Box::new(spawner);
        self
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Run to completion, timeout, or setup failure.
    pub fn run(mut self) -> Result<RunReport, SimError> {
        self.config.validate()?;
        let config = self.config.clone();

        let table = Arc::new(TaskTable::new(std::mem::take(&mut self.tasks)));
        let clock = Arc::new(Clock::with_horizon(config.timeout));

        let ids: Vec<u32> = table.snapshot().iter().map(|t| t.id).collect();
        let mut runners = Vec::with_capacity(ids.len());
        for (index, &id) in ids.iter().enumerate() {
            let runner = match TaskRunner::register(
                index,
                Arc::clone(&table),
                Arc::clone(&clock),
                Arc::clone(&self.log),
            ) {
                Ok(runner) => runner,
                Err(err) => {
                    clock.close();
                    join_runners(runners);
                    let _ = self.log.flush();
                    return Err(err.into());
                }
            };
            match self.spawner.spawn(format!("task-{id}"), runner) {
                Ok(handle) => runners.push(handle),
                Err(source) => {
                    clock.close();
                    join_runners(runners);
                    let _ = self.log.flush();
                    return Err(SetupError::Spawn {
                        what: format!("runner for task {id}"),
                        source,
                    }
                    .into());
                }
            }
        }

        if !config.startup_delay.is_zero() {
            thread::sleep(config.startup_delay);
        }

        clock.attach_engine();
        let driver = match ClockDriver::spawn(&clock, config.tick_mode) {
            Ok(driver) => driver,
            Err(source) => {
                clock.close();
                join_runners(runners);
                let _ = self.log.flush();
                return Err(SetupError::Spawn {
                    what: "clock driver".to_string(),
                    source,
                }
                .into());
            }
        };

        self.log
            .status(&format!("Using {} scheduler", config.policy.description()));

        let mut policy = config.policy.build(config.quantum);
        let mut engine = Engine::new(
            policy.as_mut(),
            Arc::clone(&table),
            Arc::clone(&clock),
            config.timeout,
        );
        let result = engine.run();
        let stats = engine.stats();

        clock.detach_engine();
        clock.close();
        let runners_cancelled = join_runners(runners);
        driver.finish();

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => {
                let _ = self.log.flush();
                return Err(err.into());
            }
        };

        if let EngineOutcome::TimedOut { tick } = outcome {
            self.log.status(&format!(
                "Scheduler timed out at tick {tick} with {} of {} tasks finished",
                table.finished_count(),
                table.len()
            ));
        }

        let tasks = table.snapshot();
        self.log.summary(&tasks);
        self.log.flush().map_err(SimError::Output)?;

        Ok(RunReport {
            policy: config.policy,
            quantum: config.quantum,
            timeout: config.timeout,
            outcome,
            stats,
            runners_cancelled,
            tasks,
            events: self.log.trace(),
            events_evicted: self.log.trace_evicted(),
        })
    }
}

/// Join every runner. Returns how many were cancelled.
fn join_runners(handles: Vec<JoinHandle<RunnerExit>>) -> usize {
    let mut cancelled = 0;
    for handle in handles {
        match handle.join() {
            Ok(RunnerExit::Finished { .. }) => {}
            Ok(RunnerExit::Cancelled) => cancelled += 1,
            Err(_) => {
                eprintln!("task runner panicked");
                cancelled += 1;
            }
        }
    }
    cancelled
}
