//! Policy engine: the decision loop shared by every policy.
//!
//! The engine runs on the caller's thread. It only acts in the decide phase
//! of a tick (see [`crate::sim::clock`]): once every runner has credited its
//! task for the tick, the engine takes one snapshot of the table and
//! consults the policy.
//!
//! ```text
//!   settled tick ──► all finished? ──► AllFinished
//!        │                │ no
//!        │                ▼
//!        │          now >= timeout? ──► TimedOut
//!        │                │ no
//!        │                ▼
//!        │          policy.next ── None ──► wait one tick ──┐
//!        │                │ Some(d)                          │
//!        │                ▼                                  │
//!        │          dispatch d, wait tick by tick until      │
//!        │          finished / slice over / interrupted      │
//!        │                │                                  │
//!        └────────────────┴──────────────────────────────────┘
//! ```
//!
//! Running tasks stay `running` while their slice is re-evaluated; a task
//! chosen again right after its slice expired keeps the server without a
//! logged preempt/resume pair. A timeout leaves every task as it is.

use std::sync::Arc;

use serde::Serialize;

use crate::policy::{Dispatch, Policy, StopReason};
use crate::sim::Clock;
use crate::task::{Task, TaskState, TaskTable, TransitionError};

/// How the policy loop ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EngineOutcome {
    /// Every task finished by `tick`.
    AllFinished { tick: u64 },
    /// The timeout tick was reached with work left.
    TimedOut { tick: u64 },
    /// The clock was closed underneath the engine.
    Cancelled,
}

impl EngineOutcome {
    /// Tick the loop ended at, if it ended on its own.
    pub fn tick(&self) -> Option<u64> {
        match *self {
            Self::AllFinished { tick } | Self::TimedOut { tick } => Some(tick),
            Self::Cancelled => None,
        }
    }
}

/// Counters gathered over one run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    /// Calls to `Policy::next`.
    pub decisions: u64,
    /// Dispatches that changed the running task.
    pub context_switches: u64,
    /// Ticks waited with no eligible task.
    pub idle_ticks: u64,
}

enum SliceEnd {
    Stopped { reason: StopReason, tick: u64 },
    TimedOut { tick: u64 },
    Cancelled,
}

/// Drives one policy against a task table until completion or timeout.
pub struct Engine<'p> {
    policy: &'p mut dyn Policy,
    tasks: Arc<TaskTable>,
    clock: Arc<Clock>,
    timeout: u64,
    snapshot: Vec<Task>,
    stats: EngineStats,
}

impl<'p> Engine<'p> {
    pub fn new(
        policy: &'p mut dyn Policy,
        tasks: Arc<TaskTable>,
        clock: Arc<Clock>,
        timeout: u64,
    ) -> Self {
        let snapshot = Vec::with_capacity(tasks.len());
        Self {
            policy,
            tasks,
            clock,
            timeout,
            snapshot,
            stats: EngineStats::default(),
        }
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// Run the policy loop.
    ///
    /// The caller must have attached the engine to the clock
    /// ([`Clock::attach_engine`]) before the driver starts.
    ///
    /// # Errors
    ///
    /// Returns a [`TransitionError`] if the table rejects a dispatch for a
    /// reason other than the chosen task finishing concurrently.
    pub fn run(&mut self) -> Result<EngineOutcome, TransitionError> {
        let Some(mut now) = self.clock.settled() else {
            return Ok(EngineOutcome::Cancelled);
        };

        loop {
            self.tasks.snapshot_into(&mut self.snapshot);
            if self.snapshot.iter().all(Task::is_finished) {
                return Ok(EngineOutcome::AllFinished { tick: now });
            }
            if now >= self.timeout {
                return Ok(EngineOutcome::TimedOut { tick: now });
            }

            self.stats.decisions += 1;
            let Some(dispatch) = self.policy.next(&self.snapshot, now) else {
                match self.clock.wait_settled_after(now) {
                    Some(t) => {
                        self.stats.idle_ticks += t - now;
                        now = t;
                        continue;
                    }
                    None => return Ok(EngineOutcome::Cancelled),
                }
            };

            if !self.dispatch(dispatch.index, now)? {
                // Finished between snapshot and dispatch; decide again.
                continue;
            }

            match self.run_slice(dispatch, now) {
                SliceEnd::Stopped { reason, tick } => {
                    self.policy.result(dispatch.index, reason);
                    now = tick;
                }
                SliceEnd::TimedOut { tick } => {
                    return Ok(EngineOutcome::TimedOut { tick });
                }
                SliceEnd::Cancelled => return Ok(EngineOutcome::Cancelled),
            }
        }
    }

    /// Give the server to `index`. Returns `false` if it had already finished.
    fn dispatch(&mut self, index: usize, now: u64) -> Result<bool, TransitionError> {
        let was_running = self
            .snapshot
            .get(index)
            .is_some_and(|t| t.state == TaskState::Running);
        match self.tasks.dispatch(index, now) {
            Ok(_) => {
                if !was_running {
                    self.stats.context_switches += 1;
                }
                Ok(true)
            }
            Err(TransitionError::Illegal {
                from: TaskState::Finished,
                ..
            }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Wait tick by tick while `dispatch` holds the server.
    fn run_slice(&mut self, dispatch: Dispatch, start: u64) -> SliceEnd {
        let mut now = start;
        loop {
            now = match self.clock.wait_settled_after(now) {
                Some(t) => t,
                None => return SliceEnd::Cancelled,
            };
            self.tasks.snapshot_into(&mut self.snapshot);

            let finished = self
                .snapshot
                .get(dispatch.index)
                .map_or(true, Task::is_finished);
            if finished {
                return SliceEnd::Stopped {
                    reason: StopReason::Finished,
                    tick: now,
                };
            }
            if now >= self.timeout {
                return SliceEnd::TimedOut { tick: now };
            }
            if dispatch.slice.is_some_and(|q| now - start >= q) {
                return SliceEnd::Stopped {
                    reason: StopReason::SliceExpired,
                    tick: now,
                };
            }
            if !self.policy.continue_task(dispatch.index, &self.snapshot, now) {
                return SliceEnd::Stopped {
                    reason: StopReason::Interrupted,
                    tick: now,
                };
            }
        }
    }
}
