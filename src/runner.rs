//! Task runner: one thread per task.
//!
//! Each new tick the runner:
//!
//! 1. reports any state change the engine made since its last look
//!    (stamped with the tick the engine made it),
//! 2. credits one tick of work per tick the task has been `running` since,
//! 3. moves the task to `finished` when the work is done, stamped with the
//!    tick the work ran out,
//! 4. acknowledges the tick so the engine may decide.
//!
//! A runner blocks on the clock's broadcast between ticks; it never polls.
//! If the driver moved more than one tick while the runner was descheduled,
//! every missed tick is still credited (clamped to the remaining work), so
//! ticks are neither lost nor counted twice.

use std::sync::Arc;

use crate::event_log::EventLog;
use crate::sim::{Clock, TransitionEvent};
use crate::task::{TaskState, TaskTable, TransitionError};

/// Why a runner returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunnerExit {
    /// The task reached its total runtime at `tick`.
    Finished { tick: u64 },
    /// The clock was closed first.
    Cancelled,
}

/// Drives a single task's progress.
pub struct TaskRunner {
    index: usize,
    id: u32,
    /// Task state as of registration; the starting point for change reports.
    initial: TaskState,
    /// Tick the runner was registered at; its first observation is after it.
    start_tick: u64,
    tasks: Arc<TaskTable>,
    clock: Arc<Clock>,
    log: Arc<EventLog>,
}

impl TaskRunner {
    /// Register a runner for `tasks[index]` with `clock` and log its
    /// initiation line.
    ///
    /// Registration happens on the calling thread, before the driver and
    /// engine start, so the captured state is the loader's `idle` and no
    /// engine change can precede the initiation line.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::UnknownTask`] if `index` is out of range.
    pub fn register(
        index: usize,
        tasks: Arc<TaskTable>,
        clock: Arc<Clock>,
        log: Arc<EventLog>,
    ) -> Result<Self, TransitionError> {
        let task = tasks
            .get(index)
            .ok_or(TransitionError::UnknownTask { index })?;
        let start_tick = clock.register_runner();
        log.transition(&TransitionEvent::initiated(start_tick, task.id, task.state));
        Ok(Self {
            index,
            id: task.id,
            initial: task.state,
            start_tick,
            tasks,
            clock,
            log,
        })
    }

    /// Run until the task finishes or the clock closes.
    pub fn run(self) -> RunnerExit {
        let id = self.id;
        let mut observed = self.initial;
        let mut seen = self.start_tick;

        loop {
            let Some(tick) = self.clock.wait_tick_after(seen) else {
                self.clock.retire_runner();
                return RunnerExit::Cancelled;
            };
            let credit = match self.tasks.credit(self.index, observed, seen, tick) {
                Ok(credit) => credit,
                Err(e) => {
                    eprintln!("runner for task {id}: {e}");
                    self.clock.retire_runner();
                    return RunnerExit::Cancelled;
                }
            };

            seen = tick;

            if let Some((changed_at, from, to, worked)) = credit.observed {
                self.log.transition(&TransitionEvent {
                    tick: changed_at,
                    task: id,
                    from,
                    to,
                    worked,
                });
                observed = to;
            }

            if let Some(at) = credit.finished_at {
                self.log.transition(&TransitionEvent {
                    tick: at,
                    task: id,
                    from: TaskState::Running,
                    to: TaskState::Finished,
                    worked: credit.current_runtime,
                });
                self.clock.ack_tick(tick, true);
                return RunnerExit::Finished { tick: at };
            }

            self.clock.ack_tick(tick, false);
        }
    }
}
