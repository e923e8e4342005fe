//! Task records and the shared task table.
//!
//! # State machine
//!
//! ```text
//!   idle ──► running ──► finished
//!               │  ▲
//!               ▼  │
//!            preempted
//! ```
//!
//! - `idle` is the only initial state.
//! - Only the policy engine moves a task into `running` or `preempted`
//!   ([`TaskTable::dispatch`], [`TaskTable::preempt`]).
//! - Only the task's runner moves it into `finished`
//!   ([`TaskTable::credit`]), and only once `current_runtime == total_runtime`.
//! - `finished` is terminal.
//!
//! # Locking
//!
//! Every task lives behind one coarse `Mutex` shared by all runners and the
//! engine. Critical sections are a handful of field updates, far shorter
//! than a tick, so contention stays low. The tick lock lives in
//! [`crate::sim::Clock`] and is never held while this one is taken.

use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

/// Externally visible scheduling state of a task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Idle,
    Running,
    Preempted,
    Finished,
}

impl TaskState {
    /// Lowercase name used in the run log.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Preempted => "preempted",
            Self::Finished => "finished",
        }
    }

    /// Whether `self -> to` is an edge of the task state machine.
    pub fn can_transition_to(self, to: TaskState) -> bool {
        matches!(
            (self, to),
            (Self::Idle, Self::Running)
                | (Self::Running, Self::Preempted)
                | (Self::Running, Self::Finished)
                | (Self::Preempted, Self::Running)
        )
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskState {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(Self::Idle),
            "running" => Ok(Self::Running),
            "preempted" => Ok(Self::Preempted),
            "finished" => Ok(Self::Finished),
            _ => Err(()),
        }
    }
}

/// One synthetic task.
///
/// `id`, `arrival_time` and `total_runtime` are fixed at load time. The
/// remaining fields are mutated only through [`TaskTable`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: u32,
    /// First tick at which the task is eligible for selection.
    pub arrival_time: u64,
    /// Ticks of work needed to finish.
    pub total_runtime: u64,
    /// Ticks of work completed so far.
    pub current_runtime: u64,
    /// Tick of the first dispatch; `None` until the task has run.
    pub start_time: Option<u64>,
    pub state: TaskState,
    /// Tick at which `state` last changed.
    pub changed_at: u64,
}

impl Task {
    /// A freshly loaded task: `idle`, no work done, never started.
    pub fn new(id: u32, arrival_time: u64, total_runtime: u64) -> Self {
        Self {
            id,
            arrival_time,
            total_runtime,
            current_runtime: 0,
            start_time: None,
            state: TaskState::Idle,
            changed_at: 0,
        }
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.state == TaskState::Finished
    }

    /// Arrived and not yet finished at tick `now`.
    #[inline]
    pub fn is_eligible(&self, now: u64) -> bool {
        !self.is_finished() && self.arrival_time <= now
    }

    #[inline]
    pub fn remaining(&self) -> u64 {
        self.total_runtime - self.current_runtime
    }
}

/// Illegal state-change request against the task table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransitionError {
    /// Index outside the table.
    UnknownTask { index: usize },
    /// Requested edge is not in the state machine.
    Illegal {
        id: u32,
        from: TaskState,
        to: TaskState,
    },
    /// Task has not arrived yet at the requested tick.
    NotArrived { id: u32, now: u64 },
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownTask { index } => write!(f, "no task at index {index}"),
            Self::Illegal { id, from, to } => {
                write!(f, "task {id}: illegal transition {from} -> {to}")
            }
            Self::NotArrived { id, now } => {
                write!(f, "task {id}: not arrived at tick {now}")
            }
        }
    }
}

impl std::error::Error for TransitionError {}

/// Result of one runner step against its task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Credit {
    /// State change made by the engine since the runner last looked,
    /// as `(changed_at, old, new, runtime_at_observation)`.
    pub observed: Option<(u64, TaskState, TaskState, u64)>,
    /// Ticks of work credited in this step.
    pub credited: u64,
    /// Tick at which this step's work completed the task.
    pub finished_at: Option<u64>,
    pub current_runtime: u64,
}

/// Shared task collection.
///
/// Owned jointly (behind an `Arc`) by the runners and the engine for the
/// duration of one run. Indices are positions in load order.
#[derive(Debug)]
pub struct TaskTable {
    tasks: Mutex<Vec<Task>>,
}

impl TaskTable {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self {
            tasks: Mutex::new(tasks),
        }
    }

    #[inline]
    fn lock(&self) -> MutexGuard<'_, Vec<Task>> {
        self.tasks.lock().expect("task table mutex poisoned")
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consistent copy of every task.
    pub fn snapshot(&self) -> Vec<Task> {
        self.lock().clone()
    }

    /// Refresh `out` in place, reusing its allocation.
    pub fn snapshot_into(&self, out: &mut Vec<Task>) {
        let tasks = self.lock();
        out.clear();
        out.extend(tasks.iter().cloned());
    }

    pub fn get(&self, index: usize) -> Option<Task> {
        self.lock().get(index).cloned()
    }

    /// Make `index` the single running task at tick `now`.
    ///
    /// Any other running task is preempted under the same lock acquisition,
    /// so no observer can ever see two running tasks. Sets `start_time` on
    /// the first dispatch only. Returns the index that was preempted, if any.
    pub fn dispatch(&self, index: usize, now: u64) -> Result<Option<usize>, TransitionError> {
        let mut tasks = self.lock();
        let task = tasks
            .get(index)
            .ok_or(TransitionError::UnknownTask { index })?;
        if task.state == TaskState::Running {
            return Ok(None);
        }
        if !task.state.can_transition_to(TaskState::Running) {
            return Err(TransitionError::Illegal {
                id: task.id,
                from: task.state,
                to: TaskState::Running,
            });
        }
        if task.arrival_time > now {
            return Err(TransitionError::NotArrived { id: task.id, now });
        }

        let mut preempted = None;
        for (i, other) in tasks.iter_mut().enumerate() {
            if i != index && other.state == TaskState::Running {
                other.state = TaskState::Preempted;
                other.changed_at = now;
                preempted = Some(i);
            }
        }

        let task = &mut tasks[index];
        task.state = TaskState::Running;
        task.changed_at = now;
        if task.start_time.is_none() {
            task.start_time = Some(now);
        }
        Ok(preempted)
    }

    /// Move a running task to `preempted` at tick `now`.
    ///
    /// Returns `Ok(false)` if the runner finished the task first.
    pub fn preempt(&self, index: usize, now: u64) -> Result<bool, TransitionError> {
        let mut tasks = self.lock();
        let task = tasks
            .get_mut(index)
            .ok_or(TransitionError::UnknownTask { index })?;
        match task.state {
            TaskState::Running => {
                task.state = TaskState::Preempted;
                task.changed_at = now;
                Ok(true)
            }
            TaskState::Finished => Ok(false),
            from => Err(TransitionError::Illegal {
                id: task.id,
                from,
                to: TaskState::Preempted,
            }),
        }
    }

    /// Runner-side step at `tick`: report any state change since the runner
    /// last looked (at `seen_tick`, in `last_seen`), then credit the ticks
    /// the task has been running since then.
    ///
    /// Work is counted from the later of `seen_tick` and the dispatch tick,
    /// so ticks that passed before a dispatch are never credited. Finishing
    /// is the only transition made here; it is stamped with the tick the
    /// last unit of work completed, which is earlier than `tick` when the
    /// runner woke late.
    pub fn credit(
        &self,
        index: usize,
        last_seen: TaskState,
        seen_tick: u64,
        tick: u64,
    ) -> Result<Credit, TransitionError> {
        let mut tasks = self.lock();
        let task = tasks
            .get_mut(index)
            .ok_or(TransitionError::UnknownTask { index })?;

        let observed = (task.state != last_seen).then_some((
            task.changed_at,
            last_seen,
            task.state,
            task.current_runtime,
        ));

        let mut credited = 0;
        let mut finished_at = None;
        if task.state == TaskState::Running {
            let from = seen_tick.max(task.changed_at);
            credited = tick.saturating_sub(from).min(task.remaining());
            task.current_runtime += credited;
            if task.current_runtime == task.total_runtime {
                let at = from + credited;
                task.state = TaskState::Finished;
                task.changed_at = at;
                finished_at = Some(at);
            }
        }

        Ok(Credit {
            observed,
            credited,
            finished_at,
            current_runtime: task.current_runtime,
        })
    }

    /// Number of tasks in `finished`.
    pub fn finished_count(&self) -> usize {
        self.lock().iter().filter(|t| t.is_finished()).count()
    }

    /// Consume the table, returning the final task records.
    pub fn into_tasks(self) -> Vec<Task> {
        self.tasks
            .into_inner()
            .expect("task table mutex poisoned")
    }
}
