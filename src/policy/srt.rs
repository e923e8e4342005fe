//! Shortest Remaining Time.

use super::{min_eligible_by_key, Dispatch, Policy, PolicyKind};
use crate::task::Task;

/// Runs the eligible task with the least remaining work.
///
/// The choice is recomputed at the end of every `quantum`. Between
/// boundaries the running task is interrupted as soon as another eligible
/// task has strictly less remaining work; only a new arrival can cause that,
/// since waiting tasks do not progress. Preempted tasks keep their progress.
#[derive(Clone, Debug)]
pub struct ShortestRemainingTime {
    quantum: u64,
}

impl ShortestRemainingTime {
    pub fn new(quantum: u64) -> Self {
        Self { quantum }
    }
}

impl Policy for ShortestRemainingTime {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Srt
    }

    fn next(&mut self, tasks: &[Task], now: u64) -> Option<Dispatch> {
        min_eligible_by_key(tasks, now, Task::remaining).map(|i| Dispatch::for_ticks(i, self.quantum))
    }

    fn continue_task(&self, index: usize, tasks: &[Task], now: u64) -> bool {
        let Some(running) = tasks.get(index) else {
            return false;
        };
        let remaining = running.remaining();
        !tasks
            .iter()
            .enumerate()
            .any(|(i, t)| i != index && t.is_eligible(now) && t.remaining() < remaining)
    }
}
