//! Round Robin.

use super::{Dispatch, Policy, PolicyKind, StopReason};
use crate::task::Task;

/// Cycles through tasks in index order, giving each eligible one `quantum`
/// ticks per turn.
#[derive(Clone, Debug)]
pub struct RoundRobin {
    quantum: u64,
    /// Index the next scan starts from.
    cursor: usize,
}

impl RoundRobin {
    pub fn new(quantum: u64) -> Self {
        Self { quantum, cursor: 0 }
    }
}

impl Policy for RoundRobin {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Rr
    }

    fn next(&mut self, tasks: &[Task], now: u64) -> Option<Dispatch> {
        let n = tasks.len();
        (0..n)
            .map(|k| (self.cursor + k) % n)
            .find(|&i| tasks[i].is_eligible(now))
            .map(|i| Dispatch::for_ticks(i, self.quantum))
    }

    fn result(&mut self, index: usize, _reason: StopReason) {
        self.cursor = index + 1;
    }
}
