//! Shortest Process Next.

use super::{min_eligible_by_key, Dispatch, Policy, PolicyKind};
use crate::task::Task;

/// Runs the eligible task with the smallest total runtime to completion.
#[derive(Clone, Copy, Debug, Default)]
pub struct ShortestProcessNext;

impl Policy for ShortestProcessNext {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Spn
    }

    fn next(&mut self, tasks: &[Task], now: u64) -> Option<Dispatch> {
        min_eligible_by_key(tasks, now, |t| t.total_runtime).map(Dispatch::to_completion)
    }
}
