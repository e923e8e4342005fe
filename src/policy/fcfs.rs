//! First-Come-First-Served.

use super::{min_eligible_by_key, Dispatch, Policy, PolicyKind};
use crate::task::Task;

/// Runs the earliest-arrived eligible task to completion.
#[derive(Clone, Copy, Debug, Default)]
pub struct FirstComeFirstServed;

impl Policy for FirstComeFirstServed {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Fcfs
    }

    fn next(&mut self, tasks: &[Task], now: u64) -> Option<Dispatch> {
        min_eligible_by_key(tasks, now, |t| t.arrival_time).map(Dispatch::to_completion)
    }
}
