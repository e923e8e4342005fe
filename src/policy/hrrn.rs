//! Highest Response Ratio Next.

use super::{Dispatch, Policy, PolicyKind};
use crate::task::Task;

/// `1 + (now - arrival) / total_runtime`.
///
/// Grows with waiting time, so long tasks cannot starve behind a stream of
/// short ones.
pub fn response_ratio(task: &Task, now: u64) -> f64 {
    let waited = now.saturating_sub(task.arrival_time) as f64;
    1.0 + waited / task.total_runtime as f64
}

/// Runs the eligible task with the highest response ratio to completion.
///
/// Ratios are recomputed at every decision.
#[derive(Clone, Copy, Debug, Default)]
pub struct HighestResponseRatioNext;

impl Policy for HighestResponseRatioNext {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Hrrn
    }

    fn next(&mut self, tasks: &[Task], now: u64) -> Option<Dispatch> {
        let mut best: Option<(usize, f64)> = None;
        for (i, task) in tasks.iter().enumerate() {
            if !task.is_eligible(now) {
                continue;
            }
            let ratio = response_ratio(task, now);
            if best.map_or(true, |(_, r)| ratio > r) {
                best = Some((i, ratio));
            }
        }
        best.map(|(i, _)| Dispatch::to_completion(i))
    }
}
