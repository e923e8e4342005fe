//! Multi-level feedback queue.
//!
//! Three levels. Every task starts at level 0 and drops one level each time
//! its slice expires with work left, stopping at the last level.
//!
//! | Level | Slice |
//! |-------|-------|
//! | 0 | `quantum` |
//! | 1 | `2 * quantum` |
//! | 2 | until finished |
//!
//! Selection is strictly by `(level, arrival_time, index)`.

use super::{Dispatch, Policy, PolicyKind, StopReason};
use crate::task::Task;

/// Number of priority levels.
pub const FEEDBACK_LEVELS: u8 = 3;

const BOTTOM: u8 = FEEDBACK_LEVELS - 1;

#[derive(Clone, Debug)]
pub struct Feedback {
    quantum: u64,
    /// Level per task index, grown lazily to the table size.
    levels: Vec<u8>,
}

impl Feedback {
    pub fn new(quantum: u64) -> Self {
        Self {
            quantum,
            levels: Vec::new(),
        }
    }

    /// Current level of `index` (0 is highest priority).
    pub fn level(&self, index: usize) -> u8 {
        self.levels.get(index).copied().unwrap_or(0)
    }

    fn slice_for(&self, level: u8) -> Option<u64> {
        match level {
            0 => Some(self.quantum),
            1 => Some(self.quantum.saturating_mul(2)),
            _ => None,
        }
    }
}

impl Policy for Feedback {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Feed
    }

    fn next(&mut self, tasks: &[Task], now: u64) -> Option<Dispatch> {
        if self.levels.len() < tasks.len() {
            self.levels.resize(tasks.len(), 0);
        }
        let index = tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_eligible(now))
            .min_by_key(|(i, t)| (self.levels[*i], t.arrival_time, *i))
            .map(|(i, _)| i)?;
        Some(Dispatch {
            index,
            slice: self.slice_for(self.levels[index]),
        })
    }

    fn result(&mut self, index: usize, reason: StopReason) {
        if reason == StopReason::SliceExpired {
            if let Some(level) = self.levels.get_mut(index) {
                *level = (*level + 1).min(BOTTOM);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::test_support::tasks;

    #[test]
    fn demotes_to_floor_and_stays() {
        let ts = tasks(&[(1, 0, 100)]);
        let mut fb = Feedback::new(2);

        assert_eq!(fb.next(&ts, 0), Some(Dispatch::for_ticks(0, 2)));
        fb.result(0, StopReason::SliceExpired);
        assert_eq!(fb.level(0), 1);
        assert_eq!(fb.next(&ts, 2), Some(Dispatch::for_ticks(0, 4)));
        fb.result(0, StopReason::SliceExpired);
        assert_eq!(fb.level(0), 2);
        assert_eq!(fb.next(&ts, 6), Some(Dispatch::to_completion(0)));

        // Already at the floor.
        fb.result(0, StopReason::SliceExpired);
        assert_eq!(fb.level(0), 2);
    }

    #[test]
    fn higher_level_beats_earlier_arrival() {
        let ts = tasks(&[(1, 0, 10), (2, 5, 10)]);
        let mut fb = Feedback::new(1);
        fb.next(&ts, 0);
        fb.result(0, StopReason::SliceExpired);
        // Task 1 is at level 1, task 2 (later arrival) still at level 0.
        assert_eq!(fb.next(&ts, 5).map(|d| d.index), Some(1));
    }

    #[test]
    fn same_level_orders_by_arrival_then_index() {
        let ts = tasks(&[(1, 3, 10), (2, 1, 10), (3, 1, 10)]);
        let mut fb = Feedback::new(1);
        assert_eq!(fb.next(&ts, 3).map(|d| d.index), Some(1));
    }

    #[test]
    fn interrupted_or_finished_does_not_demote() {
        let ts = tasks(&[(1, 0, 10)]);
        let mut fb = Feedback::new(1);
        fb.next(&ts, 0);
        fb.result(0, StopReason::Finished);
        fb.result(0, StopReason::Interrupted);
        assert_eq!(fb.level(0), 0);
    }
}
