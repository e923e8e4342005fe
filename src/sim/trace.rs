//! Bounded trace ring of task transitions.
//!
//! Every event written to the run log is also retained here for the oracle
//! and timeline. When the ring is full, the oldest events are evicted first.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::task::TaskState;

/// One task state transition as seen by its runner.
///
/// A runner's start is recorded with `from == to` (the "initiated" line).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionEvent {
    pub tick: u64,
    pub task: u32,
    pub from: TaskState,
    pub to: TaskState,
    /// Work completed at the moment the runner observed the change.
    pub worked: u64,
}

impl TransitionEvent {
    /// Runner start marker.
    pub fn initiated(tick: u64, task: u32, state: TaskState) -> Self {
        Self {
            tick,
            task,
            from: state,
            to: state,
            worked: 0,
        }
    }

    #[inline]
    pub fn is_initiation(&self) -> bool {
        self.from == self.to
    }
}

impl fmt::Display for TransitionEvent {
    /// Run-log line, without the trailing newline.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_initiation() {
            write!(f, "{}: Task {}: initiated in {}", self.tick, self.task, self.to)
        } else {
            write!(
                f,
                "{}: Task {}: {} -> {}, total time worked: {}",
                self.tick, self.task, self.from, self.to, self.worked
            )
        }
    }
}

/// Run-log line that is not a transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseEventError {
    pub line: String,
}

impl fmt::Display for ParseEventError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "not a transition line: {:?}", self.line)
    }
}

impl std::error::Error for ParseEventError {}

impl FromStr for TransitionEvent {
    type Err = ParseEventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseEventError {
            line: s.to_string(),
        };
        let s = s.trim();

        let (tick, rest) = s.split_once(": Task ").ok_or_else(err)?;
        let tick: u64 = tick.trim().parse().map_err(|_| err())?;
        let (task, rest) = rest.split_once(": ").ok_or_else(err)?;
        let task: u32 = task.parse().map_err(|_| err())?;

        if let Some(state) = rest.strip_prefix("initiated in ") {
            let state = state.trim().parse().map_err(|_| err())?;
            return Ok(Self::initiated(tick, task, state));
        }

        let (from, rest) = rest.split_once(" -> ").ok_or_else(err)?;
        let (to, worked) = rest
            .split_once(", total time worked: ")
            .ok_or_else(err)?;
        Ok(Self {
            tick,
            task,
            from: from.parse().map_err(|_| err())?,
            to: to.parse().map_err(|_| err())?,
            worked: worked.trim().parse().map_err(|_| err())?,
        })
    }
}

/// Default number of retained events.
pub const DEFAULT_TRACE_CAPACITY: usize = 64 * 1024;

/// Fixed-capacity ring buffer of transition events.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TraceRing {
    cap: usize,
    buf: VecDeque<TransitionEvent>,
    evicted: u64,
}

impl TraceRing {
    /// Create a trace ring with at least one slot.
    pub fn new(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            cap,
            buf: VecDeque::with_capacity(cap.min(4096)),
            evicted: 0,
        }
    }

    /// Maximum number of events retained.
    #[inline(always)]
    pub fn cap(&self) -> usize {
        self.cap
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Events dropped because the ring was full.
    #[inline(always)]
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    /// Push a new event, evicting the oldest if at capacity.
    #[inline(always)]
    pub fn push(&mut self, ev: TransitionEvent) {
        if self.buf.len() == self.cap {
            self.buf.pop_front();
            self.evicted += 1;
        }
        self.buf.push_back(ev);
    }

    /// Snapshot the ring contents in arrival order.
    pub fn dump(&self) -> Vec<TransitionEvent> {
        self.buf.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_run_log_format() {
        let ev = TransitionEvent {
            tick: 3,
            task: 1,
            from: TaskState::Running,
            to: TaskState::Finished,
            worked: 3,
        };
        assert_eq!(
            ev.to_string(),
            "3: Task 1: running -> finished, total time worked: 3"
        );
        assert_eq!(
            TransitionEvent::initiated(0, 2, TaskState::Idle).to_string(),
            "0: Task 2: initiated in idle"
        );
    }

    #[test]
    fn parses_log_lines_with_trailing_space() {
        let ev: TransitionEvent = "12: Task 4: preempted -> running, total time worked: 7 "
            .parse()
            .unwrap();
        assert_eq!(ev.tick, 12);
        assert_eq!(ev.task, 4);
        assert_eq!(ev.from, TaskState::Preempted);
        assert_eq!(ev.to, TaskState::Running);
        assert_eq!(ev.worked, 7);

        let init: TransitionEvent = "0: Task 9: initiated in idle".parse().unwrap();
        assert!(init.is_initiation());
    }

    #[test]
    fn rejects_status_lines() {
        assert!("Using Round Robin scheduler"
            .parse::<TransitionEvent>()
            .is_err());
        assert!("3: Task 1: running -> bogus, total time worked: 1"
            .parse::<TransitionEvent>()
            .is_err());
    }

    #[test]
    fn ring_evicts_oldest() {
        let mut ring = TraceRing::new(2);
        for tick in 0..3 {
            ring.push(TransitionEvent::initiated(tick, 1, TaskState::Idle));
        }
        let ticks: Vec<u64> = ring.dump().iter().map(|e| e.tick).collect();
        assert_eq!(ticks, vec![1, 2]);
        assert_eq!(ring.evicted(), 1);
    }
}
