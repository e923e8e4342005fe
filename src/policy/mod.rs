//! Scheduling policies.
//!
//! A policy is a decision function over a consistent snapshot of the task
//! table. The engine ([`crate::engine`]) owns the loop, the waiting and all
//! state changes; a policy only answers three questions:
//!
//! - [`Policy::next`]: which eligible task runs now, and for how long?
//! - [`Policy::result`]: why did the last slice end? (bookkeeping only)
//! - [`Policy::continue_task`]: should the running task keep the server at
//!   this tick? (early preemption; most policies never interrupt)
//!
//! | Policy | Selection | Slice |
//! |--------|-----------|-------|
//! | FCFS | smallest arrival | until finished |
//! | SPN  | smallest total runtime | until finished |
//! | HRRN | highest `1 + wait / total` | until finished |
//! | RR   | next index after the last one run | `quantum` |
//! | SRT  | smallest remaining runtime | `quantum`, or until a shorter task arrives |
//! | FEED | lowest level, then earliest arrival | `quantum`, `2 * quantum`, until finished |
//!
//! Every selection ties on the lowest task index.

mod fcfs;
mod feedback;
mod hrrn;
mod round_robin;
mod spn;
mod srt;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::task::Task;

pub use fcfs::FirstComeFirstServed;
pub use feedback::{Feedback, FEEDBACK_LEVELS};
pub use hrrn::{response_ratio, HighestResponseRatioNext};
pub use round_robin::RoundRobin;
pub use spn::ShortestProcessNext;
pub use srt::ShortestRemainingTime;

/// Default preemption quantum in ticks.
pub const DEFAULT_QUANTUM: u64 = 10;

/// A decision to give the server to one task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dispatch {
    /// Index into the task table.
    pub index: usize,
    /// Maximum ticks before the policy is consulted again; `None` runs the
    /// task until it finishes.
    pub slice: Option<u64>,
}

impl Dispatch {
    pub fn to_completion(index: usize) -> Self {
        Self { index, slice: None }
    }

    pub fn for_ticks(index: usize, ticks: u64) -> Self {
        Self {
            index,
            slice: Some(ticks),
        }
    }
}

/// Why a dispatched task stopped holding the server.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// The task reached its total runtime.
    Finished,
    /// The slice ran out with work remaining.
    SliceExpired,
    /// [`Policy::continue_task`] returned `false`.
    Interrupted,
}

/// Scheduling decision function.
pub trait Policy: Send {
    fn kind(&self) -> PolicyKind;

    /// Choose the task to run at tick `now`, or `None` if no task is eligible.
    ///
    /// Only tasks with `arrival_time <= now` that are not finished may be
    /// returned.
    fn next(&mut self, tasks: &[Task], now: u64) -> Option<Dispatch>;

    /// Told once per dispatch, when its slice ends.
    fn result(&mut self, _index: usize, _reason: StopReason) {}

    /// Checked every tick while `index` runs.
    fn continue_task(&self, _index: usize, _tasks: &[Task], _now: u64) -> bool {
        true
    }
}

/// The six supported policies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PolicyKind {
    Fcfs,
    Spn,
    Rr,
    Hrrn,
    Srt,
    Feed,
}

impl PolicyKind {
    pub const ALL: [PolicyKind; 6] = [
        Self::Fcfs,
        Self::Spn,
        Self::Rr,
        Self::Hrrn,
        Self::Srt,
        Self::Feed,
    ];

    /// CLI token.
    pub fn token(self) -> &'static str {
        match self {
            Self::Fcfs => "FCFS",
            Self::Spn => "SPN",
            Self::Rr => "RR",
            Self::Hrrn => "HRRN",
            Self::Srt => "SRT",
            Self::Feed => "FEED",
        }
    }

    /// Human-readable name for the console banner.
    pub fn description(self) -> &'static str {
        match self {
            Self::Fcfs => "First-Come-First-Served",
            Self::Spn => "Shortest Process Next",
            Self::Rr => "Round Robin",
            Self::Hrrn => "Highest Response Ratio Next",
            Self::Srt => "Shortest Remaining Time",
            Self::Feed => "Feedback",
        }
    }

    /// Whether the policy takes the server away from unfinished tasks.
    pub fn is_preemptive(self) -> bool {
        matches!(self, Self::Rr | Self::Srt | Self::Feed)
    }

    /// Instantiate the policy. `quantum` is ignored by non-preemptive ones.
    pub fn build(self, quantum: u64) -> Box<dyn Policy> {
        match self {
            Self::Fcfs => Box::new(FirstComeFirstServed),
            Self::Spn => Box::new(ShortestProcessNext),
            Self::Rr => Box::new(RoundRobin::new(quantum)),
            Self::Hrrn => Box::new(HighestResponseRatioNext),
            Self::Srt => Box::new(ShortestRemainingTime::new(quantum)),
            Self::Feed => Box::new(Feedback::new(quantum)),
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Token that names no policy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownPolicy(pub String);

impl fmt::Display for UnknownPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown scheduler type '{}' (expected FCFS|SPN|RR|HRRN|SRT|FEED)",
            self.0
        )
    }
}

impl std::error::Error for UnknownPolicy {}

impl FromStr for PolicyKind {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.token() == s)
            .ok_or_else(|| UnknownPolicy(s.to_string()))
    }
}

/// Eligible task with the smallest key at `now`, lowest index on ties.
pub(crate) fn min_eligible_by_key<K: Ord>(
    tasks: &[Task],
    now: u64,
    key: impl Fn(&Task) -> K,
) -> Option<usize> {
    tasks
        .iter()
        .enumerate()
        .filter(|(_, t)| t.is_eligible(now))
        .min_by_key(|(i, t)| (key(t), *i))
        .map(|(i, _)| i)
}
