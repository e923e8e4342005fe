//! Invariant oracle over a recorded run.
//!
//! Replays the transition trace task by task and checks it against the
//! final task records:
//!
//! - every transition is an edge of the state machine, starting from `idle`;
//! - `worked` never decreases and never exceeds the total runtime;
//! - work grows by exactly the ticks spent `running`, and not at all otherwise;
//! - nothing follows `finished`, and a task is `finished` iff its work is done;
//! - `start_time` matches the first dispatch seen in the trace;
//! - no two tasks are `running` during the same tick.
//!
//! The checks hold for both tick modes. The engine decides only after every
//! runner has acknowledged the current tick, so no runner can miss an engine
//! change, and a runner that wakes late stamps its finish at the tick the
//! work ran out.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::sim::TransitionEvent;
use crate::task::{Task, TaskState};

/// Which invariant a [`Violation`] breaks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Event for an id that is not in the task set.
    UnknownTask,
    IllegalTransition,
    WorkRegressed,
    WorkExceedsTotal,
    /// Work changed by something other than the ticks spent running.
    WorkMismatch,
    EventAfterFinish,
    /// `finished` state and completed work disagree.
    FinishMismatch,
    StartTimeMismatch,
    /// Two running intervals overlap.
    ConcurrentRunning,
}

/// One broken invariant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub task: Option<u32>,
    pub tick: Option<u64>,
    pub message: String,
}

impl Violation {
    fn new(kind: ViolationKind, task: u32, tick: Option<u64>, message: String) -> Self {
        Self {
            kind,
            task: Some(task),
            tick,
            message,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(task) = self.task {
            write!(f, " task {task}")?;
        }
        if let Some(tick) = self.tick {
            write!(f, " at tick {tick}")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Half-open `[start, end)` interval a task held the server.
#[derive(Clone, Copy, Debug)]
struct Interval {
    task: u32,
    start: u64,
    end: u64,
}

/// Check a complete trace against the final task records.
///
/// Returns every violation found, in task-id order, followed by any overlap
/// of running intervals. An empty result means the run is consistent.
pub fn check_run(events: &[TransitionEvent], tasks: &[Task]) -> Vec<Violation> {
    let mut violations = Vec::new();

    let mut per_task: BTreeMap<u32, Vec<&TransitionEvent>> =
        tasks.iter().map(|t| (t.id, Vec::new())).collect();
    for ev in events {
        match per_task.get_mut(&ev.task) {
            Some(list) => list.push(ev),
            None => violations.push(Violation::new(
                ViolationKind::UnknownTask,
                ev.task,
                Some(ev.tick),
                format!("event '{ev}' for unknown task"),
            )),
        }
    }

    let mut intervals = Vec::new();
    for task in tasks {
        let history = per_task.get(&task.id).map(Vec::as_slice).unwrap_or(&[]);
        check_task(task, history, &mut intervals, &mut violations);
    }
    check_single_server(intervals, &mut violations);
    violations
}

fn check_task(
    task: &Task,
    history: &[&TransitionEvent],
    intervals: &mut Vec<Interval>,
    out: &mut Vec<Violation>,
) {
    let id = task.id;

    if task.current_runtime > task.total_runtime {
        out.push(Violation::new(
            ViolationKind::WorkExceedsTotal,
            id,
            None,
            format!(
                "final work {} exceeds total {}",
                task.current_runtime, task.total_runtime
            ),
        ));
    }
    if task.is_finished() != (task.current_runtime == task.total_runtime) {
        out.push(Violation::new(
            ViolationKind::FinishMismatch,
            id,
            None,
            format!(
                "final state {} with {} of {} worked",
                task.state, task.current_runtime, task.total_runtime
            ),
        ));
    }

    let mut state = TaskState::Idle;
    let mut worked = 0u64;
    // (tick, worked) when the current running interval began.
    let mut running_since: Option<(u64, u64)> = None;
    let mut first_dispatch: Option<u64> = None;

    for ev in history {
        if ev.is_initiation() {
            continue;
        }
        if state == TaskState::Finished {
            out.push(Violation::new(
                ViolationKind::EventAfterFinish,
                id,
                Some(ev.tick),
                format!("'{ev}' after finishing"),
            ));
            continue;
        }
        if ev.from != state || !ev.from.can_transition_to(ev.to) {
            out.push(Violation::new(
                ViolationKind::IllegalTransition,
                id,
                Some(ev.tick),
                format!("'{ev}' while {state}"),
            ));
        }
        if ev.worked < worked {
            out.push(Violation::new(
                ViolationKind::WorkRegressed,
                id,
                Some(ev.tick),
                format!("work went from {worked} to {}", ev.worked),
            ));
        }
        if ev.worked > task.total_runtime {
            out.push(Violation::new(
                ViolationKind::WorkExceedsTotal,
                id,
                Some(ev.tick),
                format!("work {} exceeds total {}", ev.worked, task.total_runtime),
            ));
        }

        match (running_since.take(), ev.to) {
            (Some((start, start_worked)), _) => {
                let ran = ev.tick.saturating_sub(start);
                if ev.worked.saturating_sub(start_worked) != ran {
                    out.push(Violation::new(
                        ViolationKind::WorkMismatch,
                        id,
                        Some(ev.tick),
                        format!(
                            "ran {ran} ticks from {start} but work went {start_worked} -> {}",
                            ev.worked
                        ),
                    ));
                }
                intervals.push(Interval {
                    task: id,
                    start,
                    end: ev.tick,
                });
            }
            (None, _) if ev.worked != worked => {
                out.push(Violation::new(
                    ViolationKind::WorkMismatch,
                    id,
                    Some(ev.tick),
                    format!("work changed {worked} -> {} while not running", ev.worked),
                ));
            }
            (None, _) => {}
        }
        if ev.to == TaskState::Running {
            running_since = Some((ev.tick, ev.worked));
            first_dispatch.get_or_insert(ev.tick);
        }
        if ev.to == TaskState::Finished && ev.worked != task.total_runtime {
            out.push(Violation::new(
                ViolationKind::FinishMismatch,
                id,
                Some(ev.tick),
                format!("finished with {} of {} worked", ev.worked, task.total_runtime),
            ));
        }

        state = ev.to;
        worked = ev.worked;
    }

    if let Some((start, _)) = running_since {
        intervals.push(Interval {
            task: id,
            start,
            end: u64::MAX,
        });
    }

    if let Some(first) = first_dispatch {
        if task.start_time != Some(first) {
            out.push(Violation::new(
                ViolationKind::StartTimeMismatch,
                id,
                Some(first),
                format!("first dispatch at {first} but start_time is {:?}", task.start_time),
            ));
        }
    }
    if task.start_time.is_none() && task.current_runtime > 0 {
        out.push(Violation::new(
            ViolationKind::StartTimeMismatch,
            id,
            None,
            format!("worked {} without ever starting", task.current_runtime),
        ));
    }
}

fn check_single_server(mut intervals: Vec<Interval>, out: &mut Vec<Violation>) {
    intervals.retain(|iv| iv.end > iv.start);
    intervals.sort_by_key(|iv| (iv.start, iv.task));
    let mut holder: Option<Interval> = None;
    for iv in intervals {
        match holder {
            Some(prev) if iv.start < prev.end => {
                out.push(Violation {
                    kind: ViolationKind::ConcurrentRunning,
                    task: Some(iv.task),
                    tick: Some(iv.start),
                    message: format!(
                        "running while task {} holds the server ({}..{})",
                        prev.task,
                        prev.start,
                        if prev.end == u64::MAX {
                            "end".to_string()
                        } else {
                            prev.end.to_string()
                        }
                    ),
                });
                if iv.end > prev.end {
                    holder = Some(iv);
                }
            }
            _ => holder = Some(iv),
        }
    }
}
