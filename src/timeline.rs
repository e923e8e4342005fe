//! Per-task state chart over ticks.
//!
//! One row per task, one column per tick:
//!
//! | Cell | Meaning |
//! |------|---------|
//! | ` `  | not arrived yet, or finished |
//! | `.`  | arrived and waiting (`idle` or `preempted`) |
//! | `#`  | `running` |
//!
//! A transition stamped at tick `t` takes effect in column `t`. The chart
//! can be built from a live trace or from a saved run log plus the task
//! file (arrival times are not in the log).

use std::fmt::Write as _;

use crate::sim::{ParseEventError, TransitionEvent};
use crate::task::{Task, TaskState};

const RUNNING: u8 = b'#';
const WAITING: u8 = b'.';
const ABSENT: u8 = b' ';

#[derive(Clone, Debug, PartialEq, Eq)]
struct Row {
    id: u32,
    cells: Vec<u8>,
}

/// Rendered-on-demand state chart.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Timeline {
    /// Number of columns (ticks `0..end`).
    end: u64,
    rows: Vec<Row>,
}

impl Timeline {
    /// Chart `tasks` over ticks `0..end` using `events`.
    ///
    /// Events for ids not in `tasks` are ignored.
    pub fn new(tasks: &[Task], events: &[TransitionEvent], end: u64) -> Self {
        let width = usize::try_from(end).unwrap_or(usize::MAX);
        let rows = tasks
            .iter()
            .map(|task| {
                let mut history: Vec<&TransitionEvent> = events
                    .iter()
                    .filter(|e| e.task == task.id && !e.is_initiation())
                    .collect();
                history.sort_by_key(|e| e.tick);

                let mut cells = Vec::with_capacity(width);
                let mut state = TaskState::Idle;
                let mut next = history.iter().peekable();
                for tick in 0..end {
                    while let Some(ev) = next.next_if(|e| e.tick <= tick) {
                        state = ev.to;
                    }
                    cells.push(match state {
                        _ if tick < task.arrival_time => ABSENT,
                        TaskState::Finished => ABSENT,
                        TaskState::Running => RUNNING,
                        TaskState::Idle | TaskState::Preempted => WAITING,
                    });
                }
                Row { id: task.id, cells }
            })
            .collect();
        Self { end, rows }
    }

    /// Chart a saved run log.
    ///
    /// The chart ends at the last logged tick.
    pub fn from_log(tasks: &[Task], log: &str) -> Result<Self, ParseEventError> {
        let events = parse_log(log)?;
        let end = events.iter().map(|e| e.tick).max().unwrap_or(0);
        Ok(Self::new(tasks, &events, end))
    }

    pub fn width(&self) -> u64 {
        self.end
    }

    /// Row for task `id` as a string of cells.
    pub fn row(&self, id: u32) -> Option<String> {
        self.rows
            .iter()
            .find(|r| r.id == id)
            .map(|r| String::from_utf8_lossy(&r.cells).into_owned())
    }

    /// Render the chart with a tick ruler (tens digit every ten ticks).
    pub fn render(&self) -> String {
        let label_width = self
            .rows
            .iter()
            .map(|r| format!("Task {}", r.id).len())
            .max()
            .unwrap_or(4);

        let mut out = String::new();
        let _ = write!(out, "{:label_width$} |", "tick");
        for tick in 0..self.end {
            out.push(if tick % 10 == 0 {
                char::from(b'0' + (tick / 10 % 10) as u8)
            } else {
                ' '
            });
        }
        out.push_str("|\n");

        for row in &self.rows {
            let label = format!("Task {}", row.id);
            let _ = write!(out, "{label:label_width$} |");
            out.push_str(&String::from_utf8_lossy(&row.cells));
            out.push_str("|\n");
        }
        out
    }
}

/// Parse run-log text in either line format.
///
/// Blank lines are skipped. Lines starting with `{` are read as JSON.
pub fn parse_log(text: &str) -> Result<Vec<TransitionEvent>, ParseEventError> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            if line.starts_with('{') {
                serde_json::from_str(line).map_err(|_| ParseEventError {
                    line: line.to_string(),
                })
            } else {
                line.parse()
            }
        })
        .collect()
}
