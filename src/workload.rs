//! Seeded random task sets.
//!
//! Used by the `gen_tasks` binary, the property tests and the benchmarks.
//! The same seed and shape always produce the same tasks.

use std::io::{self, Write};

use crate::sim::SimRng;
use crate::task::Task;

/// Shape of a generated task set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkloadShape {
    pub count: u32,
    /// Arrivals are drawn from `0..=max_arrival`.
    pub max_arrival: u64,
    /// Runtimes are drawn from `min_runtime..=max_runtime` (`min_runtime >= 1`).
    pub min_runtime: u64,
    pub max_runtime: u64,
}

impl Default for WorkloadShape {
    fn default() -> Self {
        Self {
            count: 10,
            max_arrival: 30,
            min_runtime: 1,
            max_runtime: 20,
        }
    }
}

/// Generate `shape.count` tasks with ids `1..=count`, sorted by id.
///
/// Degenerate ranges are clamped: `min_runtime` is at least 1 and
/// `max_runtime` at least `min_runtime`.
pub fn random_tasks(seed: u64, shape: &WorkloadShape) -> Vec<Task> {
    let mut rng = SimRng::new(seed);
    let min_runtime = shape.min_runtime.max(1);
    let max_runtime = shape.max_runtime.max(min_runtime);
    (1..=shape.count)
        .map(|id| {
            let arrival = rng.gen_inclusive(0, shape.max_arrival);
            let runtime = rng.gen_inclusive(min_runtime, max_runtime);
            Task::new(id, arrival, runtime)
        })
        .collect()
}

/// Write tasks in the task-file format, with a header comment.
pub fn write_task_file<W: Write>(out: &mut W, tasks: &[Task]) -> io::Result<()> {
    writeln!(out, "# id arrival runtime")?;
    for task in tasks {
        writeln!(out, "{} {} {}", task.id, task.arrival_time, task.total_runtime)?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse_tasks;

    #[test]
    fn deterministic_per_seed() {
        let shape = WorkloadShape::default();
        assert_eq!(random_tasks(42, &shape), random_tasks(42, &shape));
        assert_ne!(random_tasks(42, &shape), random_tasks(43, &shape));
    }

    #[test]
    fn respects_bounds() {
        let shape = WorkloadShape {
            count: 200,
            max_arrival: 5,
            min_runtime: 2,
            max_runtime: 4,
        };
        for t in random_tasks(7, &shape) {
            assert!(t.arrival_time <= 5);
            assert!((2..=4).contains(&t.total_runtime));
        }
    }

    #[test]
    fn written_file_loads_back() {
        let tasks = random_tasks(3, &WorkloadShape::default());
        let mut buf = Vec::new();
        write_task_file(&mut buf, &tasks).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(parse_tasks(&text).unwrap(), tasks);
    }
}
