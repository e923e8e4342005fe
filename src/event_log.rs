//! Event log and end-of-run reporter.
//!
//! Two independent sinks:
//!
//! | Sink | Receives |
//! |------|----------|
//! | run log | one line per task transition (and runner start) |
//! | console | engine status lines and the final summary |
//!
//! Every line is formatted into a local buffer and handed to the sink in a
//! single `write_all`, so concurrent producers never split a line. Each
//! transition is also pushed into a bounded [`TraceRing`].

use std::fmt::Write as _;
use std::io;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::output_sink::{NullSink, OutputSink};
use crate::sim::{TraceRing, TransitionEvent, DEFAULT_TRACE_CAPACITY};
use crate::task::Task;

/// Line format of the run log.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// `"<tick>: Task <id>: <old> -> <new>, total time worked: <n>"`
    #[default]
    Text,
    /// One JSON object per line.
    Jsonl,
}

/// Serialized transition log with a console side channel.
pub struct EventLog {
    run_log: Arc<dyn OutputSink>,
    console: Arc<dyn OutputSink>,
    format: LogFormat,
    trace: Mutex<TraceRing>,
}

impl EventLog {
    pub fn new(run_log: Arc<dyn OutputSink>, console: Arc<dyn OutputSink>) -> Self {
        Self {
            run_log,
            console,
            format: LogFormat::Text,
            trace: Mutex::new(TraceRing::new(DEFAULT_TRACE_CAPACITY)),
        }
    }

    /// Log that only records the trace.
    pub fn silent() -> Self {
        Self::new(Arc::new(NullSink), Arc::new(NullSink))
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_trace_capacity(mut self, cap: usize) -> Self {
        self.trace = Mutex::new(TraceRing::new(cap));
        self
    }

    pub fn format(&self) -> LogFormat {
        self.format
    }

    /// Record one transition (or runner start) in the run log and trace.
    pub fn transition(&self, ev: &TransitionEvent) {
        let mut line = Vec::with_capacity(96);
        match self.format {
            LogFormat::Text => {
                let mut s = ev.to_string();
                s.push('\n');
                line.extend_from_slice(s.as_bytes());
            }
            LogFormat::Jsonl => {
                serde_json::to_writer(&mut line, ev).expect("transition event serializes");
                line.push(b'\n');
            }
        }
        // Trace order matches run-log order.
        let mut trace = self.trace.lock().expect("trace mutex poisoned");
        self.run_log.write_all(&line);
        trace.push(*ev);
    }

    /// One console status line.
    pub fn status(&self, msg: &str) {
        let mut line = String::with_capacity(msg.len() + 1);
        line.push_str(msg);
        line.push('\n');
        self.console.write_all(line.as_bytes());
    }

    /// Write the per-task summary to the console in one batch.
    pub fn summary(&self, tasks: &[Task]) {
        let mut out = String::from("Summary of task scheduling\n");
        for task in tasks {
            out.push_str(&summary_line(task));
            out.push('\n');
        }
        self.console.write_all(out.as_bytes());
    }

    /// Transitions retained so far, in log order.
    pub fn trace(&self) -> Vec<TransitionEvent> {
        self.trace.lock().expect("trace mutex poisoned").dump()
    }

    /// Transitions dropped from the trace because it was full.
    pub fn trace_evicted(&self) -> u64 {
        self.trace.lock().expect("trace mutex poisoned").evicted()
    }

    /// Flush both sinks and report the first write error either one hit.
    pub fn flush(&self) -> io::Result<()> {
        self.run_log.flush();
        self.console.flush();
        match self.run_log.take_error() {
            Some(err) => Err(err),
            None => self.console.take_error().map_or(Ok(()), Err),
        }
    }
}

/// One summary line for a task in its final state.
pub fn summary_line(task: &Task) -> String {
    let mut line = String::with_capacity(112);
    let _ = write!(line, "Task with ID {} arrived at time {}, ", task.id, task.arrival_time);
    match task.start_time {
        Some(start) => {
            let _ = write!(line, "started at time {start}");
        }
        None => line.push_str("never started"),
    }
    let _ = write!(
        line,
        " and worked for {} out of {} time units",
        task.current_runtime, task.total_runtime
    );
    line
}
