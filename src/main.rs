//! Scheduling simulator CLI.
//!
//! Loads a task file, runs it under the chosen policy with one thread per
//! task, writes one line per state transition to the run log and prints a
//! per-task summary to stdout. With `--chart-log` it instead charts a run
//! log saved by an earlier run.
//!
//! Run statistics are written to stderr upon completion:
//! `policy=P outcome=O end_tick=N finished=N/M context_switches=N idle_ticks=N elapsed_ms=N`
//!
//! # Exit Codes
//!
//! - `0`: run completed (including a timeout with unfinished tasks)
//! - `1`: setup or output failure (log file, thread creation, report)
//! - `2`: invalid arguments, task file or saved run log
//! - `3`: `--check` found invariant violations

use std::env;
use std::fs;
use std::sync::Arc;
use std::time::Instant;

use sched_sim::cli::{self, CliArgs};
use sched_sim::error::{ConfigError, SetupError, SimError};
use sched_sim::oracle::check_run;
use sched_sim::output_sink::{FileSink, OutputSink, StdoutSink};
use sched_sim::timeline::Timeline;
use sched_sim::{load_tasks, EngineOutcome, RunReport, Simulation};

fn fail(err: SimError) -> ! {
    eprintln!("error: {err}");
    std::process::exit(err.exit_code());
}

fn parse_cli() -> CliArgs {
    let mut args = env::args_os();
    let exe = args
        .next()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "sched-sim".to_string());
    match cli::parse_args(args) {
        Ok(args) => args,
        Err(ConfigError::HelpRequested) => {
            print!("{}", cli::usage(&exe));
            std::process::exit(0);
        }
        Err(err) => {
            eprintln!("error: {err}");
            eprintln!();
            eprint!("{}", cli::usage(&exe));
            std::process::exit(2);
        }
    }
}

fn print_timeline(report: &RunReport, console: &dyn OutputSink) {
    let end = report
        .outcome
        .tick()
        .or_else(|| report.events.iter().map(|e| e.tick).max())
        .unwrap_or(0);
    let chart = Timeline::new(&report.tasks, &report.events, end).render();
    console.write_all(chart.as_bytes());
    console.flush();
    if let Some(err) = console.take_error() {
        fail(SimError::Output(err));
    }
}

fn chart_saved_log(args: &CliArgs) {
    let tasks = load_tasks(&args.tasks_path).unwrap_or_else(|e| fail(e.into()));
    let path = args.log_path.display();
    let text = fs::read_to_string(&args.log_path).unwrap_or_else(|e| {
        eprintln!("error: cannot read run log {path}: {e}");
        std::process::exit(2);
    });
    let chart = Timeline::from_log(&tasks, &text).unwrap_or_else(|e| {
        eprintln!("error: {path}: {e}");
        std::process::exit(2);
    });

    let console = StdoutSink::new();
    console.write_all(chart.render().as_bytes());
    console.flush();
    if let Some(err) = console.take_error() {
        fail(SimError::Output(err));
    }
}

fn check(report: &RunReport) -> bool {
    if report.events_evicted > 0 {
        eprintln!(
            "check skipped: {} transitions were evicted from the trace (raise --trace-capacity)",
            report.events_evicted
        );
        return true;
    }
    let violations = check_run(&report.events, &report.tasks);
    for v in &violations {
        eprintln!("violation: {v}");
    }
    violations.is_empty()
}

fn main() {
    let args = parse_cli();
    if args.chart_log {
        chart_saved_log(&args);
        return;
    }

    let tasks = load_tasks(&args.tasks_path).unwrap_or_else(|e| fail(e.into()));

    let run_log = FileSink::create(&args.log_path).unwrap_or_else(|source| {
        fail(
            SetupError::LogFile {
                path: args.log_path.clone(),
                source,
            }
            .into(),
        )
    });
    let console: Arc<dyn OutputSink> = Arc::new(StdoutSink::new());
    let log = Arc::new(args.config.event_log(Arc::new(run_log), Arc::clone(&console)));

    let start = Instant::now();
    let report = Simulation::new(args.config.clone(), tasks, log)
        .run()
        .unwrap_or_else(|e| fail(e));
    let elapsed = start.elapsed();

    if args.timeline {
        print_timeline(&report, console.as_ref());
    }

    if let Some(path) = &args.report {
        let written = report
            .to_json_pretty()
            .map_err(|e| e.to_string())
            .and_then(|json| fs::write(path, json).map_err(|e| e.to_string()));
        if let Err(err) = written {
            eprintln!("error: cannot write report {}: {err}", path.display());
            std::process::exit(1);
        }
    }

    let outcome = match report.outcome {
        EngineOutcome::AllFinished { .. } => "all_finished",
        EngineOutcome::TimedOut { .. } => "timed_out",
        EngineOutcome::Cancelled => "cancelled",
    };
    eprintln!(
        "policy={} outcome={} end_tick={} finished={}/{} context_switches={} idle_ticks={} elapsed_ms={}",
        report.policy,
        outcome,
        report.outcome.tick().unwrap_or(0),
        report.tasks.iter().filter(|t| t.is_finished()).count(),
        report.tasks.len(),
        report.stats.context_switches,
        report.stats.idle_ticks,
        elapsed.as_millis(),
    );

    if args.check && !check(&report) {
        std::process::exit(3);
    }
}
