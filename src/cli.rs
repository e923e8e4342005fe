//! Command-line parser for `sched-sim`.
//!
//! Hand-rolled (no clap dependency), `--flag=value` style.
//!
//! # Grammar
//!
//! ```text
//! sched-sim <FCFS|SPN|RR|HRRN|SRT|FEED> [OPTIONS]
//! sched-sim --help | -h
//! ```
//!
//! Parsing returns a [`ConfigError`] instead of exiting so the caller
//! decides the exit status; every error is raised before any thread exists.

use std::ffi::OsString;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::event_log::LogFormat;
use crate::policy::PolicyKind;
use crate::sim::TickMode;
use crate::simulation::SimConfig;

/// Default task file, relative to the working directory.
pub const DEFAULT_TASKS_PATH: &str = "tasks.txt";

/// Everything the binary needs from the command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CliArgs {
    pub config: SimConfig,
    pub tasks_path: PathBuf,
    pub log_path: PathBuf,
    /// Print a timeline chart after the summary.
    pub timeline: bool,
    /// Verify run invariants; violations exit with status 3.
    pub check: bool,
    /// Write a JSON run report here.
    pub report: Option<PathBuf>,
    /// Chart the saved run log at `log_path` instead of running.
    pub chart_log: bool,
}

/// Default run-log path for a policy: `log_<POLICY>.txt`.
pub fn default_log_path(policy: PolicyKind) -> PathBuf {
    PathBuf::from(format!("log_{}.txt", policy.token()))
}

/// Parse arguments (without the executable name).
pub fn parse_args<I, S>(args: I) -> Result<CliArgs, ConfigError>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    let mut policy: Option<PolicyKind> = None;
    let mut tasks_path: Option<PathBuf> = None;
    let mut log_path: Option<PathBuf> = None;
    let mut quantum: Option<u64> = None;
    let mut timeout: Option<u64> = None;
    let mut tick_us: Option<u64> = None;
    let mut lockstep = false;
    let mut startup_delay_ms: u64 = 0;
    let mut log_format = LogFormat::Text;
    let mut trace_capacity: Option<usize> = None;
    let mut timeline = false;
    let mut check = false;
    let mut chart_log = false;
    let mut report: Option<PathBuf> = None;

    for arg in args {
        let arg: OsString = arg.into();
        let Some(flag) = arg.to_str() else {
            return Err(ConfigError::UnexpectedArgument(
                arg.to_string_lossy().into_owned(),
            ));
        };

        if let Some(rest) = flag.strip_prefix("--tasks=") {
            tasks_path = Some(PathBuf::from(rest));
            continue;
        }
        if let Some(rest) = flag.strip_prefix("--log=") {
            log_path = Some(PathBuf::from(rest));
            continue;
        }
        if let Some(rest) = flag.strip_prefix("--quantum=") {
            quantum = Some(parse_value(rest, "--quantum")?);
            continue;
        }
        if let Some(rest) = flag.strip_prefix("--timeout=") {
            timeout = Some(parse_value(rest, "--timeout")?);
            continue;
        }
        if let Some(rest) = flag.strip_prefix("--tick-us=") {
            tick_us = Some(parse_value(rest, "--tick-us")?);
            continue;
        }
        if let Some(rest) = flag.strip_prefix("--startup-delay-ms=") {
            startup_delay_ms = parse_value(rest, "--startup-delay-ms")?;
            continue;
        }
        if let Some(rest) = flag.strip_prefix("--trace-capacity=") {
            trace_capacity = Some(parse_value(rest, "--trace-capacity")?);
            continue;
        }
        if let Some(rest) = flag.strip_prefix("--log-format=") {
            log_format = match rest {
                "text" => LogFormat::Text,
                "jsonl" => LogFormat::Jsonl,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        flag: "--log-format",
                        value: rest.to_string(),
                    })
                }
            };
            continue;
        }
        if let Some(rest) = flag.strip_prefix("--report=") {
            report = Some(PathBuf::from(rest));
            continue;
        }
        match flag {
            "--lockstep" => lockstep = true,
            "--timeline" => timeline = true,
            "--check" => check = true,
            "--chart-log" => chart_log = true,
            "--help" | "-h" => return Err(ConfigError::HelpRequested),
            _ if flag.starts_with('-') => return Err(ConfigError::UnknownFlag(flag.to_string())),
            _ => {
                if policy.is_some() {
                    return Err(ConfigError::UnexpectedArgument(flag.to_string()));
                }
                policy = Some(flag.parse::<PolicyKind>()?);
            }
        }
    }

    let policy = policy.ok_or(ConfigError::MissingPolicy)?;
    let defaults = SimConfig::new(policy);
    let tick_mode = if lockstep {
        TickMode::Lockstep
    } else {
        match tick_us {
            Some(us) => TickMode::Periodic(Duration::from_micros(us)),
            None => defaults.tick_mode,
        }
    };

    let config = SimConfig {
        quantum: quantum.unwrap_or(defaults.quantum),
        timeout: timeout.unwrap_or(defaults.timeout),
        tick_mode,
        startup_delay: Duration::from_millis(startup_delay_ms),
        log_format,
        trace_capacity: trace_capacity.unwrap_or(defaults.trace_capacity),
        ..defaults
    };
    config.validate()?;

    Ok(CliArgs {
        config,
        tasks_path: tasks_path.unwrap_or_else(|| PathBuf::from(DEFAULT_TASKS_PATH)),
        log_path: log_path.unwrap_or_else(|| default_log_path(policy)),
        timeline,
        check,
        report,
        chart_log,
    })
}

fn parse_value<T: FromStr>(value: &str, flag: &'static str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        flag,
        value: value.to_string(),
    })
}

/// Usage text for `--help` and argument errors.
pub fn usage(exe: &str) -> String {
    format!(
        "\
Usage: {exe} <FCFS|SPN|RR|HRRN|SRT|FEED> [OPTIONS]

Schedulers:
  FCFS   First-Come-First-Served
  SPN    Shortest Process Next
  RR     Round Robin
  HRRN   Highest Response Ratio Next
  SRT    Shortest Remaining Time
  FEED   Feedback (three levels)

Options:
  --tasks=<path>            Task file [default: {tasks}]
  --log=<path>              Run log [default: log_<SCHEDULER>.txt]
  --quantum=<ticks>         Preemption quantum [default: {quantum}]
  --timeout=<ticks>         Stop the scheduler at this tick [default: {timeout}]
  --tick-us=<micros>        Wall time per tick [default: {tick_us}]
  --lockstep                Advance ticks as fast as they are processed
  --startup-delay-ms=<ms>   Pause before starting the clock [default: 0]
  --log-format=text|jsonl   Run log line format [default: text]
  --trace-capacity=<n>      Transitions kept for --timeline/--check
  --timeline                Print a per-task timeline after the summary
  --check                   Verify scheduling invariants (exit 3 on violation)
  --report=<path>           Write a JSON run report
  --chart-log               Chart the saved run log (--log) against --tasks; no run
  -h, --help                Show this help
",
        tasks = DEFAULT_TASKS_PATH,
        quantum = crate::policy::DEFAULT_QUANTUM,
        timeout = crate::simulation::DEFAULT_TIMEOUT,
        tick_us = crate::sim::DEFAULT_TICK_PERIOD.as_micros(),
    )
}
