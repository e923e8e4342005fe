//! Generates a deterministic random task file.
//!
//! ```text
//! gen_tasks [--seed=N] [--count=N] [--max-arrival=N]
//!           [--min-runtime=N] [--max-runtime=N] [--out=<path>]
//! ```
//!
//! Writes to stdout unless `--out` is given. The same flags always produce
//! the same file.
//!
//! # Exit Codes
//!
//! - `0`: file written
//! - `1`: output could not be written
//! - `2`: invalid arguments

use std::env;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::str::FromStr;

use sched_sim::workload::{random_tasks, write_task_file, WorkloadShape};

fn print_usage() {
    eprintln!(
        "Usage: gen_tasks [--seed=N] [--count=N] [--max-arrival=N] \
         [--min-runtime=N] [--max-runtime=N] [--out=<path>]"
    );
}

fn parse_or_exit<T: FromStr>(value: &str, flag: &str) -> T {
    match value.parse() {
        Ok(v) => v,
        Err(_) => {
            eprintln!("invalid {flag} value: {value}");
            std::process::exit(2);
        }
    }
}

fn main() {
    let mut seed: u64 = 1;
    let mut shape = WorkloadShape::default();
    let mut out: Option<PathBuf> = None;

    for arg in env::args().skip(1) {
        if let Some(rest) = arg.strip_prefix("--seed=") {
            seed = parse_or_exit(rest, "--seed");
        } else if let Some(rest) = arg.strip_prefix("--count=") {
            shape.count = parse_or_exit(rest, "--count");
        } else if let Some(rest) = arg.strip_prefix("--max-arrival=") {
            shape.max_arrival = parse_or_exit(rest, "--max-arrival");
        } else if let Some(rest) = arg.strip_prefix("--min-runtime=") {
            shape.min_runtime = parse_or_exit(rest, "--min-runtime");
        } else if let Some(rest) = arg.strip_prefix("--max-runtime=") {
            shape.max_runtime = parse_or_exit(rest, "--max-runtime");
        } else if let Some(rest) = arg.strip_prefix("--out=") {
            out = Some(PathBuf::from(rest));
        } else if arg == "--help" || arg == "-h" {
            print_usage();
            return;
        } else {
            eprintln!("unknown argument: {arg}");
            print_usage();
            std::process::exit(2);
        }
    }

    if shape.count == 0 {
        eprintln!("--count must be >= 1");
        std::process::exit(2);
    }

    let tasks = random_tasks(seed, &shape);
    let result = match &out {
        Some(path) => File::create(path)
            .and_then(|file| write_task_file(&mut BufWriter::new(file), &tasks)),
        None => write_task_file(&mut io::stdout().lock(), &tasks),
    };
    if let Err(err) = result {
        eprintln!("cannot write tasks: {err}");
        std::process::exit(1);
    }
}
