//! Task file loader.
//!
//! # Format
//!
//! Line-oriented text. Blank lines and lines whose first non-blank byte is
//! `#` are ignored. Every other line holds exactly three whitespace-separated
//! unsigned integers:
//!
//! ```text
//! # id arrival runtime
//! 1 0 3
//! 2 1 2
//! ```
//!
//! Loaded tasks are `idle`, have no work done and are not started. Task order
//! (and therefore the index every policy tie-breaks on) is file order.
//!
//! Any malformed line fails the whole load; there is no partial result.

use std::collections::HashSet;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use crate::task::Task;

/// Errors from reading or parsing a task file.
#[derive(Debug)]
#[non_exhaustive]
pub enum LoadError {
    /// File could not be read.
    Io { path: PathBuf, source: io::Error },
    /// Line is not three unsigned integers.
    Malformed { line: usize, detail: String },
    /// Task ID seen on an earlier line.
    DuplicateId { line: usize, id: u32 },
    /// Task requires no work.
    ZeroRuntime { line: usize, id: u32 },
    /// File holds no task lines.
    NoTasks,
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cannot read task file {}: {source}", path.display())
            }
            Self::Malformed { line, detail } => write!(f, "line {line}: {detail}"),
            Self::DuplicateId { line, id } => write!(f, "line {line}: duplicate task id {id}"),
            Self::ZeroRuntime { line, id } => {
                write!(f, "line {line}: task {id} has zero runtime")
            }
            Self::NoTasks => write!(f, "task file contains no tasks"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Read and parse the task file at `path`.
pub fn load_tasks(path: impl AsRef<Path>) -> Result<Vec<Task>, LoadError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_tasks(&text)
}

/// Parse task-file text.
pub fn parse_tasks(text: &str) -> Result<Vec<Task>, LoadError> {
    let mut tasks = Vec::new();
    let mut seen = HashSet::new();

    for (i, raw) in text.lines().enumerate() {
        let line_no = i + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields = line.split_whitespace();
        let id: u32 = parse_field(fields.next(), "id", line_no)?;
        let arrival: u64 = parse_field(fields.next(), "arrival time", line_no)?;
        let runtime: u64 = parse_field(fields.next(), "runtime", line_no)?;
        if let Some(extra) = fields.next() {
            return Err(LoadError::Malformed {
                line: line_no,
                detail: format!("unexpected trailing field '{extra}'"),
            });
        }

        if runtime == 0 {
            return Err(LoadError::ZeroRuntime { line: line_no, id });
        }
        if !seen.insert(id) {
            return Err(LoadError::DuplicateId { line: line_no, id });
        }
        tasks.push(Task::new(id, arrival, runtime));
    }

    if tasks.is_empty() {
        return Err(LoadError::NoTasks);
    }
    Ok(tasks)
}

fn parse_field<T: std::str::FromStr>(
    field: Option<&str>,
    name: &str,
    line: usize,
) -> Result<T, LoadError> {
    let Some(raw) = field else {
        return Err(LoadError::Malformed {
            line,
            detail: format!("missing {name}"),
        });
    };
    raw.parse().map_err(|_| LoadError::Malformed {
        line,
        detail: format!("invalid {name} '{raw}'"),
    })
}
