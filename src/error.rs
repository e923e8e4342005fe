//! Top-level error taxonomy.
//!
//! | Error | Raised | Exit status |
//! |-------|--------|-------------|
//! | [`ConfigError`] | argument parsing / validation, before any thread | 2 |
//! | [`LoadError`] | task file, before any thread | 2 |
//! | [`SetupError`] | log file creation, thread creation | 1 |
//! | [`TransitionError`] | task table misuse during the run | 1 |
//! | `io::Error` | writing the run log or console | 1 |
//!
//! A timeout is not an error; it is reported through
//! [`crate::engine::EngineOutcome::TimedOut`].

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::loader::LoadError;
use crate::policy::UnknownPolicy;
use crate::task::TransitionError;

/// Invalid command line or run configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    /// No scheduler type was given.
    MissingPolicy,
    UnknownPolicy(String),
    /// A flag value failed to parse.
    InvalidValue { flag: &'static str, value: String },
    UnknownFlag(String),
    /// A second positional argument.
    UnexpectedArgument(String),
    ZeroQuantum,
    ZeroTickPeriod,
    ZeroTimeout,
    /// `--help` was given; not a failure, but parsing stops.
    HelpRequested,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPolicy => write!(f, "missing scheduler type"),
            Self::UnknownPolicy(token) => write!(f, "{}", UnknownPolicy(token.clone())),
            Self::InvalidValue { flag, value } => write!(f, "invalid {flag} value: '{value}'"),
            Self::UnknownFlag(flag) => write!(f, "unknown flag: {flag}"),
            Self::UnexpectedArgument(arg) => write!(f, "unexpected argument: '{arg}'"),
            Self::ZeroQuantum => write!(f, "--quantum must be >= 1"),
            Self::ZeroTickPeriod => write!(f, "--tick-us must be >= 1"),
            Self::ZeroTimeout => write!(f, "--timeout must be >= 1"),
            Self::HelpRequested => write!(f, "help requested"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<UnknownPolicy> for ConfigError {
    fn from(err: UnknownPolicy) -> Self {
        Self::UnknownPolicy(err.0)
    }
}

/// Failure to create a run's resources.
#[derive(Debug)]
#[non_exhaustive]
pub enum SetupError {
    /// The run log could not be created.
    LogFile { path: PathBuf, source: io::Error },
    /// A worker thread could not be created. Threads already started were
    /// cancelled and joined before this was returned.
    Spawn { what: String, source: io::Error },
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LogFile { path, source } => {
                write!(f, "cannot create log file {}: {source}", path.display())
            }
            Self::Spawn { what, source } => write!(f, "cannot start {what}: {source}"),
        }
    }
}

impl std::error::Error for SetupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::LogFile { source, .. } | Self::Spawn { source, .. } => Some(source),
        }
    }
}

/// Any error that ends a simulation run early.
#[derive(Debug)]
#[non_exhaustive]
pub enum SimError {
    Config(ConfigError),
    Load(LoadError),
    Setup(SetupError),
    Transition(TransitionError),
    /// The run log or console could not be written.
    Output(io::Error),
}

impl SimError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Load(_) => 2,
            Self::Setup(_) | Self::Transition(_) | Self::Output(_) => 1,
        }
    }
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "configuration error: {err}"),
            Self::Load(err) => write!(f, "cannot load tasks: {err}"),
            Self::Setup(err) => write!(f, "setup failed: {err}"),
            Self::Transition(err) => write!(f, "scheduler error: {err}"),
            Self::Output(err) => write!(f, "cannot write output: {err}"),
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Load(err) => Some(err),
            Self::Setup(err) => Some(err),
            Self::Transition(err) => Some(err),
            Self::Output(err) => Some(err),
        }
    }
}

impl From<ConfigError> for SimError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<LoadError> for SimError {
    fn from(err: LoadError) -> Self {
        Self::Load(err)
    }
}

impl From<SetupError> for SimError {
    fn from(err: SetupError) -> Self {
        Self::Setup(err)
    }
}

impl From<TransitionError> for SimError {
    fn from(err: TransitionError) -> Self {
        Self::Transition(err)
    }
}
