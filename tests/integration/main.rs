//! Integration tests for the scheduling simulator.
//!
//! Run with: `cargo test --test integration`

mod cli_runs;
mod loader_files;
mod periodic_runs;
mod policy_scenarios;
mod support;
mod timeouts;
