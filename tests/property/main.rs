//! Property-based tests over random workloads.
//!
//! Run with: `cargo test --test property`

mod run_invariants;
