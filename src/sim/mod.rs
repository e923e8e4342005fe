//! Time and trace primitives for the simulator.
//!
//! Purpose:
//! - Provide the shared logical clock and the thread that drives it.
//! - Keep a bounded trace of task transitions for checking and rendering.
//! - Provide a stable RNG for reproducible workloads.
//!
//! Invariants:
//! - `Clock` is monotonic and advances only through its driver.
//! - `TraceRing` never exceeds its capacity and evicts oldest events first.
//! - `SimRng` is deterministic and remaps a zero seed to a non-zero state.

pub mod clock;
pub mod driver;
pub mod rng;
pub mod trace;

pub use clock::Clock;
pub use driver::{ClockDriver, TickMode, DEFAULT_TICK_PERIOD};
pub use rng::SimRng;
pub use trace::{ParseEventError, TraceRing, TransitionEvent, DEFAULT_TRACE_CAPACITY};
