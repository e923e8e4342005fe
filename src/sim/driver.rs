//! Clock driver thread.
//!
//! # Modes
//!
//! | Mode | Advances when | Stops when |
//! |------|---------------|------------|
//! | `Periodic(d)` | every `d` of wall time | the clock is dropped |
//! | `Lockstep` | current tick fully processed | the clock is closed or dropped |
//!
//! The periodic driver has no stop signal. It holds only a `Weak` handle and
//! exits on its first wake-up after the last `Arc<Clock>` is gone; in the CLI
//! that is process exit. Its handle is detached, never joined.

use std::io;
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::clock::Clock;

/// Default tick period (about one millisecond per tick).
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_millis(1);

/// How the driver decides when to advance the clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TickMode {
    /// Fixed wall-clock period per tick.
    Periodic(Duration),
    /// Advance as soon as every participant has processed the current tick.
    Lockstep,
}

impl Default for TickMode {
    fn default() -> Self {
        Self::Periodic(DEFAULT_TICK_PERIOD)
    }
}

/// Handle to a running clock driver.
#[derive(Debug)]
pub struct ClockDriver {
    mode: TickMode,
    handle: Option<JoinHandle<()>>,
}

impl ClockDriver {
    /// Start driving `clock`.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the thread cannot be created.
    pub fn spawn(clock: &Arc<Clock>, mode: TickMode) -> io::Result<Self> {
        let weak = Arc::downgrade(clock);
        let handle = thread::Builder::new()
            .name("sched-clock".to_string())
            .spawn(move || match mode {
                TickMode::Periodic(period) => periodic_loop(weak, period),
                TickMode::Lockstep => lockstep_loop(weak),
            })?;
        Ok(Self {
            mode,
            handle: Some(handle),
        })
    }

    pub fn mode(&self) -> TickMode {
        self.mode
    }

    /// Release the driver at the end of a run.
    ///
    /// A lockstep driver is joined (it exits once the clock is closed). A
    /// periodic driver is detached.
    pub fn finish(mut self) {
        if let (TickMode::Lockstep, Some(handle)) = (self.mode, self.handle.take()) {
            if handle.join().is_err() {
                eprintln!("clock driver panicked");
            }
        }
    }
}

fn periodic_loop(clock: Weak<Clock>, period: Duration) {
    loop {
        thread::sleep(period);
        match clock.upgrade() {
            Some(clock) => {
                clock.advance();
            }
            None => return,
        }
    }
}

fn lockstep_loop(clock: Weak<Clock>) {
    while let Some(clock) = clock.upgrade() {
        if !clock.wait_lockstep_ready() {
            return;
        }
        clock.advance();
    }
}
