//! Shared logical clock.
//!
//! One tick counter plus one broadcast condvar, both behind a single lock.
//! Only the clock driver advances time; everyone else reads it or blocks
//! until it moves.
//!
//! # Tick protocol
//!
//! Each tick has two phases:
//!
//! 1. **Work**: every live runner observes the tick, credits its own task,
//!    and acknowledges with [`Clock::ack_tick`].
//! 2. **Decide**: once all live runners have acknowledged, the engine is
//!    released from [`Clock::wait_settled_after`] and makes its decisions.
//!
//! The order in which runners observe a tick is unspecified. Nothing reads
//! another task's fields during the work phase, so the order does not matter.
//!
//! In periodic mode the driver advances on wall time regardless of the
//! phases. In lockstep mode it also waits until the work phase is complete
//! and the engine has parked, which makes a run fully deterministic.
//!
//! # Horizon
//!
//! A clock built with [`Clock::with_horizon`] never advances past that tick.
//! The simulation sets it to the timeout, so a fast periodic driver cannot
//! run ahead of the engine's timeout check and no runner credits work after
//! it.
//!
//! # Close
//!
//! [`Clock::close`] wakes every waiter and makes all subsequent waits return
//! `None`. It is the cancellation path for runners, both on setup failure
//! and after the policy loop returns with tasks unfinished.

use std::sync::{Condvar, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct ClockState {
    now: u64,
    /// Runners still alive (registered and not retired).
    live_runners: usize,
    /// Live runners that have not acknowledged `now` yet.
    pending_acks: usize,
    engine_attached: bool,
    /// Engine is blocked waiting for a tick after `now`.
    engine_parked: bool,
    closed: bool,
    /// Last tick the clock may reach.
    horizon: u64,
}

impl ClockState {
    #[inline]
    fn settled(&self) -> bool {
        self.pending_acks == 0
    }
}

/// Monotonic tick counter shared by the driver, runners and engine.
#[derive(Debug)]
pub struct Clock {
    state: Mutex<ClockState>,
    tick_cv: Condvar,
}

impl Default for Clock {
    fn default() -> Self {
        Self::with_horizon(u64::MAX)
    }
}

impl Clock {
    /// Clock at tick 0 with no participants and no horizon.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock at tick 0 that stops advancing at `horizon`.
    pub fn with_horizon(horizon: u64) -> Self {
        Self {
            state: Mutex::new(ClockState {
                horizon,
                ..ClockState::default()
            }),
            tick_cv: Condvar::new(),
        }
    }

    #[inline]
    fn lock(&self) -> MutexGuard<'_, ClockState> {
        self.state.lock().expect("clock mutex poisoned")
    }

    #[inline]
    fn wait<'a>(&self, st: MutexGuard<'a, ClockState>) -> MutexGuard<'a, ClockState> {
        self.tick_cv.wait(st).expect("clock condvar poisoned")
    }

    /// Current tick.
    #[inline]
    pub fn now(&self) -> u64 {
        self.lock().now
    }

    /// Advance by one tick and wake every waiter. Returns the current tick,
    /// which is unchanged once the horizon is reached.
    ///
    /// Called only by the clock driver.
    pub fn advance(&self) -> u64 {
        let mut st = self.lock();
        if st.now >= st.horizon {
            return st.now;
        }
        st.now += 1;
        st.pending_acks = st.live_runners;
        st.engine_parked = false;
        let now = st.now;
        drop(st);
        self.tick_cv.notify_all();
        now
    }

    /// Register one runner. Returns the tick it starts observing from.
    ///
    /// Register every runner before the driver starts so none can miss the
    /// first tick's acknowledgement accounting.
    pub fn register_runner(&self) -> u64 {
        let mut st = self.lock();
        st.live_runners += 1;
        st.now
    }

    /// Block until a tick after `seen` is visible.
    ///
    /// Returns `None` once the clock is closed.
    pub fn wait_tick_after(&self, seen: u64) -> Option<u64> {
        let mut st = self.lock();
        while st.now <= seen && !st.closed {
            st = self.wait(st);
        }
        if st.closed {
            None
        } else {
            Some(st.now)
        }
    }

    /// Acknowledge that a runner finished its work phase for `tick`.
    ///
    /// A stale acknowledgement (the driver already moved on) is ignored; the
    /// runner will observe and acknowledge the newer tick. `retire` removes
    /// the runner from all future accounting.
    pub fn ack_tick(&self, tick: u64, retire: bool) {
        let mut st = self.lock();
        if (tick == st.now || retire) && st.pending_acks > 0 {
            st.pending_acks -= 1;
        }
        if retire {
            st.live_runners = st.live_runners.saturating_sub(1);
        }
        drop(st);
        self.tick_cv.notify_all();
    }

    /// Retire a runner that exits without acknowledging (cancellation).
    pub fn retire_runner(&self) {
        let mut st = self.lock();
        st.live_runners = st.live_runners.saturating_sub(1);
        st.pending_acks = st.pending_acks.min(st.live_runners);
        drop(st);
        self.tick_cv.notify_all();
    }

    /// Mark the engine as a participant. A lockstep driver will not advance
    /// past a tick until the attached engine parks.
    pub fn attach_engine(&self) {
        self.lock().engine_attached = true;
    }

    pub fn detach_engine(&self) {
        let mut st = self.lock();
        st.engine_attached = false;
        st.engine_parked = false;
        drop(st);
        self.tick_cv.notify_all();
    }

    /// Block until the work phase of the current tick is complete.
    ///
    /// Returns the tick, or `None` once closed.
    pub fn settled(&self) -> Option<u64> {
        let mut st = self.lock();
        while !st.settled() && !st.closed {
            st = self.wait(st);
        }
        if st.closed {
            None
        } else {
            Some(st.now)
        }
    }

    /// Engine wait: block until a tick after `seen` exists and its work phase
    /// is complete.
    ///
    /// Returns `None` once closed.
    pub fn wait_settled_after(&self, seen: u64) -> Option<u64> {
        let mut st = self.lock();
        if st.now <= seen {
            st.engine_parked = true;
            self.tick_cv.notify_all();
        }
        while (st.now <= seen || !st.settled()) && !st.closed {
            st = self.wait(st);
        }
        st.engine_parked = false;
        if st.closed {
            None
        } else {
            Some(st.now)
        }
    }

    /// Lockstep driver wait: block until the current tick is fully processed
    /// and the horizon allows another.
    ///
    /// Returns `false` once closed.
    pub fn wait_lockstep_ready(&self) -> bool {
        let mut st = self.lock();
        while !st.closed
            && !(st.now < st.horizon && st.settled() && (st.engine_parked || !st.engine_attached))
        {
            st = self.wait(st);
        }
        !st.closed
    }

    /// Wake every waiter and refuse further waits.
    pub fn close(&self) {
        self.lock().closed = true;
        self.tick_cv.notify_all();
    }
}
