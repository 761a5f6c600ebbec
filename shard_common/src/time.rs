//! Time primitives and the injectable clock capability.

pub use std::time::{Duration, Instant};

/// Source of monotonic time.
///
/// Staleness checks take the clock as a capability so tests can simulate
/// elapsed time without real delays.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall-clock backed [`Clock`] used outside of tests.
#[derive(Copy, Clone, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
