//! Lamport logical clock.
//!
//! A single monotonically non-decreasing counter per replica:
//! - `tick` before every local event, yielding a never-reused timestamp, or
//!   `None` once the clock is exhausted
//! - `observe` every remote timestamp, so later local events rank above it

use serde::{Deserialize, Serialize};
use std::fmt;

/// A Lamport clock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LamportClock(u64);

impl LamportClock {
    /// Creates a clock at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    /// Creates a clock at a given time.
    #[must_use]
    pub const fn at(time: u64) -> Self {
        Self(time)
    }

    /// Returns the current time.
    #[must_use]
    pub const fn current(&self) -> u64 {
        self.0
    }

    /// Advances the clock for a new local event and returns the new time.
    ///
    /// Returns `None`, leaving the clock unchanged, if the time is already
    /// `u64::MAX`: a repeated time would mint a duplicate identifier.
    #[must_use]
    pub fn tick(&mut self) -> Option<u64> {
        self.0 = self.0.checked_add(1)?;
        Some(self.0)
    }

    /// Raises the clock to at least `time`.
    pub fn observe(&mut self, time: u64) {
        if time > self.0 {
            self.0 = time;
        }
    }
}

impl fmt::Display for LamportClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
