//! Simulated clock for a dispatch session.
//!
//! The clock is the single source of truth for time inside the core. Time is
//! counted in whole simulated milliseconds and only moves when the host
//! advances a tick, so a session never reads the wall clock and replays
//! identically for the same inputs.

/// Errors that can occur during clock operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,

    /// Simulated time would overflow.
    #[error("simulated time overflow: cannot advance {elapsed_ms} ms past {now_ms} ms")]
    TimeOverflow {
        /// Current simulated time.
        now_ms: u64,
        /// Requested advance.
        elapsed_ms: u64,
    },
}

/// Tick counter and simulated time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimClock {
    /// Ticks executed so far.
    tick: u64,
    /// Simulated milliseconds since the session began.
    now_ms: u64,
}

impl SimClock {
    /// A clock at tick 0, time 0.
    pub const fn new() -> Self {
        Self { tick: 0, now_ms: 0 }
    }

    /// Rebuild a clock from saved values.
    pub const fn from_parts(tick: u64, now_ms: u64) -> Self {
        Self { tick, now_ms }
    }

    /// Start a new tick covering `elapsed_ms`. Returns the new tick number.
    ///
    /// The clock is unchanged on error.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] or [`ClockError::TimeOverflow`]
    /// if either counter would exceed `u64::MAX`.
    pub fn advance(&mut self, elapsed_ms: u64) -> Result<u64, ClockError> {
        let tick = self.tick.checked_add(1).ok_or(ClockError::TickOverflow)?;
        let now_ms = self
            .now_ms
            .checked_add(elapsed_ms)
            .ok_or(ClockError::TimeOverflow {
                now_ms: self.now_ms,
                elapsed_ms,
            })?;
        self.tick = tick;
        self.now_ms = now_ms;
        Ok(tick)
    }

    /// Ticks executed so far.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Current simulated time in milliseconds.
    pub const fn now_ms(&self) -> u64 {
        self.now_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_moves_tick_and_time() {
        let mut clock = SimClock::new();
        assert_eq!(clock.advance(100).ok(), Some(1));
        assert_eq!(clock.advance(250).ok(), Some(2));
        assert_eq!(clock.tick(), 2);
        assert_eq!(clock.now_ms(), 350);
    }

    #[test]
    fn zero_length_tick_still_counts() {
        let mut clock = SimClock::from_parts(4, 1_000);
        assert_eq!(clock.advance(0).ok(), Some(5));
        assert_eq!(clock.now_ms(), 1_000);
    }

    #[test]
    fn overflow_leaves_clock_unchanged() {
        let mut clock = SimClock::from_parts(1, u64::MAX);
        assert_eq!(
            clock.advance(1),
            Err(ClockError::TimeOverflow {
                now_ms: u64::MAX,
                elapsed_ms: 1
            })
        );
        assert_eq!(clock, SimClock::from_parts(1, u64::MAX));

        let mut clock = SimClock::from_parts(u64::MAX, 0);
        assert_eq!(clock.advance(1), Err(ClockError::TickOverflow));
        assert_eq!(clock.now_ms(), 0);
    }
}
