//! Simulation clock: the daily tick counter and calendar derivation.
//!
//! One tick is one simulated day. The clock starts at tick 0, which is the
//! setup state before any day has run; the first call to
//! [`SimClock::advance`] moves it to tick 1, the first simulated day.
//!
//! The calendar is a fixed 365-day year. Tick 1 is day 0 of year 0, tick
//! 365 is day 364 of year 0, tick 366 is day 0 of year 1.

/// Days in one simulated year.
pub const DAYS_PER_YEAR: u64 = 365;

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// The tick counter would overflow `u64::MAX`.
    #[error("tick counter overflow")]
    TickOverflow,

    /// The clock was given an invalid configuration.
    #[error("invalid clock config: {reason}")]
    InvalidConfig {
        /// Description of what is invalid.
        reason: String,
    },
}

/// The simulation clock.
///
/// Tracks the current tick and derives the day of year and the year from
/// it. All arithmetic is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimClock {
    /// Current tick number (0 before the first simulated day).
    tick: u64,
    /// Tick the run stops after.
    max_ticks: u64,
}

impl SimClock {
    /// Create a clock at tick 0 that runs for `max_ticks` days.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if `max_ticks` is zero.
    pub fn new(max_ticks: u64) -> Result<Self, ClockError> {
        if max_ticks == 0 {
            return Err(ClockError::InvalidConfig {
                reason: "max_ticks must be at least 1".to_owned(),
            });
        }
        Ok(Self { tick: 0, max_ticks })
    }

    /// Return the current tick number.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Return the configured run length in ticks.
    pub const fn max_ticks(&self) -> u64 {
        self.max_ticks
    }

    /// Returns `true` once the final configured tick has run.
    pub const fn is_finished(&self) -> bool {
        self.tick >= self.max_ticks
    }

    /// Advance the clock by one day and return the new tick number.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] if the tick counter would
    /// overflow.
    pub const fn advance(&mut self) -> Result<u64, ClockError> {
        match self.tick.checked_add(1) {
            Some(next) => {
                self.tick = next;
                Ok(next)
            }
            None => Err(ClockError::TickOverflow),
        }
    }

    /// Zero-based day of the current year.
    ///
    /// Returns 0 at tick 0.
    pub const fn day_of_year(&self) -> u64 {
        match elapsed_days(self.tick).checked_rem(DAYS_PER_YEAR) {
            Some(day) => day,
            None => 0,
        }
    }

    /// Zero-based year of the current tick.
    pub const fn year(&self) -> u64 {
        match elapsed_days(self.tick).checked_div(DAYS_PER_YEAR) {
            Some(year) => year,
            None => 0,
        }
    }
}

/// Days completed before `tick` began.
const fn elapsed_days(tick: u64) -> u64 {
    tick.saturating_sub(1)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn clock_starts_at_tick_zero() {
        let clock = SimClock::new(10).unwrap();
        assert_eq!(clock.tick(), 0);
        assert_eq!(clock.day_of_year(), 0);
        assert!(!clock.is_finished());
    }

    #[test]
    fn clock_advances() {
        let mut clock = SimClock::new(10).unwrap();
        assert_eq!(clock.advance().unwrap(), 1);
        assert_eq!(clock.advance().unwrap(), 2);
        assert_eq!(clock.tick(), 2);
    }

    #[test]
    fn calendar_wraps_after_a_year() {
        let mut clock = SimClock::new(1_000).unwrap();
        clock.advance().unwrap();
        assert_eq!((clock.day_of_year(), clock.year()), (0, 0));

        for _ in 1..365 {
            clock.advance().unwrap();
        }
        assert_eq!(clock.tick(), 365);
        assert_eq!((clock.day_of_year(), clock.year()), (364, 0));

        clock.advance().unwrap();
        assert_eq!((clock.day_of_year(), clock.year()), (0, 1));
    }

    #[test]
    fn finishes_at_max_ticks() {
        let mut clock = SimClock::new(2).unwrap();
        clock.advance().unwrap();
        assert!(!clock.is_finished());
        clock.advance().unwrap();
        assert!(clock.is_finished());
    }

    #[test]
    fn zero_length_run_is_rejected() {
        assert!(matches!(
            SimClock::new(0),
            Err(ClockError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn tick_overflow_is_error() {
        let mut clock = SimClock {
            tick: u64::MAX,
            max_ticks: u64::MAX,
        };
        assert!(matches!(clock.advance(), Err(ClockError::TickOverflow)));
    }
}
