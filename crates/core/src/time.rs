use chrono::{DateTime, Duration, Utc};

/// A simple clock abstraction for deterministic time in services and tests.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    Default,
    Fixed(DateTime<Utc>),
}

impl Clock {
    /// Returns a clock that uses the current system time.
    #[must_use]
    pub fn default_clock() -> Self {
        Self::Default
    }

    /// Returns a clock fixed at the given timestamp.
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    /// Returns the current time according to the clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::Default => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// If this is a fixed clock, advance it by the given duration.
    ///
    /// Has no effect on `Clock::Default`.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }

    /// Returns true if this clock is fixed.
    #[must_use]
    pub fn is_fixed(&self) -> bool {
        matches!(self, Clock::Fixed(_))
    }
}

/// Outcome of a single countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Time remains.
    Running,
    /// This tick brought the countdown to zero.
    Expired,
    /// The countdown was already at zero before this tick.
    AlreadyExpired,
}

/// Whole-second countdown for timed attempts.
///
/// The countdown only moves when `tick` is called; wiring it to a real
/// 1 Hz timer is the caller's job, which keeps exam timing deterministic
/// under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    duration_sec: u32,
    remaining_sec: u32,
}

impl Countdown {
    #[must_use]
    pub fn new(duration_sec: u32) -> Self {
        Self {
            duration_sec,
            remaining_sec: duration_sec,
        }
    }

    /// Seconds left until expiry.
    #[must_use]
    pub fn remaining_sec(&self) -> u32 {
        self.remaining_sec
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.remaining_sec == 0
    }

    /// True when 10% or less of the original duration remains.
    ///
    /// A derived warning signal for presentation, not part of the state
    /// transition itself.
    #[must_use]
    pub fn is_low(&self) -> bool {
        self.remaining_sec <= self.duration_sec / 10
    }

    /// Advance the countdown by one second.
    pub fn tick(&mut self) -> TickOutcome {
        if self.remaining_sec == 0 {
            return TickOutcome::AlreadyExpired;
        }
        self.remaining_sec -= 1;
        if self.remaining_sec == 0 {
            TickOutcome::Expired
        } else {
            TickOutcome::Running
        }
    }

    /// Restore the full duration for a fresh attempt.
    pub fn restart(&mut self) {
        self.remaining_sec = self.duration_sec;
    }
}

/// Deterministic timestamp for tests and examples (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests and doc examples.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// Returns a `Clock` fixed at the deterministic test timestamp.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_ticks_to_zero_once() {
        let mut countdown = Countdown::new(2);
        assert_eq!(countdown.tick(), TickOutcome::Running);
        assert_eq!(countdown.tick(), TickOutcome::Expired);
        assert_eq!(countdown.tick(), TickOutcome::AlreadyExpired);
        assert_eq!(countdown.tick(), TickOutcome::AlreadyExpired);
        assert_eq!(countdown.remaining_sec(), 0);
    }

    #[test]
    fn countdown_low_time_threshold() {
        let mut countdown = Countdown::new(100);
        assert!(!countdown.is_low());
        for _ in 0..90 {
            countdown.tick();
        }
        assert!(countdown.is_low());
        assert_eq!(countdown.remaining_sec(), 10);
    }

    #[test]
    fn countdown_restart_restores_duration() {
        let mut countdown = Countdown::new(5);
        countdown.tick();
        countdown.tick();
        countdown.restart();
        assert_eq!(countdown.remaining_sec(), 5);
        assert!(!countdown.is_expired());
    }

    #[test]
    fn fixed_clock_advances() {
        let mut clock = fixed_clock();
        let before = clock.now();
        clock.advance(Duration::seconds(30));
        assert_eq!(clock.now() - before, Duration::seconds(30));
    }
}
