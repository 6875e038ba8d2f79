use chrono::{DateTime, Duration, Utc};

/// Clock abstraction so session and timer logic can run against a fixed
/// timestamp in tests instead of the host wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    /// Real wall-clock time.
    #[default]
    System,
    /// Frozen at a specific instant; advanced explicitly.
    Fixed(DateTime<Utc>),
}

impl Clock {
    /// Returns a clock backed by the system wall clock.
    #[must_use]
    pub fn system() -> Self {
        Self::System
    }

    /// Returns a clock frozen at the given instant.
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    /// Returns the current time according to the clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// Whole seconds elapsed between `since` and the clock's current time.
    ///
    /// Negative deltas clamp to zero, so a skewed `since` never produces a
    /// negative elapsed time.
    #[must_use]
    pub fn elapsed_seconds(&self, since: DateTime<Utc>) -> u32 {
        let delta = self.now().signed_duration_since(since).num_seconds();
        u32::try_from(delta).unwrap_or(0)
    }

    /// If this is a fixed clock, advance it by the given duration.
    ///
    /// Has no effect on `Clock::System`.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }

    /// Returns true if this clock is frozen.
    #[must_use]
    pub fn is_fixed(&self) -> bool {
        matches!(self, Clock::Fixed(_))
    }
}

/// Deterministic timestamp for tests and examples (2024-06-01T10:00:00Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_717_236_000;

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

/// Returns a `Clock` frozen at the deterministic test timestamp.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_reports_its_instant() {
        let clock = fixed_clock();
        assert_eq!(clock.now(), fixed_now());
        assert!(clock.is_fixed());
    }

    #[test]
    fn advance_moves_a_fixed_clock() {
        let mut clock = fixed_clock();
        clock.advance(Duration::seconds(90));
        assert_eq!(clock.now(), fixed_now() + Duration::seconds(90));
    }

    #[test]
    fn elapsed_seconds_counts_from_a_reference_point() {
        let mut clock = fixed_clock();
        clock.advance(Duration::seconds(42));
        assert_eq!(clock.elapsed_seconds(fixed_now()), 42);
    }

    #[test]
    fn elapsed_seconds_clamps_negative_deltas() {
        let clock = fixed_clock();
        let future = fixed_now() + Duration::hours(1);
        assert_eq!(clock.elapsed_seconds(future), 0);
    }

    #[test]
    fn advance_is_a_no_op_for_the_system_clock() {
        let mut clock = Clock::system();
        clock.advance(Duration::hours(5));
        assert!(!clock.is_fixed());
    }
}
