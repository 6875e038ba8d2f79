use chrono::{DateTime, Duration, Utc};

//
// ─── TIMER EVENTS ──────────────────────────────────────────────────────────────
//

/// What the countdown reports when polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// Still running; `remaining_seconds` counts down to zero.
    Tick { remaining_seconds: u32 },
    /// The deadline passed. Emitted exactly once.
    Expired,
}

//
// ─── SESSION TIMER ─────────────────────────────────────────────────────────────
//

/// Countdown for timed sessions.
///
/// The deadline is fixed at construction (start + limit) and remaining time
/// is always recomputed from the injected clock's `now`, never accumulated
/// per tick, so slow or skipped polls cannot drift the countdown. The host
/// is expected to poll roughly once per second.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTimer {
    deadline: DateTime<Utc>,
    expiry_emitted: bool,
    cancelled: bool,
}

impl SessionTimer {
    /// Start a countdown of `limit_seconds` from `started_at`.
    #[must_use]
    pub fn new(started_at: DateTime<Utc>, limit_seconds: u32) -> Self {
        Self {
            deadline: started_at + Duration::seconds(i64::from(limit_seconds)),
            expiry_emitted: false,
            cancelled: false,
        }
    }

    #[must_use]
    pub fn deadline(&self) -> DateTime<Utc> {
        self.deadline
    }

    /// Whole seconds left before the deadline, clamped at zero.
    #[must_use]
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> u32 {
        let left = self.deadline.signed_duration_since(now).num_seconds();
        u32::try_from(left).unwrap_or(0)
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.deadline
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Stop the countdown; subsequent polls yield nothing.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    /// Poll the countdown at `now`.
    ///
    /// Returns `Expired` exactly once when the deadline has passed, `Tick`
    /// while running, and `None` after cancellation or a delivered expiry.
    pub fn poll(&mut self, now: DateTime<Utc>) -> Option<TimerEvent> {
        if self.cancelled || self.expiry_emitted {
            return None;
        }
        if self.is_expired(now) {
            self.expiry_emitted = true;
            return Some(TimerEvent::Expired);
        }
        Some(TimerEvent::Tick {
            remaining_seconds: self.remaining_seconds(now),
        })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
