use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::model::ids::UserId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UserStatsError {
    #[error("accuracy must be 0-100, got {0}")]
    AccuracyOutOfRange(u8),
}

//
// ─── USER STATS ────────────────────────────────────────────────────────────────
//

/// Cumulative statistics for one user.
///
/// Owned by the stats aggregation layer and folded forward exactly once per
/// completed session. Points never decrease; accuracy is a running average
/// over all completed quizzes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserStats {
    user_id: UserId,
    points: u32,
    total_quizzes: u32,
    accuracy: u8,
    streak: u32,
    last_quiz_at: Option<DateTime<Utc>>,
}

impl UserStats {
    /// Fresh stats for a user who has not completed a quiz yet.
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            points: 0,
            total_quizzes: 0,
            accuracy: 0,
            streak: 0,
            last_quiz_at: None,
        }
    }

    /// Rehydrate stats from the backend.
    ///
    /// # Errors
    ///
    /// Returns `UserStatsError::AccuracyOutOfRange` if accuracy is above 100.
    pub fn from_persisted(
        user_id: UserId,
        points: u32,
        total_quizzes: u32,
        accuracy: u8,
        streak: u32,
        last_quiz_at: Option<DateTime<Utc>>,
    ) -> Result<Self, UserStatsError> {
        if accuracy > 100 {
            return Err(UserStatsError::AccuracyOutOfRange(accuracy));
        }
        Ok(Self {
            user_id,
            points,
            total_quizzes,
            accuracy,
            streak,
            last_quiz_at,
        })
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn points(&self) -> u32 {
        self.points
    }

    /// Level derived from points: one level per 100 points, starting at 1.
    #[must_use]
    pub fn level(&self) -> u32 {
        self.points / 100 + 1
    }

    #[must_use]
    pub fn total_quizzes(&self) -> u32 {
        self.total_quizzes
    }

    /// Running average score across all completed quizzes (0-100).
    #[must_use]
    pub fn accuracy(&self) -> u8 {
        self.accuracy
    }

    /// Consecutive-day counter; resets when more than a day passes between
    /// quizzes.
    #[must_use]
    pub fn streak(&self) -> u32 {
        self.streak
    }

    #[must_use]
    pub fn last_quiz_at(&self) -> Option<DateTime<Utc>> {
        self.last_quiz_at
    }

    /// Fold one completed session into the running totals.
    ///
    /// Pure: returns the updated stats and leaves `self` untouched. The
    /// streak increments only when the previous quiz happened within the 24
    /// hours before `completed_at`; otherwise it restarts at 1.
    #[must_use]
    pub fn apply_session(
        &self,
        score: u8,
        points_earned: u32,
        completed_at: DateTime<Utc>,
    ) -> UserStats {
        let new_total = self.total_quizzes + 1;
        let accuracy = if self.total_quizzes == 0 {
            score
        } else {
            let weighted = self.accuracy as u32 * self.total_quizzes + u32::from(score);
            ((weighted + new_total / 2) / new_total) as u8
        };

        let streak = match self.last_quiz_at {
            Some(last) => {
                let gap = completed_at.signed_duration_since(last);
                if gap >= Duration::zero() && gap <= Duration::hours(24) {
                    self.streak + 1
                } else {
                    1
                }
            }
            None => 1,
        };

        UserStats {
            user_id: self.user_id.clone(),
            points: self.points.saturating_add(points_earned),
            total_quizzes: new_total,
            accuracy,
            streak,
            last_quiz_at: Some(completed_at),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn seeded_stats(points: u32, total: u32, accuracy: u8) -> UserStats {
        UserStats::from_persisted(
            UserId::new("user-1"),
            points,
            total,
            accuracy,
            2,
            Some(fixed_now()),
        )
        .unwrap()
    }

    #[test]
    fn rehydration_rejects_accuracy_above_100() {
        let err =
            UserStats::from_persisted(UserId::new("u"), 0, 0, 101, 0, None).unwrap_err();
        assert!(matches!(err, UserStatsError::AccuracyOutOfRange(101)));
    }

    #[test]
    fn first_session_sets_accuracy_to_its_score() {
        let stats = UserStats::new(UserId::new("user-1"));
        let updated = stats.apply_session(60, 35, fixed_now());

        assert_eq!(updated.points(), 35);
        assert_eq!(updated.total_quizzes(), 1);
        assert_eq!(updated.accuracy(), 60);
        assert_eq!(updated.streak(), 1);
        assert_eq!(updated.last_quiz_at(), Some(fixed_now()));
    }

    #[test]
    fn accuracy_is_a_rounded_running_average() {
        // 80 over 4 quizzes plus a 60 → round(380 / 5) = 76
        let stats = seeded_stats(400, 4, 80);
        let updated = stats.apply_session(60, 20, fixed_now() + Duration::hours(1));

        assert_eq!(updated.accuracy(), 76);
        assert_eq!(updated.total_quizzes(), 5);
    }

    #[test]
    fn points_accumulate_and_never_decrease() {
        let stats = seeded_stats(90, 3, 50);
        let updated = stats.apply_session(0, 0, fixed_now() + Duration::hours(1));

        assert_eq!(updated.points(), 90);
        assert!(updated.points() >= stats.points());
    }

    #[test]
    fn level_steps_every_hundred_points() {
        assert_eq!(seeded_stats(0, 1, 50).level(), 1);
        assert_eq!(seeded_stats(99, 1, 50).level(), 1);
        assert_eq!(seeded_stats(100, 1, 50).level(), 2);
        assert_eq!(seeded_stats(350, 1, 50).level(), 4);
    }

    #[test]
    fn streak_increments_within_a_day() {
        let stats = seeded_stats(100, 2, 70);
        let updated = stats.apply_session(80, 30, fixed_now() + Duration::hours(23));
        assert_eq!(updated.streak(), 3);
    }

    #[test]
    fn streak_resets_after_a_day() {
        let stats = seeded_stats(100, 2, 70);
        let updated = stats.apply_session(80, 30, fixed_now() + Duration::hours(25));
        assert_eq!(updated.streak(), 1);
    }

    #[test]
    fn streak_resets_when_completion_predates_last_quiz() {
        let stats = seeded_stats(100, 2, 70);
        let updated = stats.apply_session(80, 30, fixed_now() - Duration::hours(1));
        assert_eq!(updated.streak(), 1);
    }

    #[test]
    fn apply_session_leaves_the_original_untouched() {
        let stats = seeded_stats(100, 2, 70);
        let _ = stats.apply_session(90, 40, fixed_now() + Duration::hours(1));
        assert_eq!(stats.points(), 100);
        assert_eq!(stats.total_quizzes(), 2);
    }
}
