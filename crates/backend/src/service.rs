use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use quiz_core::model::{Difficulty, Question, QuizSession, SessionId, UserId, UserStats};

/// Errors surfaced by backend adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BackendError {
    #[error("requested {requested} questions but only {available} matched the filter")]
    NotFound { requested: u32, available: usize },

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Wire record for one completed session's contribution to a user's stats.
///
/// This mirrors the terminal fields of `QuizSession` so the stats layer can
/// ship them over the RPC boundary without leaking session internals. The
/// session id doubles as the idempotency key: the store must apply each
/// submission at most once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSubmission {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub score: u8,
    pub points_earned: u32,
    pub time_spent_seconds: u32,
    pub completed_at: DateTime<Utc>,
}

impl StatsSubmission {
    /// Build a submission from a completed session.
    ///
    /// Returns `None` while the session has no terminal outcome yet.
    #[must_use]
    pub fn from_session(session: &QuizSession) -> Option<Self> {
        let outcome = session.outcome()?;
        Some(Self {
            session_id: session.id(),
            user_id: session.user_id().clone(),
            score: outcome.score,
            points_earned: outcome.points_earned,
            time_spent_seconds: outcome.time_spent_seconds,
            completed_at: session.completed_at()?,
        })
    }
}

/// Acknowledgement returned by the stats store: the user's stats after the
/// submission was merged (or the stored result, when the same session id is
/// replayed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsAck {
    pub session_id: SessionId,
    pub stats: UserStats,
}

/// Read-only source of exam questions.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Fetch an ordered batch of `count` questions, optionally restricted to
    /// the given difficulties.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` when fewer than `count` questions
    /// match; no partial batch is returned.
    async fn fetch_questions(
        &self,
        count: u32,
        difficulty: Option<&[Difficulty]>,
    ) -> Result<Vec<Question>, BackendError>;

    /// Number of questions matching the filter, used to validate requested
    /// counts before a session is created.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the pool cannot be inspected.
    async fn pool_size(&self, difficulty: Option<&[Difficulty]>) -> Result<usize, BackendError>;
}

/// Store of cumulative user statistics, idempotent on session id.
#[async_trait]
pub trait StatsStore: Send + Sync {
    /// Merge one session's results into the user's stats.
    ///
    /// Submitting the same session id again must not double-count; the
    /// store returns the previously recorded acknowledgement instead.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` when the store is unreachable.
    async fn submit_stats(&self, submission: &StatsSubmission) -> Result<StatsAck, BackendError>;

    /// Fetch one user's stats, `None` if they have not completed a quiz.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` when the store is unreachable.
    async fn get_stats(&self, user_id: &UserId) -> Result<Option<UserStats>, BackendError>;

    /// Fetch every user's stats (the leaderboard read path).
    ///
    /// # Errors
    ///
    /// Returns `BackendError` when the store is unreachable.
    async fn list_stats(&self) -> Result<Vec<UserStats>, BackendError>;
}

/// Simple in-memory backend for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    questions: Arc<Mutex<Vec<Question>>>,
    stats: Arc<Mutex<HashMap<UserId, UserStats>>>,
    acked: Arc<Mutex<HashMap<SessionId, StatsAck>>>,
}

impl InMemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the question pool.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn add_question(&self, question: Question) {
        self.questions
            .lock()
            .expect("question pool lock poisoned")
            .push(question);
    }

    fn matching(pool: &[Question], difficulty: Option<&[Difficulty]>) -> Vec<Question> {
        pool.iter()
            .filter(|q| difficulty.is_none_or(|wanted| wanted.contains(&q.difficulty())))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl QuestionSource for InMemoryBackend {
    async fn fetch_questions(
        &self,
        count: u32,
        difficulty: Option<&[Difficulty]>,
    ) -> Result<Vec<Question>, BackendError> {
        let guard = self
            .questions
            .lock()
            .map_err(|e| BackendError::Connection(e.to_string()))?;
        let mut matched = Self::matching(&guard, difficulty);
        if matched.len() < count as usize {
            return Err(BackendError::NotFound {
                requested: count,
                available: matched.len(),
            });
        }
        matched.truncate(count as usize);
        Ok(matched)
    }

    async fn pool_size(&self, difficulty: Option<&[Difficulty]>) -> Result<usize, BackendError> {
        let guard = self
            .questions
            .lock()
            .map_err(|e| BackendError::Connection(e.to_string()))?;
        Ok(Self::matching(&guard, difficulty).len())
    }
}

#[async_trait]
impl StatsStore for InMemoryBackend {
    async fn submit_stats(&self, submission: &StatsSubmission) -> Result<StatsAck, BackendError> {
        let mut acked = self
            .acked
            .lock()
            .map_err(|e| BackendError::Connection(e.to_string()))?;
        if let Some(previous) = acked.get(&submission.session_id) {
            return Ok(previous.clone());
        }

        let mut stats = self
            .stats
            .lock()
            .map_err(|e| BackendError::Connection(e.to_string()))?;
        let current = stats
            .get(&submission.user_id)
            .cloned()
            .unwrap_or_else(|| UserStats::new(submission.user_id.clone()));
        let updated = current.apply_session(
            submission.score,
            submission.points_earned,
            submission.completed_at,
        );
        stats.insert(submission.user_id.clone(), updated.clone());

        let ack = StatsAck {
            session_id: submission.session_id,
            stats: updated,
        };
        acked.insert(submission.session_id, ack.clone());
        Ok(ack)
    }

    async fn get_stats(&self, user_id: &UserId) -> Result<Option<UserStats>, BackendError> {
        let guard = self
            .stats
            .lock()
            .map_err(|e| BackendError::Connection(e.to_string()))?;
        Ok(guard.get(user_id).cloned())
    }

    async fn list_stats(&self) -> Result<Vec<UserStats>, BackendError> {
        let guard = self
            .stats
            .lock()
            .map_err(|e| BackendError::Connection(e.to_string()))?;
        Ok(guard.values().cloned().collect())
    }
}

/// Aggregates the backend contracts behind trait objects for easy swapping.
#[derive(Clone)]
pub struct Backend {
    pub questions: Arc<dyn QuestionSource>,
    pub stats: Arc<dyn StatsStore>,
}

impl Backend {
    #[must_use]
    pub fn in_memory() -> Self {
        let backend = InMemoryBackend::new();
        let questions: Arc<dyn QuestionSource> = Arc::new(backend.clone());
        let stats: Arc<dyn StatsStore> = Arc::new(backend);
        Self { questions, stats }
    }
}
