use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::config::{QuizConfig, QuizMode};
use crate::model::ids::{QuestionId, SessionId, UserId};
use crate::scoring::ScoreBreakdown;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Errors raised by session lifecycle transitions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionStateError {
    #[error("session holds {actual} questions but the config asks for {expected}")]
    QuestionCountMismatch { expected: u32, actual: usize },

    #[error("session has already begun")]
    NotInSetup,

    #[error("session is not preparing")]
    NotStarting,

    #[error("session is not active")]
    NotActive,

    #[error("session already completed")]
    Completed,

    #[error("question index {index} is outside the session of {len} questions")]
    AnswerIndexOutOfRange { index: usize, len: usize },
}

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

/// Lifecycle of a quiz attempt. Transitions only move forward; a retry is a
/// brand-new session with a fresh id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Config validated, questions not yet committed.
    Setup,
    /// Questions resolved; waiting out the short preparation countdown.
    Starting,
    /// Accepting answers.
    Active,
    /// Scored and frozen. Terminal.
    Results,
}

//
// ─── OUTCOME ───────────────────────────────────────────────────────────────────
//

/// Terminal numbers of a completed session. Written once on entering
/// `Results` and never touched again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOutcome {
    pub score: u8,
    pub points_earned: u32,
    pub correct_count: u32,
    pub time_spent_seconds: u32,
}

impl SessionOutcome {
    #[must_use]
    pub fn new(breakdown: ScoreBreakdown, time_spent_seconds: u32) -> Self {
        Self {
            score: breakdown.score,
            points_earned: breakdown.points_earned,
            correct_count: breakdown.correct_count,
            time_spent_seconds,
        }
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One quiz attempt from configuration to results.
///
/// The answer list always has the same length as the question list; `None`
/// means unanswered. All mutation goes through the lifecycle methods below,
/// each of which refuses to run outside its valid state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSession {
    id: SessionId,
    user_id: UserId,
    config: QuizConfig,
    question_ids: Vec<QuestionId>,
    answers: Vec<Option<usize>>,
    status: SessionStatus,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    outcome: Option<SessionOutcome>,
}

impl QuizSession {
    /// Create a session in `Setup` over the given resolved questions.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::QuestionCountMismatch` if the question
    /// list does not match the config's count.
    pub fn new(
        id: SessionId,
        user_id: UserId,
        config: QuizConfig,
        question_ids: Vec<QuestionId>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, SessionStateError> {
        if question_ids.len() != config.question_count() as usize {
            return Err(SessionStateError::QuestionCountMismatch {
                expected: config.question_count(),
                actual: question_ids.len(),
            });
        }

        let answers = vec![None; question_ids.len()];
        Ok(Self {
            id,
            user_id,
            config,
            question_ids,
            answers,
            status: SessionStatus::Setup,
            created_at,
            completed_at: None,
            outcome: None,
        })
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn mode(&self) -> QuizMode {
        self.config.mode()
    }

    #[must_use]
    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    #[must_use]
    pub fn question_ids(&self) -> &[QuestionId] {
        &self.question_ids
    }

    #[must_use]
    pub fn answers(&self) -> &[Option<usize>] {
        &self.answers
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Terminal numbers, present only once the session reached `Results`.
    #[must_use]
    pub fn outcome(&self) -> Option<&SessionOutcome> {
        self.outcome.as_ref()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status == SessionStatus::Results
    }

    /// Number of questions answered so far.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_some()).count()
    }

    /// `Setup → Starting`: the questions are committed and the preparation
    /// countdown starts.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::NotInSetup` outside `Setup`.
    pub fn begin(&mut self) -> Result<(), SessionStateError> {
        if self.status != SessionStatus::Setup {
            return Err(SessionStateError::NotInSetup);
        }
        self.status = SessionStatus::Starting;
        Ok(())
    }

    /// `Starting → Active`: the preparation countdown elapsed.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::NotStarting` outside `Starting`.
    pub fn activate(&mut self) -> Result<(), SessionStateError> {
        if self.status != SessionStatus::Starting {
            return Err(SessionStateError::NotStarting);
        }
        self.status = SessionStatus::Active;
        Ok(())
    }

    /// Record an answer for the question at `index`. Re-answering a question
    /// overwrites the previous choice (last write wins).
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::NotActive` outside `Active` and
    /// `SessionStateError::AnswerIndexOutOfRange` for a bad index.
    pub fn record_answer(&mut self, index: usize, choice: usize) -> Result<(), SessionStateError> {
        if self.status != SessionStatus::Active {
            return Err(SessionStateError::NotActive);
        }
        let len = self.answers.len();
        let slot = self
            .answers
            .get_mut(index)
            .ok_or(SessionStateError::AnswerIndexOutOfRange { index, len })?;
        *slot = Some(choice);
        Ok(())
    }

    /// `Active → Results`: freeze the session with its scored outcome.
    ///
    /// Unanswered slots stay `None`; forced completion on timer expiry goes
    /// through this same transition.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::Completed` if already in `Results`, or
    /// `SessionStateError::NotActive` for any other non-active state.
    pub fn complete(
        &mut self,
        breakdown: ScoreBreakdown,
        time_spent_seconds: u32,
        completed_at: DateTime<Utc>,
    ) -> Result<(), SessionStateError> {
        match self.status {
            SessionStatus::Results => Err(SessionStateError::Completed),
            SessionStatus::Active => {
                self.outcome = Some(SessionOutcome::new(breakdown, time_spent_seconds));
                self.completed_at = Some(completed_at);
                self.status = SessionStatus::Results;
                Ok(())
            }
            _ => Err(SessionStateError::NotActive),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
