use chrono::{DateTime, Duration, Utc};
use std::fmt;

use quiz_core::model::{
    Question, QuizConfig, QuizSession, SessionId, SessionStateError, SessionStatus, UserId,
};
use quiz_core::scoring::score_session;

use super::progress::SessionProgress;
use super::timer::{SessionTimer, TimerEvent};
use crate::error::SessionError;

/// Seconds between `Starting` and `Active`. A UI transition pause only; it
/// carries no scoring meaning.
pub const PREPARATION_DELAY_SECONDS: u32 = 3;

//
// ─── TICK & ADVANCE RESULTS ────────────────────────────────────────────────────
//

/// What one controller tick observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Still waiting out the preparation delay.
    Preparing,
    /// Just moved from `Starting` to `Active`.
    Activated,
    /// Accepting answers; `remaining_seconds` is set for timed sessions.
    Running { remaining_seconds: Option<u32> },
    /// The session is in `Results` (including by timer expiry).
    Completed,
}

/// Result of advancing past the current question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvanceResult {
    /// Index of the next question, `None` when the session just finished.
    pub next_index: Option<usize>,
    pub is_complete: bool,
}

//
// ─── SESSION CONTROLLER ────────────────────────────────────────────────────────
//

/// Drives one quiz attempt through its lifecycle.
///
/// Owns the `QuizSession` together with its resolved questions, the active
/// question pointer and, in timed mode, the countdown. All host interaction
/// is synchronous; `tick` is the only entry point that reacts to the passage
/// of time (preparation delay and timer expiry).
pub struct SessionController {
    session: QuizSession,
    questions: Vec<Question>,
    current: usize,
    prepare_until: DateTime<Utc>,
    activated_at: Option<DateTime<Utc>>,
    timer: Option<SessionTimer>,
}

impl SessionController {
    /// Create a session over the resolved questions and begin preparing.
    ///
    /// `now` should come from the services layer clock to keep time
    /// deterministic.
    ///
    /// # Errors
    ///
    /// Propagates `SessionStateError` if the question list does not match
    /// the config.
    pub fn start(
        user_id: UserId,
        config: QuizConfig,
        questions: Vec<Question>,
        now: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        let question_ids = questions.iter().map(Question::id).collect();
        let mut session =
            QuizSession::new(SessionId::generate(), user_id, config, question_ids, now)?;
        session.begin()?;

        Ok(Self {
            session,
            questions,
            current: 0,
            prepare_until: now + Duration::seconds(i64::from(PREPARATION_DELAY_SECONDS)),
            activated_at: None,
            timer: None,
        })
    }

    #[must_use]
    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session.id()
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.session.is_complete()
    }

    /// Countdown remaining at `now`, for timed sessions only.
    #[must_use]
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> Option<u32> {
        self.timer.as_ref().map(|t| t.remaining_seconds(now))
    }

    /// Returns a summary of the current session progress.
    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.questions.len();
        let answered = self.session.answered_count();
        SessionProgress {
            total,
            answered,
            remaining: total.saturating_sub(answered),
            is_complete: self.is_complete(),
        }
    }

    /// React to the passage of time: finish the preparation delay, tick the
    /// countdown, and force completion on expiry.
    ///
    /// # Errors
    ///
    /// Propagates scoring or state errors from a forced completion.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Result<Tick, SessionError> {
        match self.session.status() {
            SessionStatus::Setup | SessionStatus::Starting => {
                if now < self.prepare_until {
                    return Ok(Tick::Preparing);
                }
                self.session.activate()?;
                self.activated_at = Some(now);
                self.timer = self
                    .session
                    .config()
                    .time_limit_seconds()
                    .map(|limit| SessionTimer::new(now, limit));
                Ok(Tick::Activated)
            }
            SessionStatus::Active => {
                if let Some(timer) = self.timer.as_mut() {
                    match timer.poll(now) {
                        Some(TimerEvent::Expired) => {
                            self.finish(now)?;
                            return Ok(Tick::Completed);
                        }
                        Some(TimerEvent::Tick { remaining_seconds }) => {
                            return Ok(Tick::Running {
                                remaining_seconds: Some(remaining_seconds),
                            });
                        }
                        None => {}
                    }
                }
                Ok(Tick::Running {
                    remaining_seconds: None,
                })
            }
            SessionStatus::Results => Ok(Tick::Completed),
        }
    }

    /// Record a choice for the question at `question_index`. Re-answering
    /// overwrites (last write wins).
    ///
    /// # Errors
    ///
    /// Returns `SessionError::ChoiceOutOfRange` for a choice beyond the
    /// question's options, and propagates state errors for inactive
    /// sessions or a bad question index.
    pub fn submit_answer(
        &mut self,
        question_index: usize,
        choice: usize,
    ) -> Result<(), SessionError> {
        if let Some(question) = self.questions.get(question_index) {
            let options = question.options().len();
            if choice >= options {
                return Err(SessionError::ChoiceOutOfRange { choice, options });
            }
        }
        self.session.record_answer(question_index, choice)?;
        Ok(())
    }

    /// Move the pointer past the current question; finishing the last one
    /// scores the session and freezes it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` on a finished session and
    /// propagates state errors otherwise.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Result<AdvanceResult, SessionError> {
        match self.session.status() {
            SessionStatus::Results => return Err(SessionError::Completed),
            SessionStatus::Active => {}
            _ => return Err(SessionStateError::NotActive.into()),
        }

        self.current += 1;
        if self.current >= self.questions.len() {
            self.finish(now)?;
            return Ok(AdvanceResult {
                next_index: None,
                is_complete: true,
            });
        }
        Ok(AdvanceResult {
            next_index: Some(self.current),
            is_complete: false,
        })
    }

    /// Cancel the countdown and discard the attempt. There is no resume.
    pub fn abandon(mut self) {
        if let Some(timer) = self.timer.as_mut() {
            timer.cancel();
        }
    }

    /// Score the frozen answers and enter `Results`. Unanswered slots stay
    /// `None` and count as incorrect.
    fn finish(&mut self, now: DateTime<Utc>) -> Result<(), SessionError> {
        let breakdown = score_session(&self.questions, self.session.answers())?;

        let elapsed = self
            .activated_at
            .map(|t| now.signed_duration_since(t).num_seconds())
            .unwrap_or(0);
        let mut time_spent = u32::try_from(elapsed).unwrap_or(0);
        if let Some(limit) = self.session.config().time_limit_seconds() {
            time_spent = time_spent.min(limit);
        }

        self.session.complete(breakdown, time_spent, now)?;
        if let Some(timer) = self.timer.as_mut() {
            timer.cancel();
        }
        Ok(())
    }
}

impl fmt::Debug for SessionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionController")
            .field("session_id", &self.session.id())
            .field("status", &self.session.status())
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("timed", &self.timer.is_some())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
