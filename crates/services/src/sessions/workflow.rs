use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rand::seq::SliceRandom;
use tracing::{debug, info};

use backend::QuestionSource;
use quiz_core::Clock;
use quiz_core::model::{QuizRequest, SessionId, SessionOutcome, UserId, UserStats};

use super::service::{AdvanceResult, SessionController, Tick};
use crate::error::{SessionError, StatsError};
use crate::stats::StatsAggregator;

//
// ─── COMPLETION REPORT ─────────────────────────────────────────────────────────
//

/// Everything the host needs to render a results screen: the session's
/// terminal numbers and the user's updated stats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCompletion {
    pub outcome: SessionOutcome,
    pub stats: UserStats,
    /// False when the stats write is still waiting in the pending-sync
    /// queue.
    pub synced: bool,
}

//
// ─── QUIZ WORKFLOW ─────────────────────────────────────────────────────────────
//

/// Orchestrates session start, answering, and completion against the
/// question bank and the stats layer.
///
/// Holds the one-active-session-per-user registry. That rule lives entirely
/// on this side of the wire; the backend is only protected by the session-id
/// idempotency key.
#[derive(Clone)]
pub struct QuizWorkflow {
    clock: Clock,
    questions: Arc<dyn QuestionSource>,
    stats: StatsAggregator,
    active: Arc<Mutex<HashMap<UserId, SessionId>>>,
    shuffle: bool,
}

impl QuizWorkflow {
    #[must_use]
    pub fn new(clock: Clock, questions: Arc<dyn QuestionSource>, stats: StatsAggregator) -> Self {
        Self {
            clock,
            questions,
            stats,
            active: Arc::new(Mutex::new(HashMap::new())),
            shuffle: false,
        }
    }

    /// Enable or disable shuffling of the fetched question order.
    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Advance a fixed workflow clock; has no effect on the system clock.
    pub fn advance_clock(&mut self, delta: chrono::Duration) {
        self.clock.advance(delta);
    }

    /// The stats layer, for reads and for driving reconciliation.
    #[must_use]
    pub fn stats(&self) -> &StatsAggregator {
        &self.stats
    }

    /// Whether a user currently holds an active session slot.
    #[must_use]
    pub fn has_active_session(&self, user_id: &UserId) -> bool {
        self.active
            .lock()
            .map(|active| active.contains_key(user_id))
            .unwrap_or(false)
    }

    /// Validate the request, resolve questions from the bank, and start a
    /// new session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyActive` when the user still holds an
    /// active session, config errors from validation, and
    /// `BackendError::NotFound` when the bank cannot supply enough
    /// questions (no partial session is created).
    pub async fn start_session(
        &self,
        user_id: UserId,
        request: QuizRequest,
    ) -> Result<SessionController, SessionError> {
        if self.has_active_session(&user_id) {
            return Err(SessionError::AlreadyActive);
        }

        let difficulty = request.difficulty.clone();
        let pool = self.questions.pool_size(difficulty.as_deref()).await?;
        let config = request.validate(pool)?;

        let mut fetched = self
            .questions
            .fetch_questions(config.question_count(), config.difficulty())
            .await?;
        if self.shuffle {
            fetched.shuffle(&mut rand::rng());
        }

        let controller =
            SessionController::start(user_id.clone(), config, fetched, self.clock.now())?;
        if let Ok(mut active) = self.active.lock() {
            active.insert(user_id, controller.session_id());
        }
        info!(
            session = %controller.session_id(),
            mode = %controller.session().mode(),
            questions = controller.questions().len(),
            "quiz session started"
        );
        Ok(controller)
    }

    /// Record an answer on the active session.
    ///
    /// # Errors
    ///
    /// Propagates controller errors (inactive session, bad indices).
    pub fn answer(
        &self,
        controller: &mut SessionController,
        question_index: usize,
        choice: usize,
    ) -> Result<(), SessionError> {
        controller.submit_answer(question_index, choice)
    }

    /// Advance past the current question; completing the last one scores
    /// the session and folds it into the user's stats.
    ///
    /// # Errors
    ///
    /// Propagates controller and stats errors.
    pub async fn advance(
        &self,
        controller: &mut SessionController,
    ) -> Result<(AdvanceResult, Option<SessionCompletion>), SessionError> {
        let result = controller.advance(self.clock.now())?;
        let completion = if result.is_complete {
            Some(self.finalize(controller).await?)
        } else {
            None
        };
        Ok((result, completion))
    }

    /// Drive time-dependent transitions: activation after the preparation
    /// delay and, for timed sessions, countdown expiry (which completes the
    /// session with its unanswered slots still empty).
    ///
    /// # Errors
    ///
    /// Propagates controller and stats errors.
    pub async fn tick(
        &self,
        controller: &mut SessionController,
    ) -> Result<(Tick, Option<SessionCompletion>), SessionError> {
        let was_complete = controller.is_complete();
        let tick = controller.tick(self.clock.now())?;
        let completion = if !was_complete && controller.is_complete() {
            Some(self.finalize(controller).await?)
        } else {
            None
        };
        Ok((tick, completion))
    }

    /// Drop an attempt: the timer stops, the in-memory session is
    /// discarded, and the user's active slot frees up. Nothing is scored or
    /// persisted.
    pub fn abandon(&self, controller: SessionController) {
        if let Ok(mut active) = self.active.lock() {
            active.remove(controller.session().user_id());
        }
        debug!(session = %controller.session_id(), "quiz session abandoned");
        controller.abandon();
    }

    async fn finalize(
        &self,
        controller: &SessionController,
    ) -> Result<SessionCompletion, SessionError> {
        let session = controller.session();
        let update = self.stats.apply_session(session).await?;
        if let Ok(mut active) = self.active.lock() {
            active.remove(session.user_id());
        }

        let outcome = *session.outcome().ok_or(StatsError::Incomplete)?;
        info!(
            session = %session.id(),
            score = outcome.score,
            points = outcome.points_earned,
            synced = update.synced,
            "quiz session completed"
        );
        Ok(SessionCompletion {
            outcome,
            stats: update.stats,
            synced: update.synced,
        })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use backend::{InMemoryBackend, StatsStore};
    use quiz_core::model::{Category, Difficulty, Question, QuestionDraft, QuestionId};
    use quiz_core::time::fixed_clock;

    fn build_question(id: u64, difficulty: Difficulty) -> Question {
        QuestionDraft {
            stem: format!("Question {id}"),
            options: vec!["A".into(), "B".into(), "C".into()],
            correct_answer: 0,
            difficulty,
            category: Category::new("General").unwrap(),
        }
        .validate()
        .unwrap()
        .assign_id(QuestionId::new(id))
    }

    fn seeded_workflow(question_count: u64) -> QuizWorkflow {
        let backend = InMemoryBackend::new();
        for id in 1..=question_count {
            backend.add_question(build_question(id, Difficulty::Easy));
        }
        let stats_store: Arc<dyn StatsStore> = Arc::new(backend.clone());
        QuizWorkflow::new(
            fixed_clock(),
            Arc::new(backend),
            StatsAggregator::new(stats_store),
        )
    }

    #[tokio::test]
    async fn start_resolves_the_configured_question_count() {
        let workflow = seeded_workflow(10);
        let controller = workflow
            .start_session(UserId::new("user-1"), QuizRequest::quick())
            .await
            .unwrap();

        assert_eq!(controller.questions().len(), 5);
        assert!(workflow.has_active_session(&UserId::new("user-1")));
    }

    #[tokio::test]
    async fn a_second_session_for_the_same_user_conflicts() {
        let workflow = seeded_workflow(10);
        let _first = workflow
            .start_session(UserId::new("user-1"), QuizRequest::quick())
            .await
            .unwrap();

        let err = workflow
            .start_session(UserId::new("user-1"), QuizRequest::quick())
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::AlreadyActive));
    }

    #[tokio::test]
    async fn different_users_run_sessions_side_by_side() {
        let workflow = seeded_workflow(10);
        let _a = workflow
            .start_session(UserId::new("user-1"), QuizRequest::quick())
            .await
            .unwrap();
        let _b = workflow
            .start_session(UserId::new("user-2"), QuizRequest::quick())
            .await
            .unwrap();
        assert!(workflow.has_active_session(&UserId::new("user-2")));
    }

    #[tokio::test]
    async fn a_failed_start_leaves_no_active_slot() {
        let workflow = seeded_workflow(3);
        let err = workflow
            .start_session(UserId::new("user-1"), QuizRequest::custom(8, None))
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::Config(_)));
        assert!(!workflow.has_active_session(&UserId::new("user-1")));
    }

    #[tokio::test]
    async fn abandoning_frees_the_active_slot() {
        let workflow = seeded_workflow(10);
        let controller = workflow
            .start_session(UserId::new("user-1"), QuizRequest::quick())
            .await
            .unwrap();

        workflow.abandon(controller);

        assert!(!workflow.has_active_session(&UserId::new("user-1")));
        // a fresh attempt starts cleanly
        workflow
            .start_session(UserId::new("user-1"), QuizRequest::quick())
            .await
            .unwrap();
    }
}
