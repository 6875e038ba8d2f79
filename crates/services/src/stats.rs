use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use backend::{StatsStore, StatsSubmission};
use quiz_core::model::{QuizSession, SessionId, UserId, UserStats};

use crate::error::StatsError;

//
// ─── STATS UPDATE ──────────────────────────────────────────────────────────────
//

/// Result of folding one session into a user's stats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsUpdate {
    pub stats: UserStats,
    /// False when the backend write failed and the submission sits in the
    /// pending-sync queue; the stats above are then the local optimistic
    /// copy.
    pub synced: bool,
}

//
// ─── STATS AGGREGATOR ──────────────────────────────────────────────────────────
//

/// Applies completed sessions to user statistics, exactly once per session
/// id.
///
/// The backend write is attempted once per session, with no internal retry.
/// On failure the update still lands on a local optimistic copy and the
/// submission joins an explicit pending queue; `reconcile` flushes that
/// queue when the caller decides the connection is back.
#[derive(Clone)]
pub struct StatsAggregator {
    store: Arc<dyn StatsStore>,
    applied: Arc<Mutex<HashMap<SessionId, StatsUpdate>>>,
    pending: Arc<Mutex<Vec<StatsSubmission>>>,
    local: Arc<Mutex<HashMap<UserId, UserStats>>>,
}

impl StatsAggregator {
    #[must_use]
    pub fn new(store: Arc<dyn StatsStore>) -> Self {
        Self {
            store,
            applied: Arc::new(Mutex::new(HashMap::new())),
            pending: Arc::new(Mutex::new(Vec::new())),
            local: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Number of submissions waiting for a successful backend write.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.lock().map(|p| p.len()).unwrap_or(0)
    }

    /// The freshest stats known for a user: the local optimistic copy if one
    /// exists, otherwise whatever the backend has.
    ///
    /// # Errors
    ///
    /// Returns `StatsError::Backend` when the backend read fails.
    pub async fn stats_for(&self, user_id: &UserId) -> Result<Option<UserStats>, StatsError> {
        if let Ok(local) = self.local.lock()
            && let Some(stats) = local.get(user_id)
        {
            return Ok(Some(stats.clone()));
        }
        Ok(self.store.get_stats(user_id).await?)
    }

    /// Fold a completed session into the user's stats and push the result to
    /// the backend.
    ///
    /// Replaying the same session id returns the previously computed update
    /// without touching points or quiz counts again.
    ///
    /// # Errors
    ///
    /// Returns `StatsError::Incomplete` when the session has no outcome yet.
    /// A failed backend write is not an error here: the update is queued and
    /// the returned `StatsUpdate` is marked unsynced.
    pub async fn apply_session(&self, session: &QuizSession) -> Result<StatsUpdate, StatsError> {
        let submission = StatsSubmission::from_session(session).ok_or(StatsError::Incomplete)?;

        if let Ok(applied) = self.applied.lock()
            && let Some(previous) = applied.get(&submission.session_id)
        {
            debug!(session = %submission.session_id, "stats already applied, returning cached update");
            return Ok(previous.clone());
        }

        let current = match self.stats_for(&submission.user_id).await {
            Ok(Some(stats)) => stats,
            Ok(None) => UserStats::new(submission.user_id.clone()),
            // the read failing does not block the fold; start from empty
            Err(_) => UserStats::new(submission.user_id.clone()),
        };
        let optimistic = current.apply_session(
            submission.score,
            submission.points_earned,
            submission.completed_at,
        );

        let update = match self.store.submit_stats(&submission).await {
            Ok(ack) => {
                debug!(session = %submission.session_id, "stats submission acknowledged");
                StatsUpdate {
                    stats: ack.stats,
                    synced: true,
                }
            }
            Err(err) => {
                warn!(
                    session = %submission.session_id,
                    error = %err,
                    "stats submission failed, queueing for reconciliation"
                );
                if let Ok(mut pending) = self.pending.lock() {
                    pending.push(submission.clone());
                }
                StatsUpdate {
                    stats: optimistic,
                    synced: false,
                }
            }
        };

        if let Ok(mut local) = self.local.lock() {
            local.insert(submission.user_id.clone(), update.stats.clone());
        }
        if let Ok(mut applied) = self.applied.lock() {
            applied.insert(submission.session_id, update.clone());
        }
        Ok(update)
    }

    /// Flush the pending-sync queue, oldest first.
    ///
    /// Stops at the first failure and requeues everything not yet written.
    /// Returns how many submissions were flushed.
    ///
    /// # Errors
    ///
    /// Returns `StatsError::Backend` for the submission that failed.
    pub async fn reconcile(&self) -> Result<usize, StatsError> {
        let mut queue: VecDeque<StatsSubmission> = match self.pending.lock() {
            Ok(mut pending) => pending.drain(..).collect(),
            Err(_) => VecDeque::new(),
        };
        if queue.is_empty() {
            return Ok(0);
        }

        let mut flushed = 0;
        while let Some(submission) = queue.pop_front() {
            match self.store.submit_stats(&submission).await {
                Ok(ack) => {
                    flushed += 1;
                    if let Ok(mut local) = self.local.lock() {
                        local.insert(submission.user_id.clone(), ack.stats.clone());
                    }
                    if let Ok(mut applied) = self.applied.lock() {
                        applied.insert(
                            submission.session_id,
                            StatsUpdate {
                                stats: ack.stats,
                                synced: true,
                            },
                        );
                    }
                }
                Err(err) => {
                    warn!(session = %submission.session_id, error = %err, "reconciliation halted");
                    if let Ok(mut pending) = self.pending.lock() {
                        pending.push(submission);
                        pending.extend(queue);
                    }
                    return Err(err.into());
                }
            }
        }

        debug!(flushed, "reconciliation drained the pending queue");
        Ok(flushed)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
