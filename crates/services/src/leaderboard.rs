use std::sync::Arc;

use backend::StatsStore;
use quiz_core::leaderboard::{self, LeaderboardEntry};

use crate::error::LeaderboardError;

/// Read-only standings query over the stats store.
///
/// The board is a derived view: every call re-reads the stats and re-ranks
/// them, so it never holds state of its own.
#[derive(Clone)]
pub struct LeaderboardService {
    store: Arc<dyn StatsStore>,
}

impl LeaderboardService {
    #[must_use]
    pub fn new(store: Arc<dyn StatsStore>) -> Self {
        Self { store }
    }

    /// The full ranked board.
    ///
    /// # Errors
    ///
    /// Returns `LeaderboardError::Backend` when the stats read fails.
    pub async fn standings(&self) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        let stats = self.store.list_stats().await?;
        Ok(leaderboard::rank(&stats))
    }

    /// The first `limit` rows of the board.
    ///
    /// # Errors
    ///
    /// Returns `LeaderboardError::Backend` when the stats read fails.
    pub async fn top(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        let mut board = self.standings().await?;
        board.truncate(limit);
        Ok(board)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backend::{InMemoryBackend, StatsSubmission};
    use quiz_core::model::{SessionId, UserId};
    use quiz_core::time::fixed_now;

    async fn submit(backend: &InMemoryBackend, user: &str, score: u8, points: u32) {
        backend
            .submit_stats(&StatsSubmission {
                session_id: SessionId::generate(),
                user_id: UserId::new(user),
                score,
                points_earned: points,
                time_spent_seconds: 60,
                completed_at: fixed_now(),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn standings_rank_every_user() {
        let backend = InMemoryBackend::new();
        submit(&backend, "A", 90, 100).await;
        submit(&backend, "B", 95, 100).await;
        submit(&backend, "C", 99, 90).await;

        let service = LeaderboardService::new(Arc::new(backend));
        let board = service.standings().await.unwrap();

        assert_eq!(board.len(), 3);
        assert_eq!(board[0].user_id, UserId::new("B"));
        assert_eq!(board[1].user_id, UserId::new("A"));
        assert_eq!(board[2].user_id, UserId::new("C"));
        assert_eq!(
            board.iter().map(|e| e.rank).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[tokio::test]
    async fn top_truncates_the_board() {
        let backend = InMemoryBackend::new();
        submit(&backend, "A", 80, 100).await;
        submit(&backend, "B", 80, 200).await;
        submit(&backend, "C", 80, 50).await;

        let service = LeaderboardService::new(Arc::new(backend));
        let top = service.top(2).await.unwrap();

        assert_eq!(top.len(), 2);
        assert_eq!(top[0].user_id, UserId::new("B"));
    }

    #[tokio::test]
    async fn an_empty_store_yields_an_empty_board() {
        let service = LeaderboardService::new(Arc::new(InMemoryBackend::new()));
        assert!(service.standings().await.unwrap().is_empty());
    }
}
