use serde::{Deserialize, Serialize};

use crate::model::ids::UserId;
use crate::model::stats::UserStats;

//
// ─── LEADERBOARD ENTRY ─────────────────────────────────────────────────────────
//

/// One row of the ranked leaderboard. A derived view, recomputed on demand;
/// it owns nothing persistent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub user_id: UserId,
    pub points: u32,
    pub accuracy: u8,
    /// Dense sequential rank, 1-based. No gaps, no shared ranks.
    pub rank: u32,
}

//
// ─── RANKER ────────────────────────────────────────────────────────────────────
//

/// Rank a set of user stats into a deterministic total order.
///
/// Sorted by points descending, then accuracy descending, then user id
/// ascending so exact ties still order the same way every time. Ranks are
/// dense: 1..N with no duplicates and no gaps.
#[must_use]
pub fn rank(stats: &[UserStats]) -> Vec<LeaderboardEntry> {
    let mut ordered: Vec<&UserStats> = stats.iter().collect();
    ordered.sort_by(|a, b| {
        b.points()
            .cmp(&a.points())
            .then(b.accuracy().cmp(&a.accuracy()))
            .then(a.user_id().cmp(b.user_id()))
    });

    ordered
        .into_iter()
        .zip(1_u32..)
        .map(|(stats, rank)| LeaderboardEntry {
            user_id: stats.user_id().clone(),
            points: stats.points(),
            accuracy: stats.accuracy(),
            rank,
        })
        .collect()
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
