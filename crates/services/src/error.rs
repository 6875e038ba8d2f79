//! Shared error types for the services crate.

use thiserror::Error;

use backend::BackendError;
use quiz_core::model::{ConfigError, SessionStateError};
use quiz_core::scoring::ScoringError;

/// Errors emitted by the session controller and workflow.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("user already has an active session")]
    AlreadyActive,

    #[error("session already completed")]
    Completed,

    #[error("choice {choice} is outside the option list of length {options}")]
    ChoiceOutOfRange { choice: usize, options: usize },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    State(#[from] SessionStateError),

    #[error(transparent)]
    Scoring(#[from] ScoringError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Stats(#[from] StatsError),
}

/// Errors emitted by the stats aggregation layer.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StatsError {
    #[error("session has no results to submit")]
    Incomplete,

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Errors emitted by the leaderboard query service.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LeaderboardError {
    #[error(transparent)]
    Backend(#[from] BackendError),
}
