use thiserror::Error;

use crate::model::{ConfigError, QuestionError, SessionStateError, UserStatsError};
use crate::scoring::ScoringError;

/// Umbrella error for the core domain layer.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Session(#[from] SessionStateError),
    #[error(transparent)]
    Stats(#[from] UserStatsError),
    #[error(transparent)]
    Scoring(#[from] ScoringError),
}
