pub(crate) mod config;
pub(crate) mod ids;
pub(crate) mod question;
pub(crate) mod session;
pub(crate) mod stats;

pub use config::{
    ConfigError, QUICK_QUESTION_COUNT, QuizConfig, QuizMode, QuizRequest, TimedPreset,
};
pub use ids::{ParseIdError, QuestionId, SessionId, UserId};
pub use question::{
    Category, Difficulty, MAX_OPTIONS, MIN_OPTIONS, Question, QuestionDraft, QuestionError,
    ValidatedQuestion,
};
pub use session::{QuizSession, SessionOutcome, SessionStateError, SessionStatus};
pub use stats::{UserStats, UserStatsError};
