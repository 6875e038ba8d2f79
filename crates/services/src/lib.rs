#![forbid(unsafe_code)]

pub mod error;
pub mod leaderboard;
pub mod question_gateway;
pub mod sessions;
pub mod stats;
pub mod stats_gateway;

pub use quiz_core::Clock;

pub use error::{LeaderboardError, SessionError, StatsError};
pub use leaderboard::LeaderboardService;
pub use question_gateway::HttpQuestionGateway;
pub use stats::{StatsAggregator, StatsUpdate};
pub use stats_gateway::{HttpStatsGateway, StatsApiConfig};

pub use sessions::{
    AdvanceResult, QuizWorkflow, SessionCompletion, SessionController, SessionProgress,
    SessionTimer, Tick, TimerEvent,
};
