use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::question::Difficulty;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Errors produced while turning a quiz request into a concrete config.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("unrecognized quiz mode: {0}")]
    UnknownMode(String),

    #[error("unrecognized timed preset: {0}")]
    UnknownPreset(String),

    #[error("a quiz needs at least one question")]
    ZeroQuestions,

    #[error("requested {requested} questions but only {available} are available")]
    CountExceedsPool { requested: u32, available: usize },

    #[error("timed mode requires a preset with a time limit")]
    MissingTimeLimit,

    #[error("time limit must be greater than zero seconds")]
    NonPositiveTimeLimit,
}

//
// ─── MODE & PRESETS ────────────────────────────────────────────────────────────
//

/// Fixed question count for quick mode.
pub const QUICK_QUESTION_COUNT: u32 = 5;

/// How a quiz is configured: a fixed quick round, a preset countdown, or a
/// fully user-chosen setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizMode {
    Quick,
    Timed,
    Custom,
}

impl QuizMode {
    /// The wire name of this mode.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuizMode::Quick => "quick",
            QuizMode::Timed => "timed",
            QuizMode::Custom => "custom",
        }
    }
}

impl fmt::Display for QuizMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for QuizMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "quick" => Ok(Self::Quick),
            "timed" => Ok(Self::Timed),
            "custom" => Ok(Self::Custom),
            other => Err(ConfigError::UnknownMode(other.to_string())),
        }
    }
}

/// User-selectable presets for timed mode. Each preset fixes both the
/// question count and the countdown length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimedPreset {
    /// 5 questions in 5 minutes.
    Sprint,
    /// 10 questions in 10 minutes.
    Standard,
    /// 20 questions in 20 minutes.
    Marathon,
}

impl TimedPreset {
    #[must_use]
    pub fn question_count(self) -> u32 {
        match self {
            TimedPreset::Sprint => 5,
            TimedPreset::Standard => 10,
            TimedPreset::Marathon => 20,
        }
    }

    #[must_use]
    pub fn time_limit_seconds(self) -> u32 {
        match self {
            TimedPreset::Sprint => 300,
            TimedPreset::Standard => 600,
            TimedPreset::Marathon => 1200,
        }
    }
}

impl FromStr for TimedPreset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sprint" => Ok(Self::Sprint),
            "standard" => Ok(Self::Standard),
            "marathon" => Ok(Self::Marathon),
            other => Err(ConfigError::UnknownPreset(other.to_string())),
        }
    }
}

//
// ─── REQUEST → CONFIG ──────────────────────────────────────────────────────────
//

/// A quiz setup as requested by the user, before validation.
///
/// Quick mode ignores every override; timed mode reads its numbers from the
/// preset; custom mode takes the user's own count and optional limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizRequest {
    pub mode: QuizMode,
    pub preset: Option<TimedPreset>,
    pub question_count: Option<u32>,
    pub time_limit_seconds: Option<u32>,
    pub difficulty: Option<Vec<Difficulty>>,
}

impl QuizRequest {
    /// A quick round: five questions, no countdown.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            mode: QuizMode::Quick,
            preset: None,
            question_count: None,
            time_limit_seconds: None,
            difficulty: None,
        }
    }

    /// A timed round driven by the given preset.
    #[must_use]
    pub fn timed(preset: TimedPreset) -> Self {
        Self {
            mode: QuizMode::Timed,
            preset: Some(preset),
            question_count: None,
            time_limit_seconds: None,
            difficulty: None,
        }
    }

    /// A custom round with a user-chosen count and optional countdown.
    #[must_use]
    pub fn custom(question_count: u32, time_limit_seconds: Option<u32>) -> Self {
        Self {
            mode: QuizMode::Custom,
            preset: None,
            question_count: Some(question_count),
            time_limit_seconds,
            difficulty: None,
        }
    }

    /// Restrict the question pool to the given difficulties.
    #[must_use]
    pub fn with_difficulty(mut self, difficulty: Vec<Difficulty>) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    /// Validate the request against the size of the available question pool.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when timed mode lacks a preset, when a custom
    /// count is zero or exceeds the pool, or when a custom time limit is
    /// zero.
    pub fn validate(self, pool_size: usize) -> Result<QuizConfig, ConfigError> {
        let (question_count, time_limit_seconds) = match self.mode {
            QuizMode::Quick => (QUICK_QUESTION_COUNT, None),
            QuizMode::Timed => {
                let preset = self.preset.ok_or(ConfigError::MissingTimeLimit)?;
                (preset.question_count(), Some(preset.time_limit_seconds()))
            }
            QuizMode::Custom => {
                let count = self.question_count.ok_or(ConfigError::ZeroQuestions)?;
                if count == 0 {
                    return Err(ConfigError::ZeroQuestions);
                }
                if count as usize > pool_size {
                    return Err(ConfigError::CountExceedsPool {
                        requested: count,
                        available: pool_size,
                    });
                }
                if self.time_limit_seconds == Some(0) {
                    return Err(ConfigError::NonPositiveTimeLimit);
                }
                (count, self.time_limit_seconds)
            }
        };

        Ok(QuizConfig {
            mode: self.mode,
            question_count,
            time_limit_seconds,
            difficulty: self.difficulty,
        })
    }
}

/// A validated, concrete quiz configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizConfig {
    mode: QuizMode,
    question_count: u32,
    time_limit_seconds: Option<u32>,
    difficulty: Option<Vec<Difficulty>>,
}

impl QuizConfig {
    #[must_use]
    pub fn mode(&self) -> QuizMode {
        self.mode
    }

    #[must_use]
    pub fn question_count(&self) -> u32 {
        self.question_count
    }

    #[must_use]
    pub fn time_limit_seconds(&self) -> Option<u32> {
        self.time_limit_seconds
    }

    #[must_use]
    pub fn difficulty(&self) -> Option<&[Difficulty]> {
        self.difficulty.as_deref()
    }

    /// Whether this config runs under a countdown.
    #[must_use]
    pub fn is_timed(&self) -> bool {
        self.time_limit_seconds.is_some()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quick_mode_is_five_questions_without_limit() {
        let config = QuizRequest::quick().validate(50).unwrap();
        assert_eq!(config.mode(), QuizMode::Quick);
        assert_eq!(config.question_count(), 5);
        assert_eq!(config.time_limit_seconds(), None);
        assert!(!config.is_timed());
    }

    #[test]
    fn timed_mode_reads_numbers_from_preset() {
        let config = QuizRequest::timed(TimedPreset::Standard)
            .validate(50)
            .unwrap();
        assert_eq!(config.question_count(), 10);
        assert_eq!(config.time_limit_seconds(), Some(600));
        assert!(config.is_timed());
    }

    #[test]
    fn timed_mode_without_preset_is_rejected() {
        let request = QuizRequest {
            mode: QuizMode::Timed,
            preset: None,
            question_count: None,
            time_limit_seconds: None,
            difficulty: None,
        };
        let err = request.validate(50).unwrap_err();
        assert!(matches!(err, ConfigError::MissingTimeLimit));
    }

    #[test]
    fn custom_mode_accepts_user_numbers() {
        let config = QuizRequest::custom(12, Some(900)).validate(50).unwrap();
        assert_eq!(config.question_count(), 12);
        assert_eq!(config.time_limit_seconds(), Some(900));
    }

    #[test]
    fn custom_mode_rejects_zero_questions() {
        let err = QuizRequest::custom(0, None).validate(50).unwrap_err();
        assert!(matches!(err, ConfigError::ZeroQuestions));
    }

    #[test]
    fn custom_mode_rejects_count_beyond_pool() {
        let err = QuizRequest::custom(20, None).validate(10).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::CountExceedsPool {
                requested: 20,
                available: 10
            }
        ));
    }

    #[test]
    fn custom_mode_rejects_zero_time_limit() {
        let err = QuizRequest::custom(5, Some(0)).validate(50).unwrap_err();
        assert!(matches!(err, ConfigError::NonPositiveTimeLimit));
    }

    #[test]
    fn difficulty_filter_is_carried_through() {
        let config = QuizRequest::quick()
            .with_difficulty(vec![Difficulty::Hard])
            .validate(50)
            .unwrap();
        assert_eq!(config.difficulty(), Some(&[Difficulty::Hard][..]));
    }

    #[test]
    fn mode_parses_wire_names() {
        assert_eq!("quick".parse::<QuizMode>().unwrap(), QuizMode::Quick);
        assert_eq!("custom".parse::<QuizMode>().unwrap(), QuizMode::Custom);
        let err = "blitz".parse::<QuizMode>().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownMode(_)));
    }

    #[test]
    fn preset_parses_wire_names() {
        assert_eq!(
            "standard".parse::<TimedPreset>().unwrap(),
            TimedPreset::Standard
        );
        let err = "endless".parse::<TimedPreset>().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownPreset(_)));
    }
}
