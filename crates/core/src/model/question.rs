use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Errors that can occur while validating question content.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question stem cannot be empty")]
    EmptyStem,

    #[error("question needs between {min} and {max} options, got {len}")]
    OptionCountOutOfRange { len: usize, min: usize, max: usize },

    #[error("option {index} is blank")]
    BlankOption { index: usize },

    #[error("correct answer index {index} is outside the option list of length {len}")]
    CorrectAnswerOutOfRange { index: usize, len: usize },

    #[error("invalid difficulty value: {0}")]
    InvalidDifficulty(String),

    #[error("category cannot be empty")]
    EmptyCategory,
}

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

/// Three-level question difficulty.
///
/// Difficulty determines the points awarded for a correct answer:
/// easy 10, medium 15, hard 20.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Points awarded for answering a question of this difficulty correctly.
    #[must_use]
    pub fn points(self) -> u32 {
        match self {
            Difficulty::Easy => 10,
            Difficulty::Medium => 15,
            Difficulty::Hard => 20,
        }
    }

    /// Parses a difficulty from its lowercase wire name.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::InvalidDifficulty` for anything other than
    /// `easy`, `medium` or `hard`.
    pub fn parse(value: &str) -> Result<Self, QuestionError> {
        match value {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            other => Err(QuestionError::InvalidDifficulty(other.to_string())),
        }
    }

    /// The wire name of this difficulty.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

//
// ─── CATEGORY ──────────────────────────────────────────────────────────────────
//

/// Validated content category (trimmed, non-empty), e.g. "Cardiology".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Category(String);

impl Category {
    /// Create a validated category.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyCategory` if the name is empty after
    /// trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, QuestionError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(QuestionError::EmptyCategory);
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// Fewest answer options a question may carry.
pub const MIN_OPTIONS: usize = 2;
/// Most answer options a question may carry.
pub const MAX_OPTIONS: usize = 8;

/// Unvalidated question content as received from the question bank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    pub stem: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    pub difficulty: Difficulty,
    pub category: Category,
}

impl QuestionDraft {
    /// Validate the draft's content.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the stem is blank, the option list is out
    /// of range or contains blanks, or the correct answer index does not
    /// point into the option list.
    pub fn validate(self) -> Result<ValidatedQuestion, QuestionError> {
        let stem = self.stem.trim().to_string();
        if stem.is_empty() {
            return Err(QuestionError::EmptyStem);
        }

        let len = self.options.len();
        if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&len) {
            return Err(QuestionError::OptionCountOutOfRange {
                len,
                min: MIN_OPTIONS,
                max: MAX_OPTIONS,
            });
        }

        let mut options = Vec::with_capacity(len);
        for (index, option) in self.options.into_iter().enumerate() {
            let trimmed = option.trim();
            if trimmed.is_empty() {
                return Err(QuestionError::BlankOption { index });
            }
            options.push(trimmed.to_string());
        }

        if self.correct_answer >= len {
            return Err(QuestionError::CorrectAnswerOutOfRange {
                index: self.correct_answer,
                len,
            });
        }

        Ok(ValidatedQuestion {
            stem,
            options,
            correct_answer: self.correct_answer,
            difficulty: self.difficulty,
            category: self.category,
        })
    }
}

/// Question content that has passed validation but has no identity yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuestion {
    stem: String,
    options: Vec<String>,
    correct_answer: usize,
    difficulty: Difficulty,
    category: Category,
}

impl ValidatedQuestion {
    #[must_use]
    pub fn assign_id(self, id: QuestionId) -> Question {
        Question {
            id,
            stem: self.stem,
            options: self.options,
            correct_answer: self.correct_answer,
            difficulty: self.difficulty,
            category: self.category,
        }
    }
}

/// A single exam question. Immutable once fetched from the bank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    stem: String,
    options: Vec<String>,
    correct_answer: usize,
    difficulty: Difficulty,
    category: Category,
}

impl Question {
    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn stem(&self) -> &str {
        &self.stem
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer(&self) -> usize {
        self.correct_answer
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn category(&self) -> &Category {
        &self.category
    }

    /// Whether the given choice index is the correct answer.
    ///
    /// An unanswered question (`None`) is never correct.
    #[must_use]
    pub fn is_correct(&self, choice: Option<usize>) -> bool {
        choice == Some(self.correct_answer)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
