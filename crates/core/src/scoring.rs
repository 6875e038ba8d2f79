use thiserror::Error;

use crate::model::question::Question;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Errors that can occur while scoring a session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScoringError {
    #[error("cannot score a quiz with no questions")]
    Empty,
    #[error("answer list length {answers} does not match question list length {questions}")]
    LengthMismatch { questions: usize, answers: usize },
}

//
// ─── SCORE BREAKDOWN ───────────────────────────────────────────────────────────
//

/// The result of scoring one session: how many answers were correct, the
/// percentage score, and the difficulty-weighted points earned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreBreakdown {
    pub correct_count: u32,
    /// Percentage of correct answers, rounded to the nearest integer (0-100).
    pub score: u8,
    /// Sum of per-question points for every correct answer.
    pub points_earned: u32,
}

impl ScoreBreakdown {
    /// True when every question was answered correctly.
    #[must_use]
    pub fn is_perfect(&self) -> bool {
        self.score == 100
    }
}

//
// ─── SCORER ────────────────────────────────────────────────────────────────────
//

/// Score a finished set of answers against its questions.
///
/// Each answer is compared to its question's correct index; `None` always
/// counts as incorrect. A correct answer earns the question's difficulty
/// points (easy 10, medium 15, hard 20). The same inputs always produce the
/// same breakdown.
///
/// # Errors
///
/// Returns `ScoringError::Empty` for an empty question list and
/// `ScoringError::LengthMismatch` when the answer list has a different
/// length.
///
/// # Examples
///
/// ```
/// # use quiz_core::model::{Category, Difficulty, QuestionDraft, QuestionId};
/// # use quiz_core::scoring::score_session;
/// let question = QuestionDraft {
///     stem: "First-line treatment?".into(),
///     options: vec!["A".into(), "B".into()],
///     correct_answer: 1,
///     difficulty: Difficulty::Easy,
///     category: Category::new("Pharmacology")?,
/// }
/// .validate()?
/// .assign_id(QuestionId::new(1));
///
/// let breakdown = score_session(&[question], &[Some(1)])?;
/// assert_eq!(breakdown.score, 100);
/// assert_eq!(breakdown.points_earned, 10);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn score_session(
    questions: &[Question],
    answers: &[Option<usize>],
) -> Result<ScoreBreakdown, ScoringError> {
    if questions.is_empty() {
        return Err(ScoringError::Empty);
    }
    if questions.len() != answers.len() {
        return Err(ScoringError::LengthMismatch {
            questions: questions.len(),
            answers: answers.len(),
        });
    }

    let mut correct_count = 0_u32;
    let mut points_earned = 0_u32;
    for (question, answer) in questions.iter().zip(answers) {
        if question.is_correct(*answer) {
            correct_count += 1;
            points_earned += question.difficulty().points();
        }
    }

    let total = u32::try_from(questions.len()).unwrap_or(u32::MAX);
    // integer round-half-up of 100 * correct / total
    let score = ((100 * correct_count + total / 2) / total) as u8;

    Ok(ScoreBreakdown {
        correct_count,
        score,
        points_earned,
    })
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
