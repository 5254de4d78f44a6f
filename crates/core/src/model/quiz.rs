use thiserror::Error;

use crate::model::ids::{QuestionId, QuizId};
use crate::model::question::Question;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz has no questions")]
    NoQuestions,

    #[error("duplicate question id {0}")]
    DuplicateQuestion(QuestionId),

    #[error("quiz duration must be positive")]
    ZeroDuration,
}

/// An immutable, ordered quiz definition.
///
/// Question order is significant and fixed for the lifetime of any session
/// built over this definition; there is no reshuffling mid-attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizDefinition {
    id: QuizId,
    title: String,
    duration_sec: u32,
    questions: Vec<Question>,
}

impl QuizDefinition {
    /// Build a validated quiz definition.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoQuestions` for an empty question list,
    /// `QuizError::DuplicateQuestion` for repeated question ids, and
    /// `QuizError::ZeroDuration` when `duration_sec` is zero.
    pub fn new(
        id: QuizId,
        title: impl Into<String>,
        duration_sec: u32,
        questions: Vec<Question>,
    ) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::NoQuestions);
        }
        if duration_sec == 0 {
            return Err(QuizError::ZeroDuration);
        }
        for (i, q) in questions.iter().enumerate() {
            if questions[..i].iter().any(|other| other.id() == q.id()) {
                return Err(QuizError::DuplicateQuestion(q.id()));
            }
        }

        Ok(Self {
            id,
            title: title.into(),
            duration_sec,
            questions,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuizId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Exam time budget in seconds.
    #[must_use]
    pub fn duration_sec(&self) -> u32 {
        self.duration_sec
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Number of questions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn question_at(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == id)
    }

    #[must_use]
    pub fn contains_question(&self, id: QuestionId) -> bool {
        self.question(id).is_some()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
