use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{OptionId, QuestionId};

//
// ─── QUESTION TYPES ────────────────────────────────────────────────────────────
//

/// One selectable answer option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: OptionId,
    pub text: String,
}

impl AnswerOption {
    #[must_use]
    pub fn new(id: OptionId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
        }
    }
}

/// Author-assigned difficulty rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question needs at least two options, got {got}")]
    TooFewOptions { got: usize },

    #[error("duplicate option id {0}")]
    DuplicateOption(OptionId),

    #[error("correct option {0} is not among the question's options")]
    CorrectOptionMissing(OptionId),
}

/// A single multiple-choice question.
///
/// Immutable once constructed; a session never mutates its definition.
/// The correct option id is part of the definition but stays hidden from
/// presentation until the session reveals it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    text: String,
    options: Vec<AnswerOption>,
    correct_option_id: OptionId,
    explanation: String,
    difficulty: Difficulty,
    tags: Vec<String>,
}

impl Question {
    /// Build a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::TooFewOptions` for fewer than two options,
    /// `QuestionError::DuplicateOption` for repeated option ids, and
    /// `QuestionError::CorrectOptionMissing` when the correct id is absent.
    pub fn new(
        id: QuestionId,
        text: impl Into<String>,
        options: Vec<AnswerOption>,
        correct_option_id: OptionId,
        explanation: impl Into<String>,
        difficulty: Difficulty,
        tags: Vec<String>,
    ) -> Result<Self, QuestionError> {
        if options.len() < 2 {
            return Err(QuestionError::TooFewOptions { got: options.len() });
        }
        for (i, opt) in options.iter().enumerate() {
            if options[..i].iter().any(|o| o.id == opt.id) {
                return Err(QuestionError::DuplicateOption(opt.id));
            }
        }
        if !options.iter().any(|o| o.id == correct_option_id) {
            return Err(QuestionError::CorrectOptionMissing(correct_option_id));
        }

        Ok(Self {
            id,
            text: text.into(),
            options,
            correct_option_id,
            explanation: explanation.into(),
            difficulty,
            tags,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[AnswerOption] {
        &self.options
    }

    /// Look up one option by id.
    #[must_use]
    pub fn option(&self, id: OptionId) -> Option<&AnswerOption> {
        self.options.iter().find(|o| o.id == id)
    }

    #[must_use]
    pub fn has_option(&self, id: OptionId) -> bool {
        self.option(id).is_some()
    }

    #[must_use]
    pub fn correct_option_id(&self) -> OptionId {
        self.correct_option_id
    }

    #[must_use]
    pub fn is_correct(&self, id: OptionId) -> bool {
        self.correct_option_id == id
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn options(n: u64) -> Vec<AnswerOption> {
        (1..=n)
            .map(|i| AnswerOption::new(OptionId::new(i), format!("opt {i}")))
            .collect()
    }

    #[test]
    fn question_rejects_single_option() {
        let err = Question::new(
            QuestionId::new(1),
            "Q",
            options(1),
            OptionId::new(1),
            "",
            Difficulty::Easy,
            Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, QuestionError::TooFewOptions { got: 1 }));
    }

    #[test]
    fn question_rejects_duplicate_option_ids() {
        let mut opts = options(2);
        opts.push(AnswerOption::new(OptionId::new(2), "dup"));
        let err = Question::new(
            QuestionId::new(1),
            "Q",
            opts,
            OptionId::new(1),
            "",
            Difficulty::Medium,
            Vec::new(),
        )
        .unwrap_err();
        assert_eq!(err, QuestionError::DuplicateOption(OptionId::new(2)));
    }

    #[test]
    fn question_rejects_missing_correct_option() {
        let err = Question::new(
            QuestionId::new(1),
            "Q",
            options(3),
            OptionId::new(9),
            "",
            Difficulty::Hard,
            Vec::new(),
        )
        .unwrap_err();
        assert_eq!(err, QuestionError::CorrectOptionMissing(OptionId::new(9)));
    }

    #[test]
    fn question_looks_up_options() {
        let q = Question::new(
            QuestionId::new(1),
            "Q",
            options(3),
            OptionId::new(2),
            "because",
            Difficulty::Easy,
            vec!["algebra".into()],
        )
        .unwrap();

        assert!(q.has_option(OptionId::new(3)));
        assert!(!q.has_option(OptionId::new(4)));
        assert!(q.is_correct(OptionId::new(2)));
        assert!(!q.is_correct(OptionId::new(1)));
        assert_eq!(q.explanation(), "because");
    }
}
