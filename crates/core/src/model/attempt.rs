use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::model::ids::QuizId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AttemptError {
    #[error("score {score} exceeds question count {total}")]
    ScoreOutOfRange { score: u32, total: u32 },
}

/// One completed quiz attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRecord {
    id: Uuid,
    quiz_id: QuizId,
    completed_at: DateTime<Utc>,
    score: u32,
    total: u32,
}

impl AttemptRecord {
    /// Build an attempt record, assigning a fresh id.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::ScoreOutOfRange` if `score > total`.
    pub fn new(
        quiz_id: QuizId,
        completed_at: DateTime<Utc>,
        score: u32,
        total: u32,
    ) -> Result<Self, AttemptError> {
        Self::from_persisted(Uuid::new_v4(), quiz_id, completed_at, score, total)
    }

    /// Rehydrate an attempt record from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::ScoreOutOfRange` if `score > total`.
    pub fn from_persisted(
        id: Uuid,
        quiz_id: QuizId,
        completed_at: DateTime<Utc>,
        score: u32,
        total: u32,
    ) -> Result<Self, AttemptError> {
        if score > total {
            return Err(AttemptError::ScoreOutOfRange { score, total });
        }
        Ok(Self {
            id,
            quiz_id,
            completed_at,
            score,
            total,
        })
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn quiz_id(&self) -> QuizId {
        self.quiz_id
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }
}

/// Append-only history of completed attempts, oldest first.
///
/// Entries are never mutated or reordered; `reset` on a session leaves the
/// history intact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttemptHistory {
    records: Vec<AttemptRecord>,
}

impl AttemptHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, attempt: AttemptRecord) {
        self.records.push(attempt);
    }

    #[must_use]
    pub fn records(&self) -> &[AttemptRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn latest(&self) -> Option<&AttemptRecord> {
        self.records.last()
    }

    /// Best score recorded so far, if any attempt completed.
    #[must_use]
    pub fn best_score(&self) -> Option<u32> {
        self.records.iter().map(AttemptRecord::score).max()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
