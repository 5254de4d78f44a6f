use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use quiz_core::model::{AttemptRecord, MaterialId, QuizId, UserId, ViewedFact};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Durable store for "material viewed" facts.
///
/// This is the local, authoritative-for-reads half of the two-tier progress
/// store. Facts are append-only: recording the same material twice is a
/// no-op, and nothing ever deletes a fact.
#[async_trait]
pub trait ViewedFactRepository: Send + Sync {
    /// Record a fact, keeping the earliest record when one already exists.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the fact cannot be stored.
    async fn record_fact(&self, user_id: UserId, fact: &ViewedFact) -> Result<(), StorageError>;

    /// All facts recorded for a user.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failure.
    async fn facts_for_user(&self, user_id: UserId) -> Result<Vec<ViewedFact>, StorageError>;

    /// Facts recorded at or after the given instant, for incremental sync.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failure.
    async fn facts_since(
        &self,
        user_id: UserId,
        since: DateTime<Utc>,
    ) -> Result<Vec<ViewedFact>, StorageError>;

    /// Whether a fact exists for the material.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failure.
    async fn contains(
        &self,
        user_id: UserId,
        material_id: MaterialId,
    ) -> Result<bool, StorageError>;
}

/// Durable store for completed quiz attempts.
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// Append one completed attempt.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if an attempt with the same id was
    /// already recorded, or other storage errors.
    async fn append_attempt(
        &self,
        user_id: UserId,
        attempt: &AttemptRecord,
    ) -> Result<(), StorageError>;

    /// Attempts for one quiz, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failure.
    async fn attempts_for_quiz(
        &self,
        user_id: UserId,
        quiz_id: QuizId,
    ) -> Result<Vec<AttemptRecord>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    facts: Arc<Mutex<HashMap<(UserId, MaterialId), ViewedFact>>>,
    attempts: Arc<Mutex<Vec<(UserId, AttemptRecord)>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ViewedFactRepository for InMemoryRepository {
    async fn record_fact(&self, user_id: UserId, fact: &ViewedFact) -> Result<(), StorageError> {
        let mut guard = self
            .facts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .entry((user_id, fact.material_id))
            .or_insert_with(|| fact.clone());
        Ok(())
    }

    async fn facts_for_user(&self, user_id: UserId) -> Result<Vec<ViewedFact>, StorageError> {
        let guard = self
            .facts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut facts: Vec<ViewedFact> = guard
            .iter()
            .filter(|((uid, _), _)| *uid == user_id)
            .map(|(_, fact)| fact.clone())
            .collect();
        facts.sort_by_key(|f| (f.viewed_at, f.material_id));
        Ok(facts)
    }

    async fn facts_since(
        &self,
        user_id: UserId,
        since: DateTime<Utc>,
    ) -> Result<Vec<ViewedFact>, StorageError> {
        let all = self.facts_for_user(user_id).await?;
        Ok(all.into_iter().filter(|f| f.viewed_at >= since).collect())
    }

    async fn contains(
        &self,
        user_id: UserId,
        material_id: MaterialId,
    ) -> Result<bool, StorageError> {
        let guard = self
            .facts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.contains_key(&(user_id, material_id)))
    }
}

#[async_trait]
impl AttemptRepository for InMemoryRepository {
    async fn append_attempt(
        &self,
        user_id: UserId,
        attempt: &AttemptRecord,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if guard.iter().any(|(_, a)| a.id() == attempt.id()) {
            return Err(StorageError::Conflict);
        }
        guard.push((user_id, attempt.clone()));
        Ok(())
    }

    async fn attempts_for_quiz(
        &self,
        user_id: UserId,
        quiz_id: QuizId,
    ) -> Result<Vec<AttemptRecord>, StorageError> {
        let guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .iter()
            .filter(|(uid, a)| *uid == user_id && a.quiz_id() == quiz_id)
            .map(|(_, a)| a.clone())
            .collect())
    }
}

/// Aggregates fact and attempt repositories behind trait objects for easy
/// backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub facts: Arc<dyn ViewedFactRepository>,
    pub attempts: Arc<dyn AttemptRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let facts: Arc<dyn ViewedFactRepository> = Arc::new(repo.clone());
        let attempts: Arc<dyn AttemptRepository> = Arc::new(repo);
        Self { facts, attempts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quiz_core::time::fixed_now;

    fn fact(material: u64, offset_sec: i64) -> ViewedFact {
        ViewedFact::new(
            MaterialId::new(material),
            fixed_now() + Duration::seconds(offset_sec),
        )
    }

    #[tokio::test]
    async fn recording_the_same_fact_twice_is_a_noop() {
        let repo = InMemoryRepository::new();
        let user = UserId::new(1);

        let original = fact(1, 0).with_time_spent(30);
        repo.record_fact(user, &original).await.unwrap();
        repo.record_fact(user, &fact(1, 60)).await.unwrap();

        let facts = repo.facts_for_user(user).await.unwrap();
        assert_eq!(facts.len(), 1);
        // The earliest record wins.
        assert_eq!(facts[0], original);
        assert!(repo.contains(user, MaterialId::new(1)).await.unwrap());
    }

    #[tokio::test]
    async fn facts_are_scoped_per_user() {
        let repo = InMemoryRepository::new();
        repo.record_fact(UserId::new(1), &fact(1, 0)).await.unwrap();
        repo.record_fact(UserId::new(2), &fact(2, 0)).await.unwrap();

        let facts = repo.facts_for_user(UserId::new(1)).await.unwrap();
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].material_id, MaterialId::new(1));
        assert!(!repo.contains(UserId::new(1), MaterialId::new(2)).await.unwrap());
    }

    #[tokio::test]
    async fn facts_since_filters_older_records() {
        let repo = InMemoryRepository::new();
        let user = UserId::new(1);
        repo.record_fact(user, &fact(1, 0)).await.unwrap();
        repo.record_fact(user, &fact(2, 120)).await.unwrap();
        repo.record_fact(user, &fact(3, 240)).await.unwrap();

        let recent = repo
            .facts_since(user, fixed_now() + Duration::seconds(120))
            .await
            .unwrap();
        let ids: Vec<u64> = recent.iter().map(|f| f.material_id.value()).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[tokio::test]
    async fn attempt_ids_must_be_unique() {
        let repo = InMemoryRepository::new();
        let user = UserId::new(1);
        let attempt = AttemptRecord::new(QuizId::new(1), fixed_now(), 2, 3).unwrap();

        repo.append_attempt(user, &attempt).await.unwrap();
        let err = repo.append_attempt(user, &attempt).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict));
    }

    #[tokio::test]
    async fn attempts_filtered_by_quiz_in_insertion_order() {
        let repo = InMemoryRepository::new();
        let user = UserId::new(1);
        let now = fixed_now();

        for (quiz, score) in [(1_u64, 0_u32), (2, 1), (1, 3)] {
            let attempt = AttemptRecord::new(QuizId::new(quiz), now, score, 3).unwrap();
            repo.append_attempt(user, &attempt).await.unwrap();
        }

        let attempts = repo.attempts_for_quiz(user, QuizId::new(1)).await.unwrap();
        let scores: Vec<u32> = attempts.iter().map(AttemptRecord::score).collect();
        assert_eq!(scores, vec![0, 3]);
    }
}
