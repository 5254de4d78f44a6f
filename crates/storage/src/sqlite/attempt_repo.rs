use quiz_core::model::{AttemptRecord, QuizId, UserId};

use super::{
    SqliteRepository,
    mapping::{map_attempt_row, u64_to_i64},
};
use crate::repository::{AttemptRepository, StorageError};

#[async_trait::async_trait]
impl AttemptRepository for SqliteRepository {
    async fn append_attempt(
        &self,
        user_id: UserId,
        attempt: &AttemptRecord,
    ) -> Result<(), StorageError> {
        let result = sqlx::query(
            r"
            INSERT INTO quiz_attempts (id, user_id, quiz_id, completed_at, score, total)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(attempt.id().to_string())
        .bind(u64_to_i64("user_id", user_id.value())?)
        .bind(u64_to_i64("quiz_id", attempt.quiz_id().value())?)
        .bind(attempt.completed_at())
        .bind(i64::from(attempt.score()))
        .bind(i64::from(attempt.total()))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StorageError::Conflict)
            }
            Err(e) => Err(StorageError::Connection(e.to_string())),
        }
    }

    async fn attempts_for_quiz(
        &self,
        user_id: UserId,
        quiz_id: QuizId,
    ) -> Result<Vec<AttemptRecord>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, quiz_id, completed_at, score, total
            FROM quiz_attempts
            WHERE user_id = ?1 AND quiz_id = ?2
            ORDER BY completed_at ASC, id ASC
            ",
        )
        .bind(u64_to_i64("user_id", user_id.value())?)
        .bind(u64_to_i64("quiz_id", quiz_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut attempts = Vec::with_capacity(rows.len());
        for row in rows {
            attempts.push(map_attempt_row(&row)?);
        }
        Ok(attempts)
    }
}
