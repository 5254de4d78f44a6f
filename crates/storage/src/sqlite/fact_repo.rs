use chrono::{DateTime, Utc};

use quiz_core::model::{MaterialId, UserId, ViewedFact};

use super::{
    SqliteRepository,
    mapping::{map_fact_row, u64_to_i64},
};
use crate::repository::{StorageError, ViewedFactRepository};

#[async_trait::async_trait]
impl ViewedFactRepository for SqliteRepository {
    async fn record_fact(&self, user_id: UserId, fact: &ViewedFact) -> Result<(), StorageError> {
        // Facts are non-retractable, so re-recording keeps the original row.
        sqlx::query(
            r"
            INSERT INTO viewed_facts (user_id, material_id, viewed_at, time_spent_sec)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(user_id, material_id) DO NOTHING
            ",
        )
        .bind(u64_to_i64("user_id", user_id.value())?)
        .bind(u64_to_i64("material_id", fact.material_id.value())?)
        .bind(fact.viewed_at)
        .bind(fact.time_spent_sec.map(i64::from))
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn facts_for_user(&self, user_id: UserId) -> Result<Vec<ViewedFact>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT material_id, viewed_at, time_spent_sec
            FROM viewed_facts
            WHERE user_id = ?1
            ORDER BY viewed_at ASC, material_id ASC
            ",
        )
        .bind(u64_to_i64("user_id", user_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut facts = Vec::with_capacity(rows.len());
        for row in rows {
            facts.push(map_fact_row(&row)?);
        }
        Ok(facts)
    }

    async fn facts_since(
        &self,
        user_id: UserId,
        since: DateTime<Utc>,
    ) -> Result<Vec<ViewedFact>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT material_id, viewed_at, time_spent_sec
            FROM viewed_facts
            WHERE user_id = ?1 AND viewed_at >= ?2
            ORDER BY viewed_at ASC, material_id ASC
            ",
        )
        .bind(u64_to_i64("user_id", user_id.value())?)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut facts = Vec::with_capacity(rows.len());
        for row in rows {
            facts.push(map_fact_row(&row)?);
        }
        Ok(facts)
    }

    async fn contains(
        &self,
        user_id: UserId,
        material_id: MaterialId,
    ) -> Result<bool, StorageError> {
        let row = sqlx::query(
            r"
            SELECT 1 FROM viewed_facts
            WHERE user_id = ?1 AND material_id = ?2
            ",
        )
        .bind(u64_to_i64("user_id", user_id.value())?)
        .bind(u64_to_i64("material_id", material_id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(row.is_some())
    }
}
