use quiz_core::model::{AttemptRecord, MaterialId, QuizId, ViewedFact};
use sqlx::Row;
use uuid::Uuid;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn u64_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn map_fact_row(row: &sqlx::sqlite::SqliteRow) -> Result<ViewedFact, StorageError> {
    let material_id = MaterialId::new(i64_to_u64(
        "material_id",
        row.try_get("material_id").map_err(ser)?,
    )?);
    let viewed_at = row.try_get("viewed_at").map_err(ser)?;
    let time_spent_sec = row
        .try_get::<Option<i64>, _>("time_spent_sec")
        .map_err(ser)?
        .map(|v| {
            u32::try_from(v)
                .map_err(|_| StorageError::Serialization("time_spent_sec overflow".into()))
        })
        .transpose()?;

    Ok(ViewedFact {
        material_id,
        viewed_at,
        time_spent_sec,
    })
}

pub(crate) fn map_attempt_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<AttemptRecord, StorageError> {
    let id: Uuid = row
        .try_get::<String, _>("id")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let quiz_id = QuizId::new(i64_to_u64("quiz_id", row.try_get("quiz_id").map_err(ser)?)?);
    let completed_at = row.try_get("completed_at").map_err(ser)?;
    let score = u32::try_from(row.try_get::<i64, _>("score").map_err(ser)?)
        .map_err(|_| StorageError::Serialization("score overflow".into()))?;
    let total = u32::try_from(row.try_get::<i64, _>("total").map_err(ser)?)
        .map_err(|_| StorageError::Serialization("total overflow".into()))?;

    AttemptRecord::from_persisted(id, quiz_id, completed_at, score, total).map_err(ser)
}
