use practice_core::model::{Question, QuestionDraft, QuestionId, SkillId};
use sqlx::Row;

use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Questions are stored as a JSON payload; ids and skill links are mirrored
/// into columns for lookups.
pub(crate) fn question_payload(question: &Question) -> Result<String, StorageError> {
    serde_json::to_string(question).map_err(ser)
}

pub(crate) fn map_question_row(row: &sqlx::sqlite::SqliteRow) -> Result<Question, StorageError> {
    let id: String = row.try_get("id").map_err(ser)?;
    let payload: String = row.try_get("payload").map_err(ser)?;

    let draft: QuestionDraft = serde_json::from_str(&payload).map_err(ser)?;
    if draft.id.as_str() != id {
        return Err(StorageError::Serialization(format!(
            "payload id {} does not match row id {id}",
            draft.id
        )));
    }
    draft.validate().map_err(ser)
}

pub(crate) fn map_skill_row(row: &sqlx::sqlite::SqliteRow) -> Result<SkillId, StorageError> {
    let raw: String = row.try_get("skill_id").map_err(ser)?;
    raw.parse().map_err(ser)
}

pub(crate) fn question_id_param(id: &QuestionId) -> String {
    id.as_str().to_owned()
}
