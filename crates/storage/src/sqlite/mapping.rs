use std::collections::BTreeSet;

use lesson_core::model::{Lesson, LessonId, LessonProgressRecord, LessonStatus, StepId};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn position_to_i64(position: u32) -> i64 {
    i64::from(position)
}

pub(crate) fn position_from_i64(v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid position: {v}")))
}

/// Set-valued columns are stored as JSON arrays of strings.
pub(crate) fn encode_set<'a>(values: impl IntoIterator<Item = &'a str>) -> Result<String, StorageError> {
    let values: Vec<&str> = values.into_iter().collect();
    serde_json::to_string(&values).map_err(ser)
}

pub(crate) fn decode_set(field: &'static str, raw: &str) -> Result<BTreeSet<String>, StorageError> {
    serde_json::from_str::<Vec<String>>(raw)
        .map(|values| values.into_iter().collect())
        .map_err(|e| StorageError::Serialization(format!("{field}: {e}")))
}

pub(crate) fn map_lesson_row(row: &SqliteRow) -> Result<Lesson, StorageError> {
    let id = LessonId::new(row.try_get::<String, _>("id").map_err(ser)?).map_err(ser)?;
    let title: String = row.try_get("title").map_err(ser)?;
    let position = position_from_i64(row.try_get::<i64, _>("position").map_err(ser)?)?;
    Lesson::new(id, title, position).map_err(ser)
}

pub(crate) fn map_progress_row(row: &SqliteRow) -> Result<LessonProgressRecord, StorageError> {
    let lesson_id =
        LessonId::new(row.try_get::<String, _>("lesson_id").map_err(ser)?).map_err(ser)?;
    let status: LessonStatus = row
        .try_get::<String, _>("status")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;

    let correct_ids = decode_set(
        "correct_ids",
        &row.try_get::<String, _>("correct_ids").map_err(ser)?,
    )?
    .into_iter()
    .map(StepId::new)
    .collect::<Result<BTreeSet<_>, _>>()
    .map_err(ser)?;
    let completed_sections = decode_set(
        "completed_sections",
        &row.try_get::<String, _>("completed_sections").map_err(ser)?,
    )?;

    LessonProgressRecord::from_persisted(
        lesson_id,
        status,
        correct_ids,
        row.try_get("current_section_id").map_err(ser)?,
        completed_sections,
        row.try_get("updated_at").map_err(ser)?,
        row.try_get("completed_at").map_err(ser)?,
    )
    .map_err(ser)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_encoding_round_trips_through_json() {
        let encoded = encode_set(["s2", "s1"]).unwrap();
        assert_eq!(encoded, r#"["s2","s1"]"#);
        let decoded = decode_set("completed_sections", &encoded).unwrap();
        assert_eq!(decoded.into_iter().collect::<Vec<_>>(), ["s1", "s2"]);
    }

    #[test]
    fn corrupt_set_is_a_serialization_error() {
        let err = decode_set("correct_ids", "{not json").unwrap_err();
        assert!(matches!(err, StorageError::Serialization(msg) if msg.starts_with("correct_ids")));
    }
}
