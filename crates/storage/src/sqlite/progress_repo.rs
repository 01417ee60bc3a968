use lesson_core::model::{LessonId, LessonProgressRecord, UserKey};

use super::SqliteRepository;
use super::mapping::{encode_set, map_progress_row};
use crate::repository::{ProgressRepository, StorageError};

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn get_record(
        &self,
        user: &UserKey,
        lesson_id: &LessonId,
    ) -> Result<Option<LessonProgressRecord>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT lesson_id, status, correct_ids, current_section_id,
                   completed_sections, updated_at, completed_at
            FROM lesson_progress
            WHERE user_key = ?1 AND lesson_id = ?2
            ",
        )
        .bind(user.as_str())
        .bind(lesson_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_progress_row).transpose()
    }

    async fn list_records(&self, user: &UserKey) -> Result<Vec<LessonProgressRecord>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT lesson_id, status, correct_ids, current_section_id,
                   completed_sections, updated_at, completed_at
            FROM lesson_progress
            WHERE user_key = ?1
            ORDER BY lesson_id ASC
            ",
        )
        .bind(user.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_progress_row(&row)?);
        }
        Ok(out)
    }

    async fn upsert_record(
        &self,
        user: &UserKey,
        record: &LessonProgressRecord,
    ) -> Result<(), StorageError> {
        let correct_ids = encode_set(record.correct_ids().iter().map(|s| s.as_str()))?;
        let sections = encode_set(record.completed_sections().iter().map(String::as_str))?;

        sqlx::query(
            r"
            INSERT INTO lesson_progress (
                user_key, lesson_id, status, correct_ids, current_section_id,
                completed_sections, updated_at, completed_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(user_key, lesson_id) DO UPDATE SET
                status = excluded.status,
                correct_ids = excluded.correct_ids,
                current_section_id = excluded.current_section_id,
                completed_sections = excluded.completed_sections,
                updated_at = excluded.updated_at,
                completed_at = excluded.completed_at
            ",
        )
        .bind(user.as_str())
        .bind(record.lesson_id().as_str())
        .bind(record.status().as_str())
        .bind(correct_ids)
        .bind(record.current_section_id())
        .bind(sections)
        .bind(record.updated_at())
        .bind(record.completed_at())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }
}
