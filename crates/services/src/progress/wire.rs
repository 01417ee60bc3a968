//! JSON shapes shared by the REST API and its HTTP client.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use lesson_core::model::{
    CompletedLesson, Lesson, LessonError, LessonId, LessonProgressPatch, LessonProgressRecord,
    LessonStatus, ProgressError, ProgressSummary, SectionUpdate, StepId,
};
use serde::{Deserialize, Serialize};

use crate::error::ProgressServiceError;

/// Header carrying the caller's user id; absent means anonymous.
pub const USER_HEADER: &str = "x-user-id";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecordDto {
    pub lesson_id: String,
    #[serde(default)]
    pub status: LessonStatus,
    #[serde(default)]
    pub correct_count: u32,
    #[serde(default)]
    pub correct_ids: Vec<String>,
    #[serde(default)]
    pub current_section_id: Option<String>,
    #[serde(default)]
    pub completed_sections: Vec<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&LessonProgressRecord> for ProgressRecordDto {
    fn from(record: &LessonProgressRecord) -> Self {
        Self {
            lesson_id: record.lesson_id().to_string(),
            status: record.status(),
            correct_count: record.correct_count(),
            correct_ids: record.correct_ids().iter().map(ToString::to_string).collect(),
            current_section_id: record.current_section_id().map(str::to_owned),
            completed_sections: record.completed_sections().iter().cloned().collect(),
            updated_at: record.updated_at(),
            completed_at: record.completed_at(),
        }
    }
}

impl ProgressRecordDto {
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Validation` for malformed ids and
    /// `ProgressServiceError::Record` when the count disagrees with the ids.
    pub fn into_record(self) -> Result<LessonProgressRecord, ProgressServiceError> {
        let lesson_id = LessonId::new(&self.lesson_id)?;
        let correct_ids = parse_steps(self.correct_ids)?;
        if usize::try_from(self.correct_count).ok() != Some(correct_ids.len()) {
            return Err(ProgressError::CorrectCountMismatch {
                count: self.correct_count,
                ids: correct_ids.len(),
            }
            .into());
        }
        let record = LessonProgressRecord::from_persisted(
            lesson_id,
            self.status,
            correct_ids,
            self.current_section_id,
            self.completed_sections.into_iter().collect(),
            self.updated_at,
            self.completed_at,
        )?;
        Ok(record)
    }
}

/// Body of `PUT /progress/:lessonId`. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressPatchDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<LessonStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_section_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_sections: Option<Vec<String>>,
    /// Kept as the completion time when the result is completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ProgressPatchDto {
    /// Full-state patch that makes the receiving record equal to `record`.
    #[must_use]
    pub fn from_record(record: &LessonProgressRecord) -> Self {
        let dto = ProgressRecordDto::from(record);
        Self {
            status: Some(dto.status),
            correct_ids: Some(dto.correct_ids),
            correct_count: Some(dto.correct_count),
            current_section_id: dto.current_section_id,
            completed_sections: Some(dto.completed_sections),
            completed_at: dto.completed_at,
        }
    }

    /// # Errors
    ///
    /// Returns `ProgressServiceError::Validation` if a step id is blank.
    pub fn into_patch(self) -> Result<LessonProgressPatch, ProgressServiceError> {
        Ok(LessonProgressPatch {
            status: self.status,
            correct_ids: self.correct_ids.map(parse_steps).transpose()?,
            correct_count: self.correct_count,
            current_section_id: self.current_section_id,
            completed_sections: self
                .completed_sections
                .map(|sections| sections.into_iter().collect()),
            completed_at: self.completed_at,
        })
    }
}

fn parse_steps(raw: Vec<String>) -> Result<BTreeSet<StepId>, ProgressServiceError> {
    raw.into_iter()
        .map(|id| StepId::new(id).map_err(ProgressServiceError::from))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryDto {
    pub total_lessons: u32,
    pub completed_lessons: u32,
    pub remaining_lessons: u32,
    pub percentage: u8,
}

impl From<ProgressSummary> for SummaryDto {
    fn from(summary: ProgressSummary) -> Self {
        Self {
            total_lessons: summary.total_lessons(),
            completed_lessons: summary.completed_lessons(),
            remaining_lessons: summary.remaining_lessons(),
            percentage: summary.percentage(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonDto {
    pub id: String,
    pub title: String,
    pub position: u32,
}

impl From<&Lesson> for LessonDto {
    fn from(lesson: &Lesson) -> Self {
        Self {
            id: lesson.id().to_string(),
            title: lesson.title().to_owned(),
            position: lesson.position(),
        }
    }
}

impl LessonDto {
    /// # Errors
    ///
    /// Returns `LessonError` for an invalid id or blank title.
    pub fn into_lesson(self) -> Result<Lesson, LessonError> {
        Lesson::new(LessonId::new(&self.id)?, self.title, self.position)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntryDto {
    pub lesson_id: String,
    pub title: String,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&CompletedLesson> for HistoryEntryDto {
    fn from(entry: &CompletedLesson) -> Self {
        Self {
            lesson_id: entry.lesson_id.to_string(),
            title: entry.title.clone(),
            completed_at: entry.completed_at,
        }
    }
}

/// Body of `POST /progress/complete`. `lessonId` is optional here so a
/// missing value is reported as a validation error rather than a parse error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteLessonRequest {
    #[serde(default)]
    pub lesson_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionUpdateRequest {
    #[serde(default)]
    pub lesson_id: Option<String>,
    #[serde(default)]
    pub current_section_id: Option<String>,
    #[serde(default)]
    pub completed_sections: Option<Vec<String>>,
    #[serde(default)]
    pub is_replay: bool,
}

impl SectionUpdateRequest {
    #[must_use]
    pub fn to_update(&self) -> SectionUpdate {
        SectionUpdate {
            current_section_id: self.current_section_id.clone(),
            completed_sections: self.completed_sections.clone(),
            is_replay: self.is_replay,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectAnswerRequest {
    #[serde(default)]
    pub step_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectAnswerDto {
    pub counted: bool,
    pub progress: ProgressRecordDto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileDto {
    pub merged: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
}
