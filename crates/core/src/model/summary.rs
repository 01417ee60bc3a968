use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::LessonId;
use crate::model::lesson::Lesson;
use crate::model::progress::LessonProgressRecord;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SummaryError {
    #[error("completed lessons ({completed}) exceed total lessons ({total})")]
    CompletedExceedsTotal { completed: u32, total: u32 },
}

/// Derived overview of a learner's progress. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSummary {
    total_lessons: u32,
    completed_lessons: u32,
    remaining_lessons: u32,
    percentage: u8,
}

impl ProgressSummary {
    /// # Errors
    ///
    /// Returns `SummaryError::CompletedExceedsTotal` if `completed > total`.
    pub fn new(total_lessons: u32, completed_lessons: u32) -> Result<Self, SummaryError> {
        if completed_lessons > total_lessons {
            return Err(SummaryError::CompletedExceedsTotal {
                completed: completed_lessons,
                total: total_lessons,
            });
        }
        Ok(Self {
            total_lessons,
            completed_lessons,
            remaining_lessons: total_lessons - completed_lessons,
            percentage: rounded_percentage(completed_lessons, total_lessons),
        })
    }

    /// Summarize `records` against the lesson catalog.
    ///
    /// Only distinct catalog lessons whose record is completed count, so the
    /// result always satisfies `completed <= total`.
    #[must_use]
    pub fn from_catalog(lessons: &[Lesson], records: &[LessonProgressRecord]) -> Self {
        let catalog: BTreeSet<&LessonId> = lessons.iter().map(Lesson::id).collect();
        let completed: BTreeSet<&LessonId> = records
            .iter()
            .filter(|r| r.status().is_completed())
            .map(LessonProgressRecord::lesson_id)
            .filter(|id| catalog.contains(id))
            .collect();

        let total = u32::try_from(catalog.len()).unwrap_or(u32::MAX);
        let done = u32::try_from(completed.len()).unwrap_or(u32::MAX).min(total);
        Self {
            total_lessons: total,
            completed_lessons: done,
            remaining_lessons: total - done,
            percentage: rounded_percentage(done, total),
        }
    }

    #[must_use]
    pub fn total_lessons(&self) -> u32 {
        self.total_lessons
    }

    #[must_use]
    pub fn completed_lessons(&self) -> u32 {
        self.completed_lessons
    }

    #[must_use]
    pub fn remaining_lessons(&self) -> u32 {
        self.remaining_lessons
    }

    #[must_use]
    pub fn percentage(&self) -> u8 {
        self.percentage
    }
}

/// `round(100 * completed / total)` with halves rounded up; `0` when `total == 0`.
#[must_use]
pub fn rounded_percentage(completed: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let completed = u64::from(completed.min(total));
    let total = u64::from(total);
    let pct = (200 * completed + total) / (2 * total);
    u8::try_from(pct).unwrap_or(100)
}

/// Entry of the read-only learning history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedLesson {
    pub lesson_id: LessonId,
    pub title: String,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Completed lessons in the order they were finished.
///
/// Ties (and records without a completion time) fall back to catalog
/// position; lessons missing from the catalog use their id as title.
#[must_use]
pub fn completion_history(
    lessons: &[Lesson],
    records: &[LessonProgressRecord],
) -> Vec<CompletedLesson> {
    let by_id: HashMap<&LessonId, &Lesson> = lessons.iter().map(|l| (l.id(), l)).collect();

    let mut entries: Vec<(Option<DateTime<Utc>>, u32, CompletedLesson)> = records
        .iter()
        .filter(|r| r.status().is_completed())
        .map(|r| {
            let lesson = by_id.get(r.lesson_id());
            let position = lesson.map_or(u32::MAX, |l| l.position());
            let title = lesson.map_or_else(|| r.lesson_id().to_string(), |l| l.title().to_owned());
            let completed_at = r.completed_at().or(r.updated_at());
            (
                completed_at,
                position,
                CompletedLesson {
                    lesson_id: r.lesson_id().clone(),
                    title,
                    completed_at,
                },
            )
        })
        .collect();

    entries.sort_by(|a, b| {
        let time = match (a.0, b.0) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        };
        time.then(a.1.cmp(&b.1))
            .then_with(|| a.2.lesson_id.cmp(&b.2.lesson_id))
    });

    entries.into_iter().map(|(_, _, entry)| entry).collect()
}
