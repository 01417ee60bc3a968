use std::collections::BTreeMap;

use lesson_core::model::{
    CompletedLesson, Lesson, LessonId, LessonProgressRecord, LessonStatus, ProgressSummary,
};

use crate::vm::time_fmt::format_date;

/// Text lines of the progress dashboard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SummaryVm {
    pub completed_line: String,
    pub remaining_line: String,
    pub percentage_line: String,
}

impl From<ProgressSummary> for SummaryVm {
    fn from(summary: ProgressSummary) -> Self {
        Self {
            completed_line: format!(
                "{} / {} lessons completed",
                summary.completed_lessons(),
                summary.total_lessons()
            ),
            remaining_line: format!("{} lessons remaining", summary.remaining_lessons()),
            percentage_line: format!("{}% complete", summary.percentage()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryEntryVm {
    pub lesson_id: String,
    pub title: String,
    pub completed_on: String,
}

impl From<&CompletedLesson> for HistoryEntryVm {
    fn from(entry: &CompletedLesson) -> Self {
        Self {
            lesson_id: entry.lesson_id.to_string(),
            title: entry.title.clone(),
            completed_on: format_date(entry.completed_at),
        }
    }
}

#[must_use]
pub fn map_history_entries(entries: &[CompletedLesson]) -> Vec<HistoryEntryVm> {
    entries.iter().map(HistoryEntryVm::from).collect()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LessonRowVm {
    pub lesson_id: String,
    pub title: String,
    pub status_label: &'static str,
    pub completed: bool,
}

fn status_label(status: LessonStatus) -> &'static str {
    match status {
        LessonStatus::NotStarted => "Not started",
        LessonStatus::InProgress => "In progress",
        LessonStatus::Completed => "Completed",
    }
}

/// One row per catalog lesson; lessons without a record read as not started.
#[must_use]
pub fn map_lesson_rows(
    lessons: &[Lesson],
    progress: &BTreeMap<LessonId, LessonProgressRecord>,
) -> Vec<LessonRowVm> {
    lessons
        .iter()
        .map(|lesson| {
            let status = progress
                .get(lesson.id())
                .map_or(LessonStatus::NotStarted, LessonProgressRecord::status);
            LessonRowVm {
                lesson_id: lesson.id().to_string(),
                title: lesson.title().to_string(),
                status_label: status_label(status),
                completed: status.is_completed(),
            }
        })
        .collect()
}
