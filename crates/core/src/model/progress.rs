use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{LessonId, StepId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("correct count {count} does not match {ids} correct step ids")]
    CorrectCountMismatch { count: u32, ids: usize },

    #[error("invalid lesson status: {0}")]
    InvalidStatus(String),

    #[error("invalid persisted progress: {0}")]
    InvalidPersistedState(String),
}

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

/// Where a learner stands on one lesson.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LessonStatus {
    #[default]
    #[serde(alias = "Not Started")]
    NotStarted,
    #[serde(alias = "In Progress")]
    InProgress,
    Completed,
}

impl LessonStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LessonStatus::NotStarted => "NotStarted",
            LessonStatus::InProgress => "InProgress",
            LessonStatus::Completed => "Completed",
        }
    }

    /// Ordering used when two copies of a record are reconciled.
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            LessonStatus::NotStarted => 0,
            LessonStatus::InProgress => 1,
            LessonStatus::Completed => 2,
        }
    }

    #[must_use]
    pub fn is_completed(self) -> bool {
        matches!(self, LessonStatus::Completed)
    }
}

impl fmt::Display for LessonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LessonStatus {
    type Err = ProgressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "NotStarted" | "Not Started" => Ok(Self::NotStarted),
            "InProgress" | "In Progress" => Ok(Self::InProgress),
            "Completed" => Ok(Self::Completed),
            other => Err(ProgressError::InvalidStatus(other.to_owned())),
        }
    }
}

//
// ─── PATCHES ───────────────────────────────────────────────────────────────────
//

/// Partial update for a progress record: present fields replace, absent fields are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LessonProgressPatch {
    pub status: Option<LessonStatus>,
    pub correct_ids: Option<BTreeSet<StepId>>,
    /// May only restate the size of the resulting `correct_ids`.
    pub correct_count: Option<u32>,
    pub current_section_id: Option<String>,
    pub completed_sections: Option<BTreeSet<String>>,
    /// Completion time to keep when the patched record ends up completed.
    /// Ignored for any other resulting status.
    pub completed_at: Option<DateTime<Utc>>,
}

/// Section-level movement reported while a learner walks through a lesson.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionUpdate {
    pub current_section_id: Option<String>,
    pub completed_sections: Option<Vec<String>>,
    /// Replays never move stored progress.
    pub is_replay: bool,
}

//
// ─── RECORD ────────────────────────────────────────────────────────────────────
//

/// Per-user, per-lesson progress.
///
/// `correct_count` is derived from the set of correct step ids, so a step
/// answered twice is only counted once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonProgressRecord {
    lesson_id: LessonId,
    status: LessonStatus,
    correct_ids: BTreeSet<StepId>,
    current_section_id: Option<String>,
    completed_sections: BTreeSet<String>,
    updated_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

impl LessonProgressRecord {
    /// Default record for a lesson nobody has opened yet.
    #[must_use]
    pub fn not_started(lesson_id: LessonId) -> Self {
        Self {
            lesson_id,
            status: LessonStatus::NotStarted,
            correct_ids: BTreeSet::new(),
            current_section_id: None,
            completed_sections: BTreeSet::new(),
            updated_at: None,
            completed_at: None,
        }
    }

    /// Rehydrate a record from storage or the wire.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::InvalidPersistedState` if a completion time is
    /// present on a record that is not completed.
    pub fn from_persisted(
        lesson_id: LessonId,
        status: LessonStatus,
        correct_ids: BTreeSet<StepId>,
        current_section_id: Option<String>,
        completed_sections: BTreeSet<String>,
        updated_at: Option<DateTime<Utc>>,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<Self, ProgressError> {
        if completed_at.is_some() && !status.is_completed() {
            return Err(ProgressError::InvalidPersistedState(format!(
                "completed_at set on {status} record"
            )));
        }
        Ok(Self {
            lesson_id,
            status,
            correct_ids,
            current_section_id: normalize_section(current_section_id),
            completed_sections: completed_sections
                .into_iter()
                .filter_map(|s| normalize_section(Some(s)))
                .collect(),
            updated_at,
            completed_at,
        })
    }

    #[must_use]
    pub fn lesson_id(&self) -> &LessonId {
        &self.lesson_id
    }

    #[must_use]
    pub fn status(&self) -> LessonStatus {
        self.status
    }

    #[must_use]
    pub fn correct_ids(&self) -> &BTreeSet<StepId> {
        &self.correct_ids
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        u32::try_from(self.correct_ids.len()).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn current_section_id(&self) -> Option<&str> {
        self.current_section_id.as_deref()
    }

    #[must_use]
    pub fn completed_sections(&self) -> &BTreeSet<String> {
        &self.completed_sections
    }

    #[must_use]
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Count a correctly answered step.
    ///
    /// Returns `true` only when the step was not counted before; a
    /// `NotStarted` lesson moves to `InProgress`.
    pub fn mark_correct(&mut self, step: StepId, now: DateTime<Utc>) -> bool {
        if !self.correct_ids.insert(step) {
            return false;
        }
        if self.status == LessonStatus::NotStarted {
            self.status = LessonStatus::InProgress;
        }
        self.updated_at = Some(now);
        true
    }

    /// Mark the lesson completed. Repeated calls keep the first completion time.
    ///
    /// Returns `true` when the status actually changed.
    pub fn complete(&mut self, now: DateTime<Utc>) -> bool {
        if self.status.is_completed() {
            return false;
        }
        self.set_status(LessonStatus::Completed, now);
        self.updated_at = Some(now);
        true
    }

    /// Merge a partial update into this record.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::CorrectCountMismatch` if the patch states a
    /// correct count that disagrees with the resulting step ids. The record is
    /// left untouched in that case.
    pub fn apply_patch(
        &mut self,
        patch: LessonProgressPatch,
        now: DateTime<Utc>,
    ) -> Result<(), ProgressError> {
        let ids_len = patch
            .correct_ids
            .as_ref()
            .map_or(self.correct_ids.len(), BTreeSet::len);
        if let Some(count) = patch.correct_count {
            if usize::try_from(count).ok() != Some(ids_len) {
                return Err(ProgressError::CorrectCountMismatch {
                    count,
                    ids: ids_len,
                });
            }
        }

        if let Some(status) = patch.status {
            self.set_status(status, now);
        }
        if self.status.is_completed() {
            if let Some(at) = patch.completed_at {
                self.completed_at = Some(at);
            }
        }
        if let Some(ids) = patch.correct_ids {
            self.correct_ids = ids;
        }
        if let Some(section) = normalize_section(patch.current_section_id) {
            self.current_section_id = Some(section);
        }
        if let Some(sections) = patch.completed_sections {
            self.completed_sections = sections
                .into_iter()
                .filter_map(|s| normalize_section(Some(s)))
                .collect();
        }
        self.updated_at = Some(now);
        Ok(())
    }

    /// Record forward movement through sections.
    ///
    /// Returns `false` without touching the record for replays.
    pub fn apply_section_update(&mut self, update: SectionUpdate, now: DateTime<Utc>) -> bool {
        if update.is_replay {
            return false;
        }
        if let Some(section) = normalize_section(update.current_section_id) {
            self.current_section_id = Some(section);
        }
        if let Some(sections) = update.completed_sections {
            self.completed_sections = sections
                .into_iter()
                .filter_map(|s| normalize_section(Some(s)))
                .collect();
        }
        if self.status == LessonStatus::NotStarted {
            self.status = LessonStatus::InProgress;
        }
        self.updated_at = Some(now);
        true
    }

    /// Fold another copy of the same lesson into this one (guest -> account).
    ///
    /// The furthest status wins, step and section sets are unioned and the
    /// earliest completion time is kept. Returns `true` if anything changed.
    pub fn absorb(&mut self, other: &LessonProgressRecord, now: DateTime<Utc>) -> bool {
        let before = self.clone();

        if other.status.rank() > self.status.rank() {
            self.status = other.status;
        }
        self.correct_ids.extend(other.correct_ids.iter().cloned());
        self.completed_sections
            .extend(other.completed_sections.iter().cloned());
        if self.current_section_id.is_none() {
            self.current_section_id.clone_from(&other.current_section_id);
        }
        if self.status.is_completed() {
            self.completed_at = match (self.completed_at, other.completed_at) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b).or(Some(now)),
            };
        }

        let changed = *self != before;
        if changed {
            self.updated_at = Some(now);
        }
        changed
    }

    fn set_status(&mut self, status: LessonStatus, now: DateTime<Utc>) {
        match (self.status.is_completed(), status.is_completed()) {
            (false, true) => self.completed_at = Some(now),
            (true, false) => self.completed_at = None,
            _ => {}
        }
        self.status = status;
    }
}

fn normalize_section(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn lesson() -> LessonId {
        LessonId::new("lesson-greetings").unwrap()
    }

    fn step(id: &str) -> StepId {
        StepId::new(id).unwrap()
    }

    #[test]
    fn status_parses_spaced_and_compact_forms() {
        assert_eq!(
            "Not Started".parse::<LessonStatus>().unwrap(),
            LessonStatus::NotStarted
        );
        assert_eq!(
            "InProgress".parse::<LessonStatus>().unwrap(),
            LessonStatus::InProgress
        );
        assert!("Done".parse::<LessonStatus>().is_err());
    }

    #[test]
    fn marking_same_step_twice_counts_once() {
        let now = fixed_now();
        let mut record = LessonProgressRecord::not_started(lesson());

        assert!(record.mark_correct(step("q1"), now));
        assert!(!record.mark_correct(step("q1"), now));
        assert!(record.mark_correct(step("q2"), now));

        assert_eq!(record.correct_count(), 2);
        assert_eq!(record.status(), LessonStatus::InProgress);
    }

    #[test]
    fn completing_twice_keeps_first_timestamp() {
        let now = fixed_now();
        let mut record = LessonProgressRecord::not_started(lesson());

        assert!(record.complete(now));
        assert!(!record.complete(now + Duration::hours(1)));
        assert_eq!(record.completed_at(), Some(now));
    }

    #[test]
    fn patch_with_only_ids_leaves_status_alone() {
        let now = fixed_now();
        let mut record = LessonProgressRecord::not_started(lesson());
        record.complete(now);

        let patch = LessonProgressPatch {
            correct_ids: Some([step("a"), step("b")].into_iter().collect()),
            correct_count: Some(2),
            ..LessonProgressPatch::default()
        };
        record.apply_patch(patch, now).unwrap();

        assert_eq!(record.status(), LessonStatus::Completed);
        assert_eq!(record.correct_count(), 2);
        assert_eq!(record.completed_at(), Some(now));
    }

    #[test]
    fn patch_with_inconsistent_count_is_rejected_without_changes() {
        let now = fixed_now();
        let mut record = LessonProgressRecord::not_started(lesson());
        record.mark_correct(step("a"), now);
        let before = record.clone();

        let err = record
            .apply_patch(
                LessonProgressPatch {
                    correct_count: Some(5),
                    status: Some(LessonStatus::Completed),
                    ..LessonProgressPatch::default()
                },
                now,
            )
            .unwrap_err();

        assert_eq!(err, ProgressError::CorrectCountMismatch { count: 5, ids: 1 });
        assert_eq!(record, before);
    }

    #[test]
    fn patch_carries_completion_time_only_onto_completed_records() {
        let now = fixed_now();
        let earlier = now - Duration::days(3);

        let mut record = LessonProgressRecord::not_started(lesson());
        record
            .apply_patch(
                LessonProgressPatch {
                    status: Some(LessonStatus::Completed),
                    completed_at: Some(earlier),
                    ..LessonProgressPatch::default()
                },
                now,
            )
            .unwrap();
        assert_eq!(record.completed_at(), Some(earlier));
        assert_eq!(record.updated_at(), Some(now));

        let mut open = LessonProgressRecord::not_started(lesson());
        open.apply_patch(
            LessonProgressPatch {
                status: Some(LessonStatus::InProgress),
                completed_at: Some(earlier),
                ..LessonProgressPatch::default()
            },
            now,
        )
        .unwrap();
        assert_eq!(open.completed_at(), None);
    }

    #[test]
    fn leaving_completed_clears_completion_time() {
        let now = fixed_now();
        let mut record = LessonProgressRecord::not_started(lesson());
        record.complete(now);
        record
            .apply_patch(
                LessonProgressPatch {
                    status: Some(LessonStatus::InProgress),
                    ..LessonProgressPatch::default()
                },
                now,
            )
            .unwrap();
        assert_eq!(record.completed_at(), None);
    }

    #[test]
    fn replay_section_update_is_ignored() {
        let now = fixed_now();
        let mut record = LessonProgressRecord::not_started(lesson());
        let changed = record.apply_section_update(
            SectionUpdate {
                current_section_id: Some("s2".into()),
                completed_sections: Some(vec!["s1".into()]),
                is_replay: true,
            },
            now,
        );
        assert!(!changed);
        assert_eq!(record, LessonProgressRecord::not_started(lesson()));
    }

    #[test]
    fn section_update_dedupes_and_starts_lesson() {
        let now = fixed_now();
        let mut record = LessonProgressRecord::not_started(lesson());
        record.apply_section_update(
            SectionUpdate {
                current_section_id: Some("s3".into()),
                completed_sections: Some(vec!["s1".into(), "s2".into(), "s1".into(), " ".into()]),
                is_replay: false,
            },
            now,
        );
        assert_eq!(record.current_section_id(), Some("s3"));
        assert_eq!(record.completed_sections().len(), 2);
        assert_eq!(record.status(), LessonStatus::InProgress);
    }

    #[test]
    fn absorb_takes_furthest_state_and_earliest_completion() {
        let now = fixed_now();
        let earlier = now - Duration::days(1);

        let mut account = LessonProgressRecord::not_started(lesson());
        account.mark_correct(step("a"), now);

        let mut guest = LessonProgressRecord::not_started(lesson());
        guest.mark_correct(step("b"), earlier);
        guest.complete(earlier);

        assert!(account.absorb(&guest, now));
        assert_eq!(account.status(), LessonStatus::Completed);
        assert_eq!(account.correct_count(), 2);
        assert_eq!(account.completed_at(), Some(earlier));

        assert!(!account.absorb(&guest, now));
    }

    #[test]
    fn persisted_completion_time_requires_completed_status() {
        let err = LessonProgressRecord::from_persisted(
            lesson(),
            LessonStatus::InProgress,
            BTreeSet::new(),
            None,
            BTreeSet::new(),
            None,
            Some(fixed_now()),
        )
        .unwrap_err();
        assert!(matches!(err, ProgressError::InvalidPersistedState(_)));
    }
}
