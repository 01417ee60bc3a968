//! Progress aggregation: summaries, completion and partial saves over a
//! progress store.

mod http_store;
pub mod wire;

use std::collections::BTreeMap;
use std::sync::Arc;

use lesson_core::model::{
    CompletedLesson, Lesson, LessonId, LessonProgressPatch, LessonProgressRecord, ProgressSummary,
    SectionUpdate, StepId, UserKey, completion_history,
};
use serde::{Deserialize, Serialize};
use storage::repository::{LessonRepository, ProgressRepository, Storage, StorageError};
use tracing::{debug, info, warn};

use crate::Clock;
use crate::error::ProgressServiceError;

pub use http_store::HttpProgressStore;

/// Acknowledgement returned by write operations with no other payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
}

impl Ack {
    #[must_use]
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Outcome of reporting a correct answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectAnswer {
    /// `false` when the step had already been counted.
    pub counted: bool,
    pub progress: LessonProgressRecord,
}

/// Aggregates per-user lesson progress and owns the write path.
///
/// Every operation is a short read-modify-write against the store; concurrent
/// writers on the same record resolve as last write wins.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    lessons: Arc<dyn LessonRepository>,
    progress: Arc<dyn ProgressRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(
        clock: Clock,
        lessons: Arc<dyn LessonRepository>,
        progress: Arc<dyn ProgressRepository>,
    ) -> Self {
        Self {
            clock,
            lessons,
            progress,
        }
    }

    #[must_use]
    pub fn from_storage(clock: Clock, storage: &Storage) -> Self {
        Self::new(
            clock,
            Arc::clone(&storage.lessons),
            Arc::clone(&storage.progress),
        )
    }

    /// Summarize the user's progress against the lesson catalog.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::StoreUnavailable` if the store cannot be read.
    pub async fn get_progress_summary(
        &self,
        user: &UserKey,
    ) -> Result<ProgressSummary, ProgressServiceError> {
        let lessons = self
            .lessons
            .list_lessons()
            .await
            .map_err(store_failure("list_lessons"))?;
        let records = self
            .progress
            .list_records(user)
            .await
            .map_err(store_failure("list_records"))?;

        let summary = ProgressSummary::from_catalog(&lessons, &records);
        debug!(
            %user,
            completed = summary.completed_lessons(),
            total = summary.total_lessons(),
            "progress summary"
        );
        Ok(summary)
    }

    /// Mark a lesson completed. Completing an already completed lesson is a
    /// successful no-op.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Validation` for a malformed lesson id.
    /// Returns `ProgressServiceError::StoreUnavailable` if the store fails.
    pub async fn complete_lesson(
        &self,
        user: &UserKey,
        lesson_id: &str,
    ) -> Result<Ack, ProgressServiceError> {
        let lesson_id = LessonId::new(lesson_id)?;
        let mut record = self.load(user, &lesson_id).await?;

        if record.complete(self.clock.now()) {
            self.store(user, &record).await?;
            info!(%user, lesson = %lesson_id, "lesson completed");
        } else {
            debug!(%user, lesson = %lesson_id, "lesson already completed");
        }
        Ok(Ack::ok())
    }

    /// Merge a partial update into the stored record and return the result.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Validation` for a malformed lesson id,
    /// `ProgressServiceError::Record` if the patch contradicts itself, and
    /// `ProgressServiceError::StoreUnavailable` if the store fails.
    pub async fn save_lesson_progress(
        &self,
        user: &UserKey,
        lesson_id: &str,
        patch: LessonProgressPatch,
    ) -> Result<LessonProgressRecord, ProgressServiceError> {
        let lesson_id = LessonId::new(lesson_id)?;
        let mut record = self.load(user, &lesson_id).await?;
        record.apply_patch(patch, self.clock.now())?;
        self.store(user, &record).await?;
        info!(%user, lesson = %lesson_id, status = %record.status(), "lesson progress saved");
        Ok(record)
    }

    /// Stored record for one lesson, or a fresh `NotStarted` one. Never writes.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Validation` for a malformed lesson id.
    /// Returns `ProgressServiceError::StoreUnavailable` if the store fails.
    pub async fn get_lesson_progress(
        &self,
        user: &UserKey,
        lesson_id: &str,
    ) -> Result<LessonProgressRecord, ProgressServiceError> {
        let lesson_id = LessonId::new(lesson_id)?;
        self.load(user, &lesson_id).await
    }

    /// All stored records of the user keyed by lesson.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::StoreUnavailable` if the store fails.
    pub async fn get_all_lesson_progress(
        &self,
        user: &UserKey,
    ) -> Result<BTreeMap<LessonId, LessonProgressRecord>, ProgressServiceError> {
        let records = self
            .progress
            .list_records(user)
            .await
            .map_err(store_failure("list_records"))?;
        Ok(records
            .into_iter()
            .map(|record| (record.lesson_id().clone(), record))
            .collect())
    }

    /// Create the record when a lesson is opened for the first time.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Validation` for a malformed lesson id.
    /// Returns `ProgressServiceError::StoreUnavailable` if the store fails.
    pub async fn open_lesson(
        &self,
        user: &UserKey,
        lesson_id: &str,
    ) -> Result<LessonProgressRecord, ProgressServiceError> {
        let lesson_id = LessonId::new(lesson_id)?;
        if let Some(existing) = self
            .progress
            .get_record(user, &lesson_id)
            .await
            .map_err(store_failure("get_record"))?
        {
            return Ok(existing);
        }

        let record = LessonProgressRecord::not_started(lesson_id);
        self.store(user, &record).await?;
        info!(%user, lesson = %record.lesson_id(), "lesson opened");
        Ok(record)
    }

    /// Count a correctly answered step. Only a step's first correct answer
    /// is written.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Validation` for malformed ids.
    /// Returns `ProgressServiceError::StoreUnavailable` if the store fails.
    pub async fn record_correct_answer(
        &self,
        user: &UserKey,
        lesson_id: &str,
        step_id: &str,
    ) -> Result<CorrectAnswer, ProgressServiceError> {
        let lesson_id = LessonId::new(lesson_id)?;
        let step = StepId::new(step_id)?;
        let mut record = self.load(user, &lesson_id).await?;

        let counted = record.mark_correct(step, self.clock.now());
        if counted {
            self.store(user, &record).await?;
            debug!(%user, lesson = %lesson_id, correct = record.correct_count(), "correct answer counted");
        }
        Ok(CorrectAnswer {
            counted,
            progress: record,
        })
    }

    /// Move the resume position and completed sections forward. Replays
    /// return the stored state untouched.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Validation` for a malformed lesson id.
    /// Returns `ProgressServiceError::StoreUnavailable` if the store fails.
    pub async fn update_section_progress(
        &self,
        user: &UserKey,
        lesson_id: &str,
        update: SectionUpdate,
    ) -> Result<LessonProgressRecord, ProgressServiceError> {
        let lesson_id = LessonId::new(lesson_id)?;
        let mut record = self.load(user, &lesson_id).await?;

        if record.apply_section_update(update, self.clock.now()) {
            self.store(user, &record).await?;
            debug!(%user, lesson = %lesson_id, section = ?record.current_section_id(), "section progress saved");
        } else {
            debug!(%user, lesson = %lesson_id, "replay ignored");
        }
        Ok(record)
    }

    /// Completed lessons in the order they were finished.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::StoreUnavailable` if the store fails.
    pub async fn completion_history(
        &self,
        user: &UserKey,
    ) -> Result<Vec<CompletedLesson>, ProgressServiceError> {
        let lessons = self.list_lessons().await?;
        let records = self
            .progress
            .list_records(user)
            .await
            .map_err(store_failure("list_records"))?;
        Ok(completion_history(&lessons, &records))
    }

    /// # Errors
    ///
    /// Returns `ProgressServiceError::StoreUnavailable` if the store fails.
    pub async fn list_lessons(&self) -> Result<Vec<Lesson>, ProgressServiceError> {
        let lessons = self
            .lessons
            .list_lessons()
            .await
            .map_err(store_failure("list_lessons"))?;
        Ok(lessons)
    }

    /// Fold progress recorded as a guest into `user`. Guest records are kept.
    ///
    /// Returns the number of records written for `user`.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::StoreUnavailable` if the store fails;
    /// records merged before the failure stay merged.
    pub async fn reconcile_guest_progress(
        &self,
        user: &UserKey,
    ) -> Result<usize, ProgressServiceError> {
        if user.is_anonymous() {
            return Ok(0);
        }

        let guest = self
            .progress
            .list_records(&UserKey::anonymous())
            .await
            .map_err(store_failure("list_records"))?;
        let now = self.clock.now();

        let mut merged = 0;
        for guest_record in &guest {
            let target = match self
                .progress
                .get_record(user, guest_record.lesson_id())
                .await
                .map_err(store_failure("get_record"))?
            {
                Some(mut existing) => {
                    if !existing.absorb(guest_record, now) {
                        continue;
                    }
                    existing
                }
                None => guest_record.clone(),
            };
            self.store(user, &target).await?;
            merged += 1;
        }

        info!(%user, merged, "guest progress reconciled");
        Ok(merged)
    }

    async fn load(
        &self,
        user: &UserKey,
        lesson_id: &LessonId,
    ) -> Result<LessonProgressRecord, ProgressServiceError> {
        let record = self
            .progress
            .get_record(user, lesson_id)
            .await
            .map_err(store_failure("get_record"))?;
        Ok(record.unwrap_or_else(|| LessonProgressRecord::not_started(lesson_id.clone())))
    }

    async fn store(
        &self,
        user: &UserKey,
        record: &LessonProgressRecord,
    ) -> Result<(), ProgressServiceError> {
        self.progress
            .upsert_record(user, record)
            .await
            .map_err(store_failure("upsert_record"))
    }
}

fn store_failure(op: &'static str) -> impl FnOnce(StorageError) -> ProgressServiceError {
    move |err| {
        warn!(op, error = %err, "progress store call failed");
        ProgressServiceError::StoreUnavailable(err)
    }
}
