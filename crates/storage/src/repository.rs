use async_trait::async_trait;
use lesson_core::model::{Lesson, LessonId, LessonProgressRecord, UserKey};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Per-user lesson progress. Records are never deleted; last write wins.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Fetch the record for one lesson.
    ///
    /// Returns `Ok(None)` when the learner never touched the lesson.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be reached or the row is corrupt.
    async fn get_record(
        &self,
        user: &UserKey,
        lesson_id: &LessonId,
    ) -> Result<Option<LessonProgressRecord>, StorageError>;

    /// All records of a user, ordered by lesson id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be reached or a row is corrupt.
    async fn list_records(&self, user: &UserKey) -> Result<Vec<LessonProgressRecord>, StorageError>;

    /// Insert or overwrite the record for `(user, record.lesson_id())`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn upsert_record(
        &self,
        user: &UserKey,
        record: &LessonProgressRecord,
    ) -> Result<(), StorageError>;
}

/// Lesson catalog; its size is the summary total.
#[async_trait]
pub trait LessonRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the lesson cannot be stored.
    async fn upsert_lesson(&self, lesson: &Lesson) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on connection or mapping failures.
    async fn get_lesson(&self, id: &LessonId) -> Result<Option<Lesson>, StorageError>;

    /// Lessons ordered by position, then id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or mapping failures.
    async fn list_lessons(&self) -> Result<Vec<Lesson>, StorageError>;
}

/// Simple in-memory repository implementation for tests and guest sessions.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    lessons: Arc<Mutex<HashMap<LessonId, Lesson>>>,
    progress: Arc<Mutex<HashMap<UserKey, BTreeMap<LessonId, LessonProgressRecord>>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn get_record(
        &self,
        user: &UserKey,
        lesson_id: &LessonId,
    ) -> Result<Option<LessonProgressRecord>, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .get(user)
            .and_then(|records| records.get(lesson_id))
            .cloned())
    }

    async fn list_records(&self, user: &UserKey) -> Result<Vec<LessonProgressRecord>, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .get(user)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn upsert_record(
        &self,
        user: &UserKey,
        record: &LessonProgressRecord,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .entry(user.clone())
            .or_default()
            .insert(record.lesson_id().clone(), record.clone());
        Ok(())
    }
}

#[async_trait]
impl LessonRepository for InMemoryRepository {
    async fn upsert_lesson(&self, lesson: &Lesson) -> Result<(), StorageError> {
        let mut guard = self
            .lessons
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(lesson.id().clone(), lesson.clone());
        Ok(())
    }

    async fn get_lesson(&self, id: &LessonId) -> Result<Option<Lesson>, StorageError> {
        let guard = self
            .lessons
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(id).cloned())
    }

    async fn list_lessons(&self) -> Result<Vec<Lesson>, StorageError> {
        let guard = self
            .lessons
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut lessons: Vec<Lesson> = guard.values().cloned().collect();
        lessons.sort_by(|a, b| {
            a.position()
                .cmp(&b.position())
                .then_with(|| a.id().cmp(b.id()))
        });
        Ok(lessons)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub lessons: Arc<dyn LessonRepository>,
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let lessons: Arc<dyn LessonRepository> = Arc::new(repo.clone());
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo);
        Self { lessons, progress }
    }
}
