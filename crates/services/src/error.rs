//! Shared error types for the services crate.

use thiserror::Error;

use lesson_core::model::{LessonError, LessonIdError, ProgressError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressServiceError {
    /// Malformed lesson or step id; raised before the store is touched.
    #[error(transparent)]
    Validation(#[from] LessonIdError),
    /// A write that would break a record invariant.
    #[error(transparent)]
    Record(#[from] ProgressError),
    #[error("progress store unavailable: {0}")]
    StoreUnavailable(#[from] StorageError),
}

impl ProgressServiceError {
    /// Caller-side mistakes that retrying will not fix.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Record(_))
    }

    #[must_use]
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}

/// Errors emitted by `HttpProgressStore`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HttpStoreError {
    #[error("progress api returned status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("progress api returned malformed data: {0}")]
    Decode(String),
    #[error("lesson catalog is read-only over http")]
    ReadOnly,
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl From<HttpStoreError> for StorageError {
    fn from(err: HttpStoreError) -> Self {
        match err {
            HttpStoreError::Decode(msg) => StorageError::Serialization(msg),
            HttpStoreError::ReadOnly => StorageError::Conflict,
            other => StorageError::Connection(other.to_string()),
        }
    }
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Lesson(#[from] LessonError),
}
