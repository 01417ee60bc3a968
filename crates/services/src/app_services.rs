use std::sync::Arc;

use lesson_core::model::default_catalog;
use storage::repository::{LessonRepository, Storage};
use tracing::info;

use crate::Clock;
use crate::error::AppServicesError;
use crate::progress::{HttpProgressStore, ProgressService};

/// Assembles app-facing services over the chosen progress store.
#[derive(Clone)]
pub struct AppServices {
    progress: Arc<ProgressService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or catalog setup fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::from_storage(&storage, clock).await
    }

    /// Build services over an already opened storage bundle.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the default catalog cannot be written.
    pub async fn from_storage(storage: &Storage, clock: Clock) -> Result<Self, AppServicesError> {
        ensure_default_catalog(storage.lessons.as_ref()).await?;
        Ok(Self {
            progress: Arc::new(ProgressService::from_storage(clock, storage)),
        })
    }

    /// Build services that read and write through a remote progress API.
    #[must_use]
    pub fn remote(api_url: &str, clock: Clock) -> Self {
        let store = Arc::new(HttpProgressStore::new(api_url));
        Self {
            progress: Arc::new(ProgressService::new(clock, store.clone(), store)),
        }
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }
}

/// Write the starter lessons when the catalog is empty.
///
/// Returns `true` if lessons were written.
///
/// # Errors
///
/// Returns `AppServicesError` if the catalog cannot be read or written.
pub async fn ensure_default_catalog(
    lessons: &dyn LessonRepository,
) -> Result<bool, AppServicesError> {
    if !lessons.list_lessons().await?.is_empty() {
        return Ok(false);
    }

    let catalog = default_catalog()?;
    for lesson in &catalog {
        lessons.upsert_lesson(lesson).await?;
    }
    info!(lessons = catalog.len(), "default lesson catalog written");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lesson_core::model::UserKey;
    use lesson_core::time::fixed_clock;

    #[tokio::test]
    async fn bootstrap_writes_catalog_once() {
        let storage = Storage::in_memory();
        assert!(ensure_default_catalog(storage.lessons.as_ref()).await.unwrap());
        assert!(!ensure_default_catalog(storage.lessons.as_ref()).await.unwrap());

        let services = AppServices::from_storage(&storage, fixed_clock())
            .await
            .unwrap();
        let summary = services
            .progress()
            .get_progress_summary(&UserKey::anonymous())
            .await
            .unwrap();
        assert_eq!(summary.total_lessons(), 3);
    }
}
