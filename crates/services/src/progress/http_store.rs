use std::collections::BTreeMap;

use async_trait::async_trait;
use lesson_core::model::{Lesson, LessonId, LessonProgressRecord, UserKey};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use storage::repository::{LessonRepository, ProgressRepository, StorageError};

use super::wire::{LessonDto, ProgressPatchDto, ProgressRecordDto, USER_HEADER};
use crate::error::HttpStoreError;

/// Progress store backed by the REST API of a remote server.
///
/// Writes are full-state `PUT /progress/:lessonId` bodies, completion time
/// included. Reads go through `GET /progress`, which lists only stored
/// records; the per-lesson endpoint would report untouched lessons as a
/// default record.
#[derive(Clone)]
pub struct HttpProgressStore {
    client: Client,
    base_url: String,
}

impl HttpProgressStore {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{path}", self.base_url.trim_end_matches('/'))
    }

    async fn send(request: RequestBuilder) -> Result<Response, HttpStoreError> {
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(HttpStoreError::HttpStatus(response.status()));
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        user: Option<&UserKey>,
        path: &str,
    ) -> Result<T, HttpStoreError> {
        let mut request = self.client.get(self.url(path));
        if let Some(user) = user {
            request = request.header(USER_HEADER, user.as_str());
        }
        let response = Self::send(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| HttpStoreError::Decode(e.to_string()))
    }
}

fn decode_record(dto: ProgressRecordDto) -> Result<LessonProgressRecord, StorageError> {
    dto.into_record()
        .map_err(|e| StorageError::from(HttpStoreError::Decode(e.to_string())))
}

#[async_trait]
impl ProgressRepository for HttpProgressStore {
    async fn get_record(
        &self,
        user: &UserKey,
        lesson_id: &LessonId,
    ) -> Result<Option<LessonProgressRecord>, StorageError> {
        let mut map: BTreeMap<String, ProgressRecordDto> =
            self.get_json(Some(user), "/progress").await?;
        map.remove(lesson_id.as_str()).map(decode_record).transpose()
    }

    async fn list_records(&self, user: &UserKey) -> Result<Vec<LessonProgressRecord>, StorageError> {
        let map: BTreeMap<String, ProgressRecordDto> =
            self.get_json(Some(user), "/progress").await?;
        map.into_values().map(decode_record).collect()
    }

    async fn upsert_record(
        &self,
        user: &UserKey,
        record: &LessonProgressRecord,
    ) -> Result<(), StorageError> {
        let request = self
            .client
            .put(self.url(&format!("/progress/{}", record.lesson_id())))
            .header(USER_HEADER, user.as_str())
            .json(&ProgressPatchDto::from_record(record));
        Self::send(request).await?;
        Ok(())
    }
}

#[async_trait]
impl LessonRepository for HttpProgressStore {
    async fn upsert_lesson(&self, _lesson: &Lesson) -> Result<(), StorageError> {
        Err(HttpStoreError::ReadOnly.into())
    }

    async fn get_lesson(&self, id: &LessonId) -> Result<Option<Lesson>, StorageError> {
        let lessons = self.list_lessons().await?;
        Ok(lessons.into_iter().find(|lesson| lesson.id() == id))
    }

    async fn list_lessons(&self) -> Result<Vec<Lesson>, StorageError> {
        let dtos: Vec<LessonDto> = self.get_json(None, "/lessons").await?;
        dtos.into_iter()
            .map(|dto| {
                dto.into_lesson()
                    .map_err(|e| StorageError::from(HttpStoreError::Decode(e.to_string())))
            })
            .collect()
    }
}
