use thiserror::Error;

use crate::model::ids::{LessonId, LessonIdError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LessonError {
    #[error("lesson title cannot be empty")]
    EmptyTitle,

    #[error(transparent)]
    InvalidId(#[from] LessonIdError),
}

/// Catalog entry for a lesson; the catalog size is the summary total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lesson {
    id: LessonId,
    title: String,
    position: u32,
}

impl Lesson {
    /// # Errors
    ///
    /// Returns `LessonError::EmptyTitle` if the title is blank after trimming.
    pub fn new(id: LessonId, title: impl Into<String>, position: u32) -> Result<Self, LessonError> {
        let title = title.into();
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return Err(LessonError::EmptyTitle);
        }
        Ok(Self {
            id,
            title: trimmed.to_owned(),
            position,
        })
    }

    #[must_use]
    pub fn id(&self) -> &LessonId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn position(&self) -> u32 {
        self.position
    }
}

/// The starter lessons every fresh install ships with.
///
/// # Errors
///
/// Returns `LessonError` only if the built-in table is edited into an invalid state.
pub fn default_catalog() -> Result<Vec<Lesson>, LessonError> {
    const STARTER: [(&str, &str); 3] = [
        ("lesson-greetings", "Greetings"),
        ("lesson-vocabulary", "Basic Words"),
        ("lesson-numbers", "Numbers"),
    ];

    STARTER
        .iter()
        .zip(1_u32..)
        .map(|((id, title), position)| -> Result<Lesson, LessonError> {
            Lesson::new(LessonId::new(id)?, *title, position)
        })
        .collect()
}
