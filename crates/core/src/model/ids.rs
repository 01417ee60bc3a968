use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Longest lesson identifier accepted, in bytes.
pub const MAX_LESSON_ID_LEN: usize = 128;

/// Partition key used for guests and unauthenticated callers.
pub const ANONYMOUS_USER: &str = "anonymous";

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Reasons a lesson identifier is rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LessonIdError {
    #[error("lesson id cannot be empty")]
    Empty,

    #[error("lesson id is longer than 128 bytes")]
    TooLong,

    #[error("lesson id contains invalid character {0:?}")]
    InvalidChar(char),

    #[error("step id cannot be empty")]
    EmptyStep,
}

//
// ─── LESSON ID ─────────────────────────────────────────────────────────────────
//

/// Stable identifier of a lesson (e.g. `lesson-greetings`).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LessonId(String);

impl LessonId {
    /// Validate and create a lesson identifier.
    ///
    /// Surrounding whitespace is trimmed. Allowed characters are ASCII
    /// alphanumerics plus `-`, `_`, `.` and `:`.
    ///
    /// # Errors
    ///
    /// Returns `LessonIdError` if the value is empty, too long, or contains
    /// characters outside the allowed set.
    pub fn new(value: impl AsRef<str>) -> Result<Self, LessonIdError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(LessonIdError::Empty);
        }
        if trimmed.len() > MAX_LESSON_ID_LEN {
            return Err(LessonIdError::TooLong);
        }
        if let Some(bad) = trimmed
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':')))
        {
            return Err(LessonIdError::InvalidChar(bad));
        }
        Ok(Self(trimmed.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for LessonId {
    type Error = LessonIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LessonId> for String {
    fn from(value: LessonId) -> Self {
        value.0
    }
}

impl FromStr for LessonId {
    type Err = LessonIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Debug for LessonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LessonId({})", self.0)
    }
}

impl fmt::Display for LessonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

//
// ─── STEP ID ───────────────────────────────────────────────────────────────────
//

/// Identifier of one interaction step inside a lesson.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StepId(String);

impl StepId {
    /// # Errors
    ///
    /// Returns `LessonIdError::EmptyStep` if the value is blank.
    pub fn new(value: impl AsRef<str>) -> Result<Self, LessonIdError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(LessonIdError::EmptyStep);
        }
        Ok(Self(trimmed.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for StepId {
    type Error = LessonIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<StepId> for String {
    fn from(value: StepId) -> Self {
        value.0
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

//
// ─── USER KEY ──────────────────────────────────────────────────────────────────
//

/// Normalized key that partitions progress records per learner.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct UserKey(String);

impl UserKey {
    /// Normalize an optional raw identifier; absent or blank values map to
    /// [`ANONYMOUS_USER`].
    #[must_use]
    pub fn normalize(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(value) if !value.is_empty() => Self(value.to_owned()),
            _ => Self::anonymous(),
        }
    }

    #[must_use]
    pub fn anonymous() -> Self {
        Self(ANONYMOUS_USER.to_owned())
    }

    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.0 == ANONYMOUS_USER
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for UserKey {
    fn from(value: String) -> Self {
        Self::normalize(Some(&value))
    }
}

impl From<UserKey> for String {
    fn from(value: UserKey) -> Self {
        value.0
    }
}

impl fmt::Debug for UserKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserKey({})", self.0)
    }
}

impl fmt::Display for UserKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Loosely-shaped identity as handed over by an auth layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    #[serde(default, alias = "_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

impl UserIdentity {
    #[must_use]
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }
}

/// Map an optional identity to its partition key: the first non-blank of
/// `id`, `email`, `username`, otherwise the anonymous key.
#[must_use]
pub fn normalize_user_id(user: Option<&UserIdentity>) -> UserKey {
    let Some(user) = user else {
        return UserKey::anonymous();
    };
    let candidate = [&user.id, &user.email, &user.username]
        .into_iter()
        .flatten()
        .map(|value| value.trim())
        .find(|value| !value.is_empty());
    UserKey::normalize(candidate)
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
