use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use lesson_core::model::UserKey;
use services::progress::wire::USER_HEADER;
use std::convert::Infallible;

/// Caller identity taken from the user header; missing, blank or non-UTF-8
/// values resolve to the anonymous key.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserKey);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok());
        Ok(Self(UserKey::normalize(raw)))
    }
}
