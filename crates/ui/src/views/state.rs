use dioxus::prelude::*;
use services::ProgressServiceError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewError {
    /// The progress store could not be reached.
    Unavailable,
    /// The request itself was malformed, e.g. a bad lesson id in the URL.
    Invalid,
}

impl ViewError {
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            ViewError::Unavailable => "Something went wrong. Please try again.",
            ViewError::Invalid => "That lesson could not be found.",
        }
    }
}

impl From<ProgressServiceError> for ViewError {
    fn from(err: ProgressServiceError) -> Self {
        if err.is_validation() {
            ViewError::Invalid
        } else {
            ViewError::Unavailable
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ViewState<T> {
    Idle,
    Loading,
    Ready(T),
    Error(ViewError),
}

#[must_use]
pub fn view_state_from_resource<T: Clone>(
    resource: &Resource<Result<T, ViewError>>,
) -> ViewState<T> {
    match resource.state().cloned() {
        UseResourceState::Pending => ViewState::Loading,
        UseResourceState::Ready => match resource.value().read().as_ref() {
            Some(Ok(data)) => ViewState::Ready(data.clone()),
            Some(Err(err)) => ViewState::Error(*err),
            None => ViewState::Error(ViewError::Unavailable),
        },
        UseResourceState::Paused | UseResourceState::Stopped => ViewState::Idle,
    }
}
