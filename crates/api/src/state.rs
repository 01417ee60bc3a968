use std::sync::Arc;

use services::ProgressService;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct ApiState {
    pub progress: Arc<ProgressService>,
}

impl ApiState {
    #[must_use]
    pub fn new(progress: Arc<ProgressService>) -> Self {
        Self { progress }
    }
}
