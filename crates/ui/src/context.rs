use std::sync::Arc;

use lesson_core::model::UserKey;
use services::{Playback, ProgressService};

/// What the composition root hands to the UI. Identity and capabilities
/// are explicit; views never reach for globals.
pub trait UiApp: Send + Sync {
    fn user(&self) -> UserKey;
    fn progress(&self) -> Arc<ProgressService>;
    fn playback(&self) -> Playback;
}

#[derive(Clone)]
pub struct AppContext {
    user: UserKey,
    progress: Arc<ProgressService>,
    playback: Playback,
}

impl AppContext {
    #[must_use]
    pub fn new(app: &Arc<dyn UiApp>) -> Self {
        Self {
            user: app.user(),
            progress: app.progress(),
            playback: app.playback(),
        }
    }

    #[must_use]
    pub fn user(&self) -> UserKey {
        self.user.clone()
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn playback(&self) -> Playback {
        self.playback.clone()
    }
}

/// Build an `AppContext` from a UI-facing app implementation.
#[must_use]
pub fn build_app_context(app: &Arc<dyn UiApp>) -> AppContext {
    AppContext::new(app)
}
