use std::sync::Arc;

use dioxus::LaunchBuilder;
use dioxus::desktop::{Config as DesktopConfig, WindowBuilder};
use lesson_core::model::UserKey;
use services::{Playback, ProgressService};
use ui::{App, UiApp, build_app_context};

struct DesktopApp {
    user: UserKey,
    progress: Arc<ProgressService>,
    playback: Playback,
}

impl UiApp for DesktopApp {
    fn user(&self) -> UserKey {
        self.user.clone()
    }

    fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    fn playback(&self) -> Playback {
        self.playback.clone()
    }
}

/// Open the desktop window. Blocks until the window is closed.
pub fn launch(user: UserKey, progress: Arc<ProgressService>) {
    // No speech engine on desktop yet.
    let app: Arc<dyn UiApp> = Arc::new(DesktopApp {
        user,
        progress,
        playback: Playback::silent(),
    });
    let context = build_app_context(&app);

    let desktop_cfg = DesktopConfig::new().with_window(
        WindowBuilder::new()
            .with_title("Lessons")
            .with_always_on_top(false),
    );

    LaunchBuilder::desktop()
        .with_cfg(desktop_cfg)
        .with_context(context)
        .launch(App);
}
