use std::sync::{Arc, Mutex};

use dioxus::core::NoOpMutations;
use dioxus::prelude::*;
use dioxus_router::{Routable, Router};
use lesson_core::model::UserKey;
use lesson_core::time::fixed_clock;
use services::app_services::ensure_default_catalog;
use services::{AudioCue, AudioPlayer, Playback, ProgressService, SpeechPlayer};
use storage::repository::{ProgressRepository, Storage};

use crate::context::{UiApp, build_app_context};
use crate::views::{LearningHistoryView, LessonCompletionView, LessonsView, ProgressDashboard};

/// Captures what the views asked the playback capabilities to do.
#[derive(Default)]
pub struct PlaybackLog {
    pub spoken: Mutex<Vec<String>>,
    pub cues: Mutex<Vec<AudioCue>>,
}

impl SpeechPlayer for PlaybackLog {
    fn speak(&self, text: &str) {
        self.spoken.lock().unwrap().push(text.to_string());
    }
}

impl AudioPlayer for PlaybackLog {
    fn play(&self, cue: AudioCue) {
        self.cues.lock().unwrap().push(cue);
    }
}

#[derive(Clone)]
struct TestApp {
    user: UserKey,
    progress: Arc<ProgressService>,
    playback: Playback,
}

impl UiApp for TestApp {
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

#[derive(Clone, PartialEq, Eq)]
pub enum ViewKind {
    Dashboard,
    Lessons,
    History,
    Completion(String),
}

#[derive(Props, Clone)]
struct ViewHarnessProps {
    app: Arc<TestApp>,
    view: ViewKind,
}

impl PartialEq for ViewHarnessProps {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

#[component]
fn ViewRouterHarness(props: ViewHarnessProps) -> Element {
    let app: Arc<dyn UiApp> = props.app.clone();
    use_context_provider(|| build_app_context(&app));
    use_context_provider(|| props.view.clone());
    rsx! { Router::<TestRoute> {} }
}

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
enum TestRoute {
    #[route("/")]
    Root {},
}

#[component]
fn Root() -> Element {
    let view = use_context::<ViewKind>();
    match view {
        ViewKind::Dashboard => rsx! { ProgressDashboard {} },
        ViewKind::Lessons => rsx! { LessonsView {} },
        ViewKind::History => rsx! { LearningHistoryView {} },
        ViewKind::Completion(lesson_id) => rsx! { LessonCompletionView { lesson_id } },
    }
}

pub struct ViewHarness {
    pub dom: VirtualDom,
    pub storage: Storage,
    pub user: UserKey,
    pub progress: Arc<ProgressService>,
    pub playback_log: Arc<PlaybackLog>,
}

impl ViewHarness {
    pub fn rebuild(&mut self) {
        self.dom.rebuild_in_place();
        drive_dom(&mut self.dom);
    }

    pub async fn drive_async(&mut self) {
        let _ = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            self.dom.wait_for_work(),
        )
        .await;
        self.dom.render_immediate(&mut NoOpMutations);
        self.dom.process_events();
    }

    /// Rebuild, then let pending resources settle.
    pub async fn settle(&mut self) {
        self.rebuild();
        for _ in 0..3 {
            self.drive_async().await;
        }
    }

    pub fn render(&self) -> String {
        dioxus_ssr::render(&self.dom)
    }
}

pub fn drive_dom(dom: &mut VirtualDom) {
    dom.process_events();
    dom.render_immediate(&mut NoOpMutations);
    dom.process_events();
}

pub async fn setup_view_harness(view: ViewKind) -> ViewHarness {
    let storage = Storage::in_memory();
    let progress_repo = Arc::clone(&storage.progress);
    setup_view_harness_with_progress_repo(view, storage, progress_repo).await
}

pub async fn setup_view_harness_with_progress_repo(
    view: ViewKind,
    storage: Storage,
    progress_repo: Arc<dyn ProgressRepository>,
) -> ViewHarness {
    ensure_default_catalog(storage.lessons.as_ref())
        .await
        .expect("catalog");
    let progress = Arc::new(ProgressService::new(
        fixed_clock(),
        Arc::clone(&storage.lessons),
        progress_repo,
    ));
    let playback_log = Arc::new(PlaybackLog::default());
    let user = UserKey::normalize(Some("learner"));

    let app = Arc::new(TestApp {
        user: user.clone(),
        progress: Arc::clone(&progress),
        playback: Playback::new(playback_log.clone(), playback_log.clone()),
    });

    let dom = VirtualDom::new_with_props(ViewRouterHarness, ViewHarnessProps { app, view });

    ViewHarness {
        dom,
        storage,
        user,
        progress,
        playback_log,
    }
}
