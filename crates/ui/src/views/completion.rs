use dioxus::prelude::*;
use dioxus_router::Link;
use services::playback::COMPLETION_MESSAGE;

use crate::context::AppContext;
use crate::routes::Route;
use crate::views::{ViewError, ViewState, view_state_from_resource};

/// Records the lesson as completed as soon as it is shown.
#[component]
pub fn LessonCompletionView(lesson_id: String) -> Element {
    let ctx = use_context::<AppContext>();
    let progress = ctx.progress();
    let playback = ctx.playback();
    let user = ctx.user();

    let resource = use_resource(move || {
        let progress = progress.clone();
        let playback = playback.clone();
        let user = user.clone();
        let lesson_id = lesson_id.clone();
        async move {
            let ack = progress
                .complete_lesson(&user, &lesson_id)
                .await
                .map_err(ViewError::from)?;
            if ack.success {
                playback.announce_completion();
            }
            Ok::<_, ViewError>(ack.success)
        }
    });

    let state = match view_state_from_resource(&resource) {
        ViewState::Ready(false) => ViewState::Error(ViewError::Unavailable),
        other => other,
    };

    rsx! {
        div { class: "page completion-page",
            match state {
                ViewState::Idle | ViewState::Loading => rsx! {
                    p { "Loading..." }
                },
                ViewState::Ready(_) => rsx! {
                    p { class: "success", "{COMPLETION_MESSAGE}" }
                    nav { class: "completion-links",
                        Link { to: Route::Dashboard {}, "Back to progress" }
                        Link { to: Route::Lessons {}, "More lessons" }
                    }
                },
                ViewState::Error(err) => rsx! {
                    p { class: "error", "{err.message()}" }
                    button {
                        class: "btn btn-secondary",
                        r#type: "button",
                        onclick: move |_| {
                            let mut resource = resource;
                            resource.restart();
                        },
                        "Retry"
                    }
                },
            }
        }
    }
}
