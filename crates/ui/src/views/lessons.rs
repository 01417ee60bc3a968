use dioxus::prelude::*;
use dioxus_router::Link;

use crate::context::AppContext;
use crate::routes::Route;
use crate::views::{ViewError, ViewState, view_state_from_resource};
use crate::vm::map_lesson_rows;

#[component]
pub fn LessonsView() -> Element {
    let ctx = use_context::<AppContext>();
    let progress = ctx.progress();
    let user = ctx.user();

    let resource = use_resource(move || {
        let progress = progress.clone();
        let user = user.clone();
        async move {
            let lessons = progress.list_lessons().await.map_err(ViewError::from)?;
            let records = progress
                .get_all_lesson_progress(&user)
                .await
                .map_err(ViewError::from)?;
            Ok::<_, ViewError>(map_lesson_rows(&lessons, &records))
        }
    });

    let state = view_state_from_resource(&resource);

    rsx! {
        div { class: "page",
            h2 { "Lessons" }

            match state {
                ViewState::Idle => rsx! {
                    p { "Idle" }
                },
                ViewState::Loading => rsx! {
                    p { "Loading..." }
                },
                ViewState::Ready(rows) => rsx! {
                    ul { class: "lesson-list",
                        for row in rows {
                            li { key: "{row.lesson_id}",
                                span { class: "lesson-title", "{row.title}" }
                                span { class: "lesson-status", "{row.status_label}" }
                                if !row.completed {
                                    Link {
                                        to: Route::CompleteLesson { lesson_id: row.lesson_id.clone() },
                                        "Finish lesson"
                                    }
                                }
                            }
                        }
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
