use dioxus::prelude::*;

use crate::context::AppContext;
use crate::views::{ViewError, ViewState, view_state_from_resource};
use crate::vm::{HistoryEntryVm, map_history_entries};

#[component]
pub fn LearningHistoryView() -> Element {
    let ctx = use_context::<AppContext>();
    let progress = ctx.progress();
    let user = ctx.user();

    let resource = use_resource(move || {
        let progress = progress.clone();
        let user = user.clone();
        async move {
            let entries = progress
                .completion_history(&user)
                .await
                .map_err(ViewError::from)?;
            Ok::<_, ViewError>(map_history_entries(&entries))
        }
    });

    let state = view_state_from_resource(&resource);

    rsx! {
        div { class: "page",
            h2 { "Learning History" }

            match state {
                ViewState::Idle => rsx! {
                    p { "Idle" }
                },
                ViewState::Loading => rsx! {
                    p { "Loading..." }
                },
                ViewState::Ready(entries) => rsx! {
                    if entries.is_empty() {
                        p { "No completed lessons yet." }
                    } else {
                        ul { class: "history-list",
                            for entry in entries {
                                HistoryRow { entry }
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

#[component]
fn HistoryRow(entry: HistoryEntryVm) -> Element {
    rsx! {
        li {
            span { class: "history-title", "{entry.title}" }
            span { class: "history-date", "{entry.completed_on}" }
        }
    }
}
