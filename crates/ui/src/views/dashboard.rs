use dioxus::prelude::*;

use crate::context::AppContext;
use crate::views::{ViewError, ViewState, view_state_from_resource};
use crate::vm::SummaryVm;

/// Textual progress overview; renders no chart.
#[component]
pub fn ProgressDashboard() -> Element {
    let ctx = use_context::<AppContext>();
    let progress = ctx.progress();
    let user = ctx.user();

    let resource = use_resource(move || {
        let progress = progress.clone();
        let user = user.clone();
        async move {
            let summary = progress
                .get_progress_summary(&user)
                .await
                .map_err(ViewError::from)?;
            Ok::<_, ViewError>(SummaryVm::from(summary))
        }
    });

    let state = view_state_from_resource(&resource);

    rsx! {
        div { class: "page",
            h2 { "Progress Summary" }

            match state {
                ViewState::Idle => rsx! {
                    p { "Idle" }
                },
                ViewState::Loading => rsx! {
                    p { "Loading..." }
                },
                ViewState::Ready(vm) => rsx! {
                    p { class: "summary-line", "{vm.completed_line}" }
                    p { class: "summary-line", "{vm.remaining_line}" }
                    p { class: "summary-line", "{vm.percentage_line}" }
                },
                ViewState::Error(_) => rsx! {
                    p { class: "error", "Unable to load progress summary." }
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
