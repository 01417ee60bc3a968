use dioxus::prelude::*;
use dioxus_router::{Link, Outlet, Routable};

use crate::views::{LearningHistoryView, LessonCompletionView, LessonsView, ProgressDashboard};

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
pub enum Route {
    #[layout(Layout)]
        #[route("/", ProgressDashboard)] Dashboard {},
        #[route("/lessons", LessonsView)] Lessons {},
        #[route("/lessons/:lesson_id/complete", LessonCompletionView)] CompleteLesson { lesson_id: String },
        #[route("/history", LearningHistoryView)] History {},
}

#[component]
fn Layout() -> Element {
    rsx! {
        div { class: "app",
            Sidebar {}
            main { class: "content",
                Outlet::<Route> {}
            }
        }
    }
}

#[component]
fn Sidebar() -> Element {
    rsx! {
        nav { class: "sidebar",
            h1 { "Lessons" }
            ul {
                li { Link { to: Route::Dashboard {}, "Progress" } }
                li { Link { to: Route::Lessons {}, "Lessons" } }
                li { Link { to: Route::History {}, "History" } }
            }
        }
    }
}
