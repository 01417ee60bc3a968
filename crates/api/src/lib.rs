//! REST surface for lesson progress.

#![forbid(unsafe_code)]

mod error;
mod handlers;
mod identity;
mod state;

use axum::Router;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ApiResult};
pub use identity::CurrentUser;
pub use state::ApiState;

/// Build the router with every route nested under `/api`.
pub fn router(state: ApiState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/lessons", get(handlers::list_lessons))
        .route("/progress", get(handlers::all_progress))
        .route("/progress/summary", get(handlers::summary))
        .route("/progress/history", get(handlers::history))
        .route("/progress/complete", post(handlers::complete_lesson))
        .route("/progress/update", post(handlers::update_sections))
        .route("/progress/reconcile", post(handlers::reconcile))
        .route(
            "/progress/:lesson_id",
            get(handlers::lesson_progress).put(handlers::save_lesson_progress),
        )
        .route("/progress/:lesson_id/open", post(handlers::open_lesson))
        .route("/progress/:lesson_id/correct", post(handlers::correct_answer));

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Serve the API on an already bound listener until the future is dropped.
///
/// # Errors
///
/// Returns the I/O error that stopped the server.
pub async fn serve(listener: TcpListener, state: ApiState) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "progress api listening");
    }
    axum::serve(listener, router(state)).await
}
