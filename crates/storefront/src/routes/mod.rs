//! HTTP surface.

pub mod sessions;
pub mod views;

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crate::middleware::create_session_layer;
use crate::state::AppState;

/// Build the application router with its session and trace layers.
#[must_use]
pub fn create_router(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());

    Router::new()
        .merge(views::router())
        .merge(sessions::router())
        .route("/health", get(health))
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
