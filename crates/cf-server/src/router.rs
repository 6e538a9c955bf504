//! Axum router construction.

use std::path::PathBuf;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::context::AppContext;
use crate::routes;

/// Build the service router. `public_dir` is served under `/public`.
pub fn build_router(ctx: AppContext, public_dir: PathBuf) -> Router {
    Router::new()
        .route("/health", get(routes::health::health))
        .route("/process", post(routes::process::process))
        .route("/batch", post(routes::process::batch))
        .nest_service("/public", ServeDir::new(public_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
