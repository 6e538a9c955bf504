use axum::extract::State;
use axum::Json;
use cf_core::wire::HealthResponse;

use crate::context::AppContext;

/// `GET /health`
pub async fn health(State(ctx): State<AppContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".into(),
        engine_available: ctx.engine_available().await,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
