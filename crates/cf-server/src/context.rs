//! Shared state handed to every route handler.

use std::sync::Arc;

use cf_av::ResolvedEngine;
use cf_pipeline::Orchestrator;

/// Axum state: the orchestrator plus the engine it runs on, if any.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub orchestrator: Arc<Orchestrator>,
    pub engine: Option<Arc<ResolvedEngine>>,
}

impl AppContext {
    pub fn new(orchestrator: Orchestrator, engine: Option<Arc<ResolvedEngine>>) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            engine,
        }
    }

    /// Whether the engine still answers `-version`.
    pub async fn engine_available(&self) -> bool {
        let Some(engine) = &self.engine else {
            return false;
        };
        match engine.command().arg("-version").execute().await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(error = %e, "engine health check failed");
                false
            }
        }
    }
}
