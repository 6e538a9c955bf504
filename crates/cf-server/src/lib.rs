//! cf-server: the HTTP processing service.
//!
//! Exposes the processing contract (`GET /health`, `POST /process`,
//! `POST /batch`) on top of a local-only [`Orchestrator`], and serves
//! published artifacts under `/public`.

pub mod context;
pub mod error;
pub mod router;
pub mod routes;

use std::sync::Arc;

use cf_av::{EngineLocator, LocalEngine, MediaRunner};
use cf_core::config::Config;
use cf_pipeline::Orchestrator;

use crate::context::AppContext;

/// Start the processing service and run until Ctrl-C.
///
/// The service always executes locally: a processing service that delegated
/// to another remote would only add a hop.
pub async fn start(config: Config) -> cf_core::Result<()> {
    for warning in config.validate() {
        tracing::warn!("Config warning: {warning}");
    }

    let engine = match EngineLocator::new(config.engine.clone()).resolve().await {
        Ok(engine) => Some(Arc::new(engine)),
        Err(e) => {
            tracing::warn!(error = %e, "no local media engine; requests will fail until one is installed");
            None
        }
    };
    let runner = engine
        .clone()
        .map(|engine| Arc::new(LocalEngine::new(engine)) as Arc<dyn MediaRunner>);

    let mut local_only = config.clone();
    local_only.remote.enabled = false;
    let orchestrator = Orchestrator::from_config(&local_only, runner)?;

    let ctx = AppContext::new(orchestrator, engine);
    let app = router::build_router(ctx, config.server.public_dir.clone());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Processing service listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Processing service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
