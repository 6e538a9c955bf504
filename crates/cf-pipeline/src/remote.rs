//! HTTP client for the remote processing service.
//!
//! The service speaks the same operation vocabulary as the local catalog:
//! operations are encoded with [`cf_av::catalog::encode_operation`] so both
//! backends always agree on names and parameters.

use std::time::Duration;

use cf_av::catalog;
use cf_core::config::RemoteConfig;
use cf_core::wire::{BatchRequest, HealthResponse, ProcessRequest, ProcessResponse};
use cf_core::{Error, Operation, OperationDescriptor, Result};
use serde::Serialize;

/// Result of a health probe. Probing never fails; an unreachable service is
/// simply neither available nor capable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EngineHealth {
    /// The service answered and reported itself healthy.
    pub available: bool,
    /// The service has a working media engine.
    pub capable: bool,
    pub version: Option<String>,
}

impl EngineHealth {
    pub fn usable(&self) -> bool {
        self.available && self.capable
    }
}

/// Client for `GET /health`, `POST /process`, and `POST /batch`.
#[derive(Debug, Clone)]
pub struct RemoteEngineClient {
    client: reqwest::Client,
    base_url: String,
    health_timeout: Duration,
}

impl RemoteEngineClient {
    /// Build a client from configuration.
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| Error::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            health_timeout: Duration::from_secs(config.health_timeout_secs),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Probe the service. Any transport error, non-2xx status, or malformed
    /// body yields an unusable [`EngineHealth`].
    pub async fn health_check(&self) -> EngineHealth {
        let response = self
            .client
            .get(self.url("/health"))
            .timeout(self.health_timeout)
            .send()
            .await;

        let response = match response {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                tracing::debug!(status = %r.status(), "remote health probe rejected");
                return EngineHealth::default();
            }
            Err(e) => {
                tracing::debug!(error = %e, "remote health probe failed");
                return EngineHealth::default();
            }
        };

        match response.json::<HealthResponse>().await {
            Ok(health) => EngineHealth {
                available: health.is_healthy(),
                capable: health.engine_available,
                version: Some(health.version).filter(|v| !v.is_empty()),
            },
            Err(e) => {
                tracing::debug!(error = %e, "remote health body malformed");
                EngineHealth::default()
            }
        }
    }

    /// Apply one operation remotely. Returns the result URL.
    pub async fn process(&self, source_url: &str, operation: &Operation) -> Result<String> {
        let request = ProcessRequest {
            video_url: source_url.to_string(),
            operation: operation.kind().wire_name().to_string(),
            parameters: catalog::encode_operation(operation),
        };
        self.post("/process", &request).await
    }

    /// Apply an ordered batch remotely. Returns the result URL.
    pub async fn process_batch(
        &self,
        source_url: &str,
        operations: &[OperationDescriptor],
    ) -> Result<String> {
        let request = BatchRequest {
            video_url: source_url.to_string(),
            operations: operations.iter().map(catalog::encode_descriptor).collect(),
        };
        self.post("/batch", &request).await
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<String> {
        let url = self.url(path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Network(format!("{url}: HTTP {status}: {text}")));
        }

        let body: ProcessResponse = response
            .json()
            .await
            .map_err(|e| Error::Network(format!("{url}: malformed response: {e}")))?;

        tracing::debug!(
            operation = %body.operation,
            processing_time_ms = body.processing_time_ms,
            success = body.success,
            "remote response"
        );

        match (body.success, body.video_url) {
            (true, Some(result)) => Ok(result),
            (true, None) => Err(Error::Network(format!(
                "{url}: success reported without a result URL"
            ))),
            (false, _) => Err(Error::Network(format!(
                "{url}: remote processing failed: {}",
                body.error.unwrap_or_else(|| "unknown error".into())
            ))),
        }
    }
}
