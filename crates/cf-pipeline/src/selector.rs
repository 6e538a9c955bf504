//! Per-request choice between the remote service and the local engine.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use cf_core::{Error, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::remote::{EngineHealth, RemoteEngineClient};

/// The backend that executed (or will execute) a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Local,
    Remote,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BackendKind::Local => "local",
            BackendKind::Remote => "remote",
        })
    }
}

/// Chooses a backend at the start of every top-level request.
///
/// Remote wins only when its health probe reports both a healthy status and
/// an available engine. Any other outcome falls back to local silently. With
/// a zero TTL (the default) every call probes afresh.
#[derive(Debug)]
pub struct BackendSelector {
    remote: Option<Arc<RemoteEngineClient>>,
    local_available: bool,
    ttl: Duration,
    cached: Mutex<Option<(Instant, EngineHealth)>>,
}

impl BackendSelector {
    pub fn new(
        remote: Option<Arc<RemoteEngineClient>>,
        local_available: bool,
        ttl: Duration,
    ) -> Self {
        Self {
            remote,
            local_available,
            ttl,
            cached: Mutex::new(None),
        }
    }

    /// Pick a backend.
    ///
    /// # Errors
    ///
    /// [`Error::BackendUnavailable`] when the remote is unusable and no local
    /// engine was resolved.
    pub async fn select(&self) -> Result<BackendKind> {
        if let Some(remote) = &self.remote {
            let health = self.health(remote).await;
            if health.usable() {
                tracing::debug!(backend = "remote", version = ?health.version, "backend selected");
                return Ok(BackendKind::Remote);
            }
            tracing::debug!(?health, "remote unusable; falling back to local");
        }

        if self.local_available {
            tracing::debug!(backend = "local", "backend selected");
            Ok(BackendKind::Local)
        } else {
            Err(Error::BackendUnavailable(
                "remote service unusable and no local media engine resolved".into(),
            ))
        }
    }

    async fn health(&self, remote: &RemoteEngineClient) -> EngineHealth {
        if !self.ttl.is_zero() {
            let cached = self.cached.lock().clone();
            if let Some((at, health)) = cached {
                if at.elapsed() < self.ttl {
                    return health;
                }
            }
        }

        let health = remote.health_check().await;
        if !self.ttl.is_zero() {
            *self.cached.lock() = Some((Instant::now(), health.clone()));
        }
        health
    }
}
