//! Artifact lifecycle: fetch the source, allocate outputs, publish the
//! result, release everything.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use cf_av::storage::{unique_name, DurableStorage};
use cf_av::{TempArtifact, Workspace};
use cf_core::{Error, MediaReference, Result};

use crate::job::ProcessingJob;

/// Timeout for fetching source media.
const FETCH_TIMEOUT: Duration = Duration::from_secs(600);

/// Owns the scratch workspace and the durable storage a job publishes to.
#[derive(Clone)]
pub struct ArtifactLifecycle {
    client: reqwest::Client,
    workspace: Workspace,
    storage: Arc<dyn DurableStorage>,
}

impl std::fmt::Debug for ArtifactLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactLifecycle")
            .field("workspace", &self.workspace)
            .field("storage", &self.storage.name())
            .finish_non_exhaustive()
    }
}

impl ArtifactLifecycle {
    pub fn new(workspace: Workspace, storage: Arc<dyn DurableStorage>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| Error::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            workspace,
            storage,
        })
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn storage(&self) -> &Arc<dyn DurableStorage> {
        &self.storage
    }

    /// Download the source into a fresh scratch file.
    ///
    /// # Errors
    ///
    /// [`Error::Resolution`] if the fetch fails or returns a non-2xx status,
    /// or the bytes cannot be written.
    pub async fn acquire_input(&self, source: &MediaReference) -> Result<TempArtifact> {
        let artifact = self.workspace.input(&source.extension());
        let url = &source.url;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Resolution(format!("{url}: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Resolution(format!("{url}: HTTP {status}")));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Resolution(format!("{url}: {e}")))?;

        tokio::fs::write(artifact.path(), &bytes)
            .await
            .map_err(|e| Error::Resolution(format!("{url}: failed to store input: {e}")))?;

        tracing::debug!(%url, bytes = bytes.len(), path = %artifact.path().display(), "input acquired");
        Ok(artifact)
    }

    /// A fresh scratch path for an engine output with the source's extension.
    pub fn allocate_output(&self, source: &MediaReference) -> TempArtifact {
        self.workspace.output(&source.extension())
    }

    /// Copy a finished output to durable storage under a unique name.
    ///
    /// # Errors
    ///
    /// [`Error::Upload`] if the output cannot be read or stored.
    pub async fn publish(&self, output: &Path, source: &MediaReference) -> Result<String> {
        let data = tokio::fs::read(output)
            .await
            .map_err(|e| Error::Upload(format!("failed to read {}: {e}", output.display())))?;

        let stem = source
            .original_name
            .as_deref()
            .and_then(|n| Path::new(n).file_stem())
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "processed".into());
        let filename = unique_name(&format!("{stem}.{}", source.extension()));

        let url = self
            .storage
            .upload(&filename, Bytes::from(data), source.content_type_or_default())
            .await
            .map_err(|e| match e {
                Error::Upload(_) => e,
                other => Error::Upload(other.to_string()),
            })?;

        tracing::info!(storage = self.storage.name(), %url, "result published");
        Ok(url)
    }

    /// Remove every scratch file the job still holds.
    pub fn release(&self, job: &mut ProcessingJob) {
        let held = job.held();
        job.release_artifacts();
        if held > 0 {
            tracing::debug!(job_id = %job.id, released = held, "artifacts released");
        }
    }
}
