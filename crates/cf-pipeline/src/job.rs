//! Per-request job state and the uniform result returned to callers.

use std::path::Path;

use cf_av::TempArtifact;
use cf_core::{Error, ErrorKind, JobId, MediaReference, OperationDescriptor};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::selector::BackendKind;

/// Lifecycle of a [`ProcessingJob`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Running,
    Publishing,
    Completed,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

/// One top-level request: a source, its ordered operations, and the scratch
/// files it currently owns.
#[derive(Debug)]
pub struct ProcessingJob {
    pub id: JobId,
    pub source: MediaReference,
    pub operations: Vec<OperationDescriptor>,
    pub state: JobState,
    pub backend: Option<BackendKind>,
    pub created_at: DateTime<Utc>,
    artifacts: Vec<TempArtifact>,
}

impl ProcessingJob {
    pub fn new(source: MediaReference, operations: Vec<OperationDescriptor>) -> Self {
        Self {
            id: JobId::new(),
            source,
            operations,
            state: JobState::Pending,
            backend: None,
            created_at: Utc::now(),
            artifacts: Vec::new(),
        }
    }

    /// Move to `next`. Terminal states are final.
    pub fn transition(&mut self, next: JobState) {
        if self.state.is_terminal() {
            tracing::warn!(job_id = %self.id, from = ?self.state, to = ?next, "ignoring transition out of terminal state");
            return;
        }
        tracing::debug!(job_id = %self.id, from = ?self.state, to = ?next, "job state");
        self.state = next;
    }

    /// Take ownership of a scratch file until release.
    pub fn hold(&mut self, artifact: TempArtifact) {
        self.artifacts.push(artifact);
    }

    /// Drop every held artifact except the one at `keep`.
    pub fn retain_only(&mut self, keep: &Path) {
        self.artifacts.retain(|a| a.path() == keep);
    }

    pub fn held(&self) -> usize {
        self.artifacts.len()
    }

    /// Drop all held artifacts, removing their files.
    pub(crate) fn release_artifacts(&mut self) {
        self.artifacts.clear();
    }
}

/// The single result shape returned by every engine entry point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    pub job_id: JobId,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_url: Option<String>,
    pub duration_ms: u64,
    pub message: String,
    pub operations_applied: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<BackendKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    /// Index (in execution order) of the operation that failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_operation: Option<usize>,
}

impl JobResult {
    pub fn success(
        job: &ProcessingJob,
        result_url: String,
        duration_ms: u64,
        backend: BackendKind,
    ) -> Self {
        let applied = job.operations.len();
        Self {
            job_id: job.id,
            success: true,
            result_url: Some(result_url),
            duration_ms,
            message: format!(
                "Applied {applied} operation{} via {backend} backend",
                if applied == 1 { "" } else { "s" }
            ),
            operations_applied: applied,
            backend: Some(backend),
            error_kind: None,
            failed_operation: None,
        }
    }

    pub fn failure(
        job: &ProcessingJob,
        error: &Error,
        failed_operation: Option<usize>,
        duration_ms: u64,
    ) -> Self {
        Self {
            job_id: job.id,
            success: false,
            result_url: None,
            duration_ms,
            message: error.to_string(),
            operations_applied: 0,
            backend: job.backend,
            error_kind: Some(error.kind()),
            failed_operation,
        }
    }
}
