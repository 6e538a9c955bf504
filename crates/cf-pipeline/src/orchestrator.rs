//! Batch pipeline orchestration.
//!
//! Every entry point funnels into one job runner: sort operations by `order`,
//! validate all of them up front, pick a backend, then either hand the whole
//! list to the remote service or chain local engine runs through scratch
//! files. Scratch files are released on every path, and every outcome is
//! reported as a [`JobResult`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use cf_av::catalog::{self, CompileContext};
use cf_av::{storage, MediaRunner, Workspace};
use cf_core::config::Config;
use cf_core::wire::WireOperation;
use cf_core::{Error, MediaReference, Operation, OperationDescriptor, Result};
use tracing::Instrument;

use crate::artifacts::ArtifactLifecycle;
use crate::job::{JobResult, JobState, ProcessingJob};
use crate::presets;
use crate::remote::RemoteEngineClient;
use crate::selector::{BackendKind, BackendSelector};

/// An error plus the index of the operation that raised it, if any.
#[derive(Debug)]
struct JobFailure {
    error: Error,
    failed_operation: Option<usize>,
}

impl From<Error> for JobFailure {
    fn from(error: Error) -> Self {
        Self {
            error,
            failed_operation: None,
        }
    }
}

fn at(index: usize) -> impl FnOnce(Error) -> JobFailure {
    move |error| JobFailure {
        error,
        failed_operation: Some(index),
    }
}

/// Engine-facing entry point.
pub struct Orchestrator {
    lifecycle: ArtifactLifecycle,
    runner: Option<Arc<dyn MediaRunner>>,
    remote: Option<Arc<RemoteEngineClient>>,
    selector: BackendSelector,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("lifecycle", &self.lifecycle)
            .field("local", &self.runner.as_ref().map(|r| r.describe()))
            .field("remote", &self.remote.as_ref().map(|r| r.base_url().to_string()))
            .finish()
    }
}

impl Orchestrator {
    /// Assemble an orchestrator from its parts. `runner` is the local engine
    /// (absent when none could be resolved); `remote` is the processing
    /// service client (absent when disabled).
    pub fn new(
        lifecycle: ArtifactLifecycle,
        runner: Option<Arc<dyn MediaRunner>>,
        remote: Option<RemoteEngineClient>,
        health_ttl: Duration,
    ) -> Self {
        let remote = remote.map(Arc::new);
        let selector = BackendSelector::new(remote.clone(), runner.is_some(), health_ttl);
        Self {
            lifecycle,
            runner,
            remote,
            selector,
        }
    }

    /// Build from configuration. The remote client is created only when
    /// `remote.enabled` is set.
    pub fn from_config(config: &Config, runner: Option<Arc<dyn MediaRunner>>) -> Result<Self> {
        let workspace = Workspace::new(config.workspace.resolved_scratch_dir())?;
        let storage = storage::from_config(&config.storage)?;
        let lifecycle = ArtifactLifecycle::new(workspace, storage)?;
        let remote = if config.remote.enabled {
            Some(RemoteEngineClient::new(&config.remote)?)
        } else {
            None
        };
        Ok(Self::new(
            lifecycle,
            runner,
            remote,
            Duration::from_millis(config.remote.health_cache_ttl_ms),
        ))
    }

    /// Apply a single operation.
    pub async fn execute_operation(
        &self,
        source: &MediaReference,
        descriptor: OperationDescriptor,
    ) -> JobResult {
        self.run_job(source, vec![descriptor]).await
    }

    /// Apply an ordered batch.
    pub async fn execute_batch(
        &self,
        source: &MediaReference,
        descriptors: Vec<OperationDescriptor>,
    ) -> JobResult {
        self.run_job(source, descriptors).await
    }

    /// Expand a named style and apply it as a batch.
    pub async fn execute_style(&self, source: &MediaReference, style_id: &str) -> JobResult {
        match presets::expand(style_id) {
            Ok(descriptors) => self.run_job(source, descriptors).await,
            Err(e) => self.reject(source, e, None),
        }
    }

    /// Parse wire operations, then apply them as a batch. Parse failures are
    /// reported like any other failure, with the offending index in execution
    /// order.
    pub async fn execute_wire_batch(
        &self,
        source: &MediaReference,
        operations: &[WireOperation],
    ) -> JobResult {
        let mut ordered: Vec<&WireOperation> = operations.iter().collect();
        ordered.sort_by_key(|wire| wire.order);

        let mut descriptors = Vec::with_capacity(ordered.len());
        for (index, wire) in ordered.into_iter().enumerate() {
            match catalog::parse_descriptor(wire) {
                Ok(d) => descriptors.push(d),
                Err(e) => return self.reject(source, e, Some(index)),
            }
        }
        self.run_job(source, descriptors).await
    }

    fn reject(&self, source: &MediaReference, error: Error, index: Option<usize>) -> JobResult {
        let mut job = ProcessingJob::new(source.clone(), Vec::new());
        job.transition(JobState::Failed);
        tracing::warn!(job_id = %job.id, kind = %error.kind(), error = %error, "request rejected");
        JobResult::failure(&job, &error, index, 0)
    }

    async fn run_job(
        &self,
        source: &MediaReference,
        descriptors: Vec<OperationDescriptor>,
    ) -> JobResult {
        let started = Instant::now();
        let mut job = ProcessingJob::new(source.clone(), descriptors);
        let span = tracing::info_span!("job", job_id = %job.id);

        async {
            tracing::info!(source = %job.source.url, operations = job.operations.len(), "job started");
            let outcome = self.drive(&mut job).await;
            self.lifecycle.release(&mut job);
            let duration_ms = started.elapsed().as_millis() as u64;

            match outcome {
                Ok((url, backend)) => {
                    job.transition(JobState::Completed);
                    tracing::info!(backend = %backend, duration_ms, %url, "job completed");
                    JobResult::success(&job, url, duration_ms, backend)
                }
                Err(failure) => {
                    job.transition(JobState::Failed);
                    tracing::error!(
                        kind = %failure.error.kind(),
                        failed_operation = ?failure.failed_operation,
                        duration_ms,
                        error = %failure.error,
                        "job failed"
                    );
                    JobResult::failure(&job, &failure.error, failure.failed_operation, duration_ms)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn drive(
        &self,
        job: &mut ProcessingJob,
    ) -> std::result::Result<(String, BackendKind), JobFailure> {
        if job.operations.is_empty() {
            return Err(Error::validation("at least one operation is required").into());
        }
        // Stable: equal orders keep submission order. Sorting first makes
        // every failure index refer to execution order.
        job.operations.sort_by_key(|d| d.order);
        for (index, d) in job.operations.iter().enumerate() {
            catalog::validate(&d.operation).map_err(at(index))?;
        }

        let backend = self.selector.select().await?;
        job.backend = Some(backend);
        job.transition(JobState::Running);

        let url = match (backend, &self.remote, &self.runner) {
            (BackendKind::Remote, Some(remote), _) => self.run_remote(remote, job).await?,
            (BackendKind::Local, _, Some(runner)) => self.run_local(&**runner, job).await?,
            _ => {
                return Err(Error::BackendUnavailable(format!(
                    "selected {backend} backend is not configured"
                ))
                .into())
            }
        };
        Ok((url, backend))
    }

    async fn run_remote(
        &self,
        remote: &RemoteEngineClient,
        job: &ProcessingJob,
    ) -> std::result::Result<String, JobFailure> {
        let url = match job.operations.as_slice() {
            [single] => remote.process(&job.source.url, &single.operation).await?,
            many => remote.process_batch(&job.source.url, many).await?,
        };
        Ok(url)
    }

    async fn run_local(
        &self,
        runner: &dyn MediaRunner,
        job: &mut ProcessingJob,
    ) -> std::result::Result<String, JobFailure> {
        let input = self.lifecycle.acquire_input(&job.source).await?;
        let mut current = input.path().to_path_buf();
        job.hold(input);

        let total = job.operations.len();
        for index in 0..total {
            let operation = job.operations[index].operation.clone();
            let kind = operation.kind();
            tracing::debug!(step = index + 1, total, operation = %kind, "running operation");

            let ctx = match operation {
                Operation::CropToAspectRatio { .. } => CompileContext {
                    frame: runner.frame_size(&current).await,
                },
                _ => CompileContext::default(),
            };
            let invocation = catalog::compile(&operation, &ctx).map_err(at(index))?;

            let output = self.lifecycle.allocate_output(&job.source);
            let output_path = output.path().to_path_buf();
            job.hold(output);

            runner
                .run(&invocation, &current, &output_path)
                .await
                .map_err(at(index))?;

            // The previous step's file is no longer needed.
            job.retain_only(&output_path);
            current = output_path;
        }

        job.transition(JobState::Publishing);
        let url = self.lifecycle.publish(&current, &job.source).await?;
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cf_av::{CompiledInvocation, LocalDirStorage, RunOutput};
    use cf_core::{ErrorKind, FrameSize, OperationKind};
    use parking_lot::Mutex;
    use std::path::Path;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Copies input to output and records what it was asked to do.
    #[derive(Default)]
    struct RecordingRunner {
        calls: Mutex<Vec<CompiledInvocation>>,
        fail_on: Option<OperationKind>,
    }

    #[async_trait]
    impl MediaRunner for RecordingRunner {
        async fn run(
            &self,
            invocation: &CompiledInvocation,
            input: &Path,
            output: &Path,
        ) -> Result<RunOutput> {
            self.calls.lock().push(invocation.clone());
            if self.fail_on == Some(invocation.kind) {
                return Err(Error::invocation("ffmpeg", "exit status: 1", "boom", ""));
            }
            let mut data = tokio::fs::read(input).await?;
            data.extend_from_slice(invocation.kind.wire_name().as_bytes());
            tokio::fs::write(output, data).await?;
            Ok(RunOutput::default())
        }

        async fn frame_size(&self, _input: &Path) -> Option<FrameSize> {
            Some(FrameSize::new(1920, 1080))
        }

        fn describe(&self) -> String {
            "recording".into()
        }
    }

    async fn source_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/in.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"src:".to_vec()))
            .mount(&server)
            .await;
        server
    }

    fn orchestrator(dir: &Path, runner: Arc<RecordingRunner>) -> Orchestrator {
        let workspace = Workspace::new(dir.join("scratch")).unwrap();
        let storage = Arc::new(LocalDirStorage::new(dir.join("public"), "http://host/public"));
        let lifecycle = ArtifactLifecycle::new(workspace, storage).unwrap();
        let runner: Arc<dyn MediaRunner> = runner;
        Orchestrator::new(lifecycle, Some(runner), None, Duration::ZERO)
    }

    fn scratch_is_empty(dir: &Path) -> bool {
        std::fs::read_dir(dir.join("scratch")).unwrap().count() == 0
    }

    #[tokio::test]
    async fn local_batch_runs_in_order_and_publishes() {
        let server = source_server().await;
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(RecordingRunner::default());
        let orch = orchestrator(dir.path(), runner.clone());

        let source = MediaReference::from_url(format!("{}/in.mp4", server.uri()));
        let result = orch
            .execute_batch(
                &source,
                vec![
                    OperationDescriptor::new(Operation::AdjustSpeed { factor: 2.0 }, 2),
                    OperationDescriptor::new(
                        Operation::Trim {
                            start: 0.0,
                            end: 4.0,
                            reencode: false,
                        },
                        1,
                    ),
                ],
            )
            .await;

        assert!(result.success, "{}", result.message);
        assert_eq!(result.backend, Some(BackendKind::Local));
        assert_eq!(result.operations_applied, 2);

        let kinds: Vec<OperationKind> = runner.calls.lock().iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![OperationKind::Trim, OperationKind::AdjustSpeed]);

        let url = result.result_url.unwrap();
        let storage = LocalDirStorage::new(dir.path().join("public"), "http://host/public");
        let published = cf_av::DurableStorage::read(&storage, &url).await.unwrap();
        assert_eq!(&published[..], b"src:trimVideoadjustSpeed");
        assert!(scratch_is_empty(dir.path()));
    }

    #[tokio::test]
    async fn aspect_crop_uses_probed_frame() {
        let server = source_server().await;
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(RecordingRunner::default());
        let orch = orchestrator(dir.path(), runner.clone());

        let source = MediaReference::from_url(format!("{}/in.mp4", server.uri()));
        let op = Operation::CropToAspectRatio {
            ratio: cf_core::AspectRatio::Portrait9x16,
        };
        let result = orch
            .execute_operation(&source, OperationDescriptor::new(op, 0))
            .await;
        assert!(result.success);
        assert_eq!(
            runner.calls.lock()[0].video_filter.as_deref(),
            Some("crop=606:1080:657:0")
        );
    }

    #[tokio::test]
    async fn failure_reports_index_and_cleans_up() {
        let server = source_server().await;
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(RecordingRunner {
            fail_on: Some(OperationKind::Stabilize),
            ..Default::default()
        });
        let orch = orchestrator(dir.path(), runner.clone());

        let source = MediaReference::from_url(format!("{}/in.mp4", server.uri()));
        let result = orch
            .execute_batch(
                &source,
                vec![
                    OperationDescriptor::new(Operation::NormalizeAudio, 0),
                    OperationDescriptor::new(Operation::Stabilize, 1),
                    OperationDescriptor::new(Operation::AdjustVolume { multiplier: 1.5 }, 2),
                ],
            )
            .await;

        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ErrorKind::InvocationError));
        assert_eq!(result.failed_operation, Some(1));
        assert_eq!(runner.calls.lock().len(), 2);
        assert!(scratch_is_empty(dir.path()));
    }

    #[tokio::test]
    async fn validation_happens_before_any_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(RecordingRunner::default());
        let orch = orchestrator(dir.path(), runner.clone());

        // Unroutable source: a fetch would fail with ResolutionError.
        let source = MediaReference::from_url("http://127.0.0.1:9/in.mp4");
        let result = orch
            .execute_batch(
                &source,
                vec![
                    OperationDescriptor::new(Operation::Stabilize, 0),
                    OperationDescriptor::new(Operation::AdjustSpeed { factor: 9.0 }, 1),
                ],
            )
            .await;
        assert_eq!(result.error_kind, Some(ErrorKind::ValidationError));
        assert_eq!(result.failed_operation, Some(1));
        assert!(runner.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn failure_index_follows_execution_order() {
        let server = source_server().await;
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(RecordingRunner {
            fail_on: Some(OperationKind::Stabilize),
            ..Default::default()
        });
        let orch = orchestrator(dir.path(), runner.clone());
        let source = MediaReference::from_url(format!("{}/in.mp4", server.uri()));

        // Submitted first, but runs second.
        let invalid = orch
            .execute_batch(
                &source,
                vec![
                    OperationDescriptor::new(Operation::AdjustSpeed { factor: 9.0 }, 1),
                    OperationDescriptor::new(Operation::NormalizeAudio, 0),
                ],
            )
            .await;
        assert_eq!(invalid.error_kind, Some(ErrorKind::ValidationError));
        assert_eq!(invalid.failed_operation, Some(1));
        assert!(runner.calls.lock().is_empty());

        let failed = orch
            .execute_batch(
                &source,
                vec![
                    OperationDescriptor::new(Operation::Stabilize, 1),
                    OperationDescriptor::new(Operation::NormalizeAudio, 0),
                ],
            )
            .await;
        assert_eq!(failed.error_kind, Some(ErrorKind::InvocationError));
        assert_eq!(failed.failed_operation, Some(1));
        assert_eq!(runner.calls.lock().len(), 2);
        assert!(scratch_is_empty(dir.path()));
    }

    #[tokio::test]
    async fn wire_parse_failure_index_follows_execution_order() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(dir.path(), Arc::new(RecordingRunner::default()));
        let source = MediaReference::from_url("http://127.0.0.1:9/in.mp4");
        let wire = vec![
            WireOperation {
                op_type: "explodeVideo".into(),
                parameters: Default::default(),
                order: 3,
            },
            WireOperation {
                op_type: "normalizeAudio".into(),
                parameters: Default::default(),
                order: 0,
            },
        ];
        let result = orch.execute_wire_batch(&source, &wire).await;
        assert_eq!(result.error_kind, Some(ErrorKind::UnsupportedOperation));
        assert_eq!(result.failed_operation, Some(1));
    }

    #[tokio::test]
    async fn empty_batch_is_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(dir.path(), Arc::new(RecordingRunner::default()));
        let result = orch
            .execute_batch(&MediaReference::from_url("http://x/in.mp4"), Vec::new())
            .await;
        assert_eq!(result.error_kind, Some(ErrorKind::ValidationError));
    }

    #[tokio::test]
    async fn unknown_style_and_wire_kind_are_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(dir.path(), Arc::new(RecordingRunner::default()));
        let source = MediaReference::from_url("http://x/in.mp4");

        let result = orch.execute_style(&source, "neon").await;
        assert_eq!(result.error_kind, Some(ErrorKind::UnsupportedOperation));

        let wire = vec![WireOperation {
            op_type: "explodeVideo".into(),
            parameters: Default::default(),
            order: 0,
        }];
        let result = orch.execute_wire_batch(&source, &wire).await;
        assert_eq!(result.error_kind, Some(ErrorKind::UnsupportedOperation));
        assert_eq!(result.failed_operation, Some(0));
    }

    #[tokio::test]
    async fn no_backend_is_backend_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = Workspace::new(dir.path().join("scratch")).unwrap();
        let storage = Arc::new(LocalDirStorage::new(
            dir.path().join("public"),
            "http://host/public",
        ));
        let lifecycle = ArtifactLifecycle::new(workspace, storage).unwrap();
        let orch = Orchestrator::new(lifecycle, None, None, Duration::ZERO);

        let result = orch
            .execute_operation(
                &MediaReference::from_url("http://x/in.mp4"),
                OperationDescriptor::new(Operation::Stabilize, 0),
            )
            .await;
        assert_eq!(result.error_kind, Some(ErrorKind::BackendUnavailable));
    }
}
