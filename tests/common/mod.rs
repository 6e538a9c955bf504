//! Shared test harness for integration tests.
//!
//! Provides [`FakeRunner`], a [`MediaRunner`] that records every invocation
//! and writes a marker instead of transcoding, and [`TestHarness`], which
//! wires it into an [`Orchestrator`] over a temporary scratch directory and
//! local storage. Source media is served by a `wiremock` server.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cf_av::{
    CompiledInvocation, DurableStorage, LocalDirStorage, MediaRunner, RunOutput, Workspace,
};
use cf_core::config::RemoteConfig;
use cf_core::{FrameSize, MediaReference, OperationKind};
use cf_pipeline::{ArtifactLifecycle, Orchestrator, RemoteEngineClient};
use parking_lot::Mutex;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const PUBLIC_BASE: &str = "http://localhost:3001/public/processed";
pub const SOURCE_BYTES: &[u8] = b"30s-source";

/// Records invocations; each run appends the operation's wire name to the
/// input bytes so the published output shows the order things ran in.
#[derive(Default)]
pub struct FakeRunner {
    pub calls: Mutex<Vec<CompiledInvocation>>,
}

impl FakeRunner {
    pub fn kinds(&self) -> Vec<OperationKind> {
        self.calls.lock().iter().map(|c| c.kind).collect()
    }

    pub fn args(&self, index: usize) -> Vec<String> {
        self.calls.lock()[index].to_args(Path::new("in"), Path::new("out"))
    }
}

#[async_trait]
impl MediaRunner for FakeRunner {
    async fn run(
        &self,
        invocation: &CompiledInvocation,
        input: &Path,
        output: &Path,
    ) -> cf_core::Result<RunOutput> {
        self.calls.lock().push(invocation.clone());
        let mut data = tokio::fs::read(input).await?;
        data.push(b'|');
        data.extend_from_slice(invocation.kind.wire_name().as_bytes());
        tokio::fs::write(output, data).await?;
        Ok(RunOutput::default())
    }

    async fn frame_size(&self, _input: &Path) -> Option<FrameSize> {
        Some(FrameSize::new(1920, 1080))
    }

    fn describe(&self) -> String {
        "fake".into()
    }
}

/// An orchestrator over a temp directory, a [`FakeRunner`], and an optional
/// remote service.
pub struct TestHarness {
    pub dir: TempDir,
    pub runner: Arc<FakeRunner>,
    pub orchestrator: Orchestrator,
}

impl TestHarness {
    /// Local engine only.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Local engine plus a remote service at `base_url`.
    pub fn with_remote(base_url: &str) -> Self {
        let remote = RemoteEngineClient::new(&RemoteConfig {
            enabled: true,
            base_url: base_url.to_string(),
            request_timeout_secs: 5,
            health_timeout_secs: 1,
            health_cache_ttl_ms: 0,
        })
        .expect("remote client");
        Self::build(Some(remote))
    }

    fn build(remote: Option<RemoteEngineClient>) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let workspace = Workspace::new(dir.path().join("scratch")).expect("workspace");
        let lifecycle = ArtifactLifecycle::new(workspace, Arc::new(Self::storage_in(dir.path())))
            .expect("lifecycle");
        let runner = Arc::new(FakeRunner::default());
        let as_runner: Arc<dyn MediaRunner> = runner.clone();
        let orchestrator = Orchestrator::new(lifecycle, Some(as_runner), remote, Duration::ZERO);
        Self {
            dir,
            runner,
            orchestrator,
        }
    }

    fn storage_in(dir: &Path) -> LocalDirStorage {
        LocalDirStorage::new(dir.join("public/processed"), PUBLIC_BASE)
    }

    /// Read back a published result.
    pub async fn published(&self, url: &str) -> Vec<u8> {
        Self::storage_in(self.dir.path())
            .read(url)
            .await
            .expect("published result")
            .to_vec()
    }

    /// Number of files left in scratch.
    pub fn scratch_files(&self) -> usize {
        std::fs::read_dir(self.dir.path().join("scratch"))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

/// A mock server that serves [`SOURCE_BYTES`] at `/source.mp4`, expecting
/// exactly `fetches` downloads.
pub async fn source_server(fetches: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/source.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(SOURCE_BYTES.to_vec()))
        .expect(fetches)
        .mount(&server)
        .await;
    server
}

pub fn source_ref(server: &MockServer) -> MediaReference {
    MediaReference {
        url: format!("{}/source.mp4", server.uri()),
        content_type: Some("video/mp4".into()),
        original_name: Some("source.mp4".into()),
    }
}
