//! Local execution of compiled invocations.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use cf_core::FrameSize;

use crate::catalog::CompiledInvocation;
use crate::tools::ResolvedEngine;

/// Captured result of one successful engine run.
#[derive(Debug, Clone, Default)]
pub struct RunOutput {
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

/// Something that can execute a compiled invocation against local files.
///
/// Implemented by [`LocalEngine`]; tests substitute their own runner.
#[async_trait]
pub trait MediaRunner: Send + Sync {
    /// Run one invocation from `input` to `output`.
    ///
    /// Fails with `InvocationError` when the engine cannot be started or
    /// exits unsuccessfully.
    async fn run(
        &self,
        invocation: &CompiledInvocation,
        input: &Path,
        output: &Path,
    ) -> cf_core::Result<RunOutput>;

    /// Frame size of the first video stream, if it can be determined.
    async fn frame_size(&self, input: &Path) -> Option<FrameSize>;

    /// Human-readable engine description.
    fn describe(&self) -> String;
}

/// Runs invocations through the resolved local engine binary.
#[derive(Debug, Clone)]
pub struct LocalEngine {
    engine: Arc<ResolvedEngine>,
}

impl LocalEngine {
    pub fn new(engine: Arc<ResolvedEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &ResolvedEngine {
        &self.engine
    }
}

#[async_trait]
impl MediaRunner for LocalEngine {
    async fn run(
        &self,
        invocation: &CompiledInvocation,
        input: &Path,
        output: &Path,
    ) -> cf_core::Result<RunOutput> {
        let started = Instant::now();
        let out = self
            .engine
            .command()
            .args(invocation.to_args(input, output))
            .execute()
            .await?;
        let elapsed = started.elapsed();

        tracing::info!(
            operation = %invocation.kind,
            duration_ms = elapsed.as_millis() as u64,
            "engine invocation complete"
        );

        Ok(RunOutput {
            stdout: out.stdout,
            stderr: out.stderr,
            elapsed,
        })
    }

    async fn frame_size(&self, input: &Path) -> Option<FrameSize> {
        let mut cmd = self.engine.probe_command()?;
        cmd.args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height",
            "-of",
            "csv=s=x:p=0",
        ]);
        cmd.arg(input.to_string_lossy().as_ref());

        match cmd.execute().await {
            Ok(out) => parse_frame_size(&out.stdout),
            Err(e) => {
                tracing::debug!(input = %input.display(), error = %e, "frame size probe failed");
                None
            }
        }
    }

    fn describe(&self) -> String {
        format!(
            "{} ({}, {})",
            self.engine.ffmpeg.display(),
            self.engine.source.as_str(),
            self.engine.version
        )
    }
}

/// Parse `WIDTHxHEIGHT` as printed by the csv probe.
fn parse_frame_size(stdout: &str) -> Option<FrameSize> {
    let line = stdout.lines().map(str::trim).find(|l| !l.is_empty())?;
    let (w, h) = line.split_once('x')?;
    let width = w.trim().parse().ok()?;
    let height = h.trim().trim_end_matches('x').parse().ok()?;
    if width == 0 || height == 0 {
        return None;
    }
    Some(FrameSize::new(width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{compile, CompileContext};
    use crate::tools::EngineSource;
    use cf_core::{ErrorKind, Operation};
    use std::path::PathBuf;

    fn engine(ffmpeg: &str) -> LocalEngine {
        LocalEngine::new(Arc::new(ResolvedEngine {
            ffmpeg: PathBuf::from(ffmpeg),
            ffprobe: None,
            source: EngineSource::SystemPath,
            version: "test".into(),
            timeout: None,
        }))
    }

    #[test]
    fn parses_probe_output() {
        assert_eq!(parse_frame_size("1920x1080\n"), Some(FrameSize::new(1920, 1080)));
        // Some builds print a trailing separator.
        assert_eq!(parse_frame_size("\n640x360x\n"), Some(FrameSize::new(640, 360)));
        assert_eq!(parse_frame_size(""), None);
        assert_eq!(parse_frame_size("N/A"), None);
        assert_eq!(parse_frame_size("0x0"), None);
    }

    #[tokio::test]
    async fn missing_binary_is_invocation_error() {
        let inv = compile(&Operation::Stabilize, &CompileContext::default()).unwrap();
        let err = engine("/nonexistent/ffmpeg-xyz")
            .run(&inv, Path::new("in.mp4"), Path::new("out.mp4"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvocationError);
    }

    #[tokio::test]
    async fn frame_size_without_prober_is_none() {
        assert_eq!(engine("ffmpeg").frame_size(Path::new("in.mp4")).await, None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn runs_compiled_arguments() {
        // `echo` stands in for the engine: it prints the argument vector.
        let inv = compile(&Operation::NormalizeAudio, &CompileContext::default()).unwrap();
        let out = engine("echo")
            .run(&inv, Path::new("in.mp4"), Path::new("out.mp4"))
            .await
            .unwrap();
        assert_eq!(
            out.stdout.trim(),
            "-y -i in.mp4 -af loudnorm=I=-16:TP=-1.5:LRA=11 -c:v copy out.mp4"
        );
    }
}
