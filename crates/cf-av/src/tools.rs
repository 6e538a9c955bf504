//! Media engine discovery.
//!
//! The [`EngineLocator`] walks a fixed resolution chain to find an `ffmpeg`
//! binary, validates it by running `-version`, and produces an immutable
//! [`ResolvedEngine`] that is created once at start-up and shared by
//! reference for the life of the process.

use std::path::{Path, PathBuf};
use std::time::Duration;

use cf_core::config::EngineConfig;
use cf_core::Error;
use serde::Serialize;
use walkdir::WalkDir;

use crate::command::ToolCommand;
use crate::download;

/// Upper bound for the `-version` probe.
const VERSION_TIMEOUT: Duration = Duration::from_secs(15);
/// Depth limit for the dependency-directory search.
const SEARCH_DEPTH: usize = 6;

/// Where a resolved engine binary came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineSource {
    Bundled,
    InstallLocation,
    DependencyDir,
    SystemPath,
    Downloaded,
}

impl EngineSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bundled => "bundled",
            Self::InstallLocation => "install_location",
            Self::DependencyDir => "dependency_dir",
            Self::SystemPath => "system_path",
            Self::Downloaded => "downloaded",
        }
    }
}

/// A validated engine binary plus its optional companion prober.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedEngine {
    pub ffmpeg: PathBuf,
    pub ffprobe: Option<PathBuf>,
    pub source: EngineSource,
    /// First line of `ffmpeg -version`.
    pub version: String,
    /// Timeout applied to every engine invocation, if any.
    #[serde(skip)]
    pub timeout: Option<Duration>,
}

impl ResolvedEngine {
    /// A command for the engine with the configured timeout applied.
    pub fn command(&self) -> ToolCommand {
        let mut cmd = ToolCommand::new(self.ffmpeg.clone());
        cmd.timeout(self.timeout);
        cmd
    }

    /// A command for the prober, if one was found.
    pub fn probe_command(&self) -> Option<ToolCommand> {
        self.ffprobe.as_ref().map(|path| {
            let mut cmd = ToolCommand::new(path.clone());
            cmd.timeout(Some(VERSION_TIMEOUT));
            cmd
        })
    }
}

/// Resolves the engine binary according to [`EngineConfig`].
///
/// Order: bundled path (unless it is an unexpanded placeholder), well-known
/// install locations under the project root, a bounded recursive search of
/// the dependency directory, `PATH`, and finally a platform download.
#[derive(Debug, Clone)]
pub struct EngineLocator {
    config: EngineConfig,
}

impl EngineLocator {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    fn binary_name(tool: &str) -> String {
        format!("{tool}{}", std::env::consts::EXE_SUFFIX)
    }

    /// Resolve and validate the engine.
    ///
    /// If the first candidate fails the `-version` check, the chain is run
    /// once more without it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BackendUnavailable`] when no working binary is found.
    pub async fn resolve(&self) -> cf_core::Result<ResolvedEngine> {
        let (source, path) = self.locate(None).await?;
        match probe_version(&path).await {
            Ok(version) => Ok(self.finish(source, path, version)),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "engine failed version check; re-resolving");
                let (source, retry) = self.locate(Some(&path)).await?;
                let version = probe_version(&retry).await.map_err(|e| {
                    Error::BackendUnavailable(format!(
                        "engine at {} failed version check: {e}",
                        retry.display()
                    ))
                })?;
                Ok(self.finish(source, retry, version))
            }
        }
    }

    fn finish(&self, source: EngineSource, ffmpeg: PathBuf, version: String) -> ResolvedEngine {
        let ffprobe = companion_prober(&ffmpeg);
        tracing::info!(
            ffmpeg = %ffmpeg.display(),
            source = source.as_str(),
            %version,
            has_ffprobe = ffprobe.is_some(),
            "media engine resolved"
        );
        ResolvedEngine {
            ffmpeg,
            ffprobe,
            source,
            version,
            timeout: self.config.timeout_secs.map(Duration::from_secs),
        }
    }

    async fn locate(&self, exclude: Option<&Path>) -> cf_core::Result<(EngineSource, PathBuf)> {
        if let Some(found) = self.locate_local(exclude) {
            return Ok(found);
        }

        if self.config.allow_download && cfg!(windows) {
            let dest = self
                .config
                .download_dir
                .clone()
                .unwrap_or_else(|| std::env::temp_dir().join("clipforge-engine"));
            let path = download::fetch_engine(
                &self.config.download_url,
                &dest,
                &Self::binary_name("ffmpeg"),
            )
            .await?;
            if exclude != Some(path.as_path()) {
                return Ok((EngineSource::Downloaded, path));
            }
        }

        Err(Error::BackendUnavailable(
            "no media engine found (bundled, install locations, dependency dir, PATH)".into(),
        ))
    }

    /// Every non-download stage of the chain, first hit wins.
    pub fn locate_local(&self, exclude: Option<&Path>) -> Option<(EngineSource, PathBuf)> {
        let usable = |p: &Path| p.is_file() && exclude != Some(p);
        let name = Self::binary_name("ffmpeg");

        if let Some(bundled) = &self.config.bundled_path {
            if is_placeholder(bundled) {
                tracing::debug!(path = %bundled.display(), "bundled path is an unexpanded placeholder");
            } else if usable(bundled.as_path()) {
                return Some((EngineSource::Bundled, bundled.clone()));
            }
        }

        for location in &self.config.install_locations {
            let mut candidate = self.config.project_root.join(location);
            if !std::env::consts::EXE_SUFFIX.is_empty() && candidate.extension().is_none() {
                candidate.set_extension(std::env::consts::EXE_EXTENSION);
            }
            if usable(candidate.as_path()) {
                return Some((EngineSource::InstallLocation, candidate));
            }
        }

        let dep_dir = self.config.project_root.join(&self.config.dependency_dir);
        if dep_dir.is_dir() {
            let hit = WalkDir::new(&dep_dir)
                .max_depth(SEARCH_DEPTH)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .find(|entry| entry.file_name().to_string_lossy() == name && usable(entry.path()));
            if let Some(entry) = hit {
                return Some((EngineSource::DependencyDir, entry.into_path()));
            }
        }

        which::which("ffmpeg")
            .ok()
            .filter(|p| exclude != Some(p.as_path()))
            .map(|p| (EngineSource::SystemPath, p))
    }
}

/// Whether a configured path still contains an unexpanded build-time
/// placeholder (`${..}`, `{{..}}`, `%VAR%`, or a `/ROOT` prefix).
pub fn is_placeholder(path: &Path) -> bool {
    let s = path.to_string_lossy();
    s.contains("${") || s.contains("{{") || s.starts_with("/ROOT") || has_percent_token(&s)
}

fn has_percent_token(s: &str) -> bool {
    let segments: Vec<&str> = s.split('%').skip(1).collect();
    // Only segments closed by a following '%' are tokens.
    segments.len() >= 2
        && segments[..segments.len() - 1].iter().any(|seg| {
            !seg.is_empty() && seg.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

/// `ffprobe` next to the engine, else on `PATH`.
fn companion_prober(ffmpeg: &Path) -> Option<PathBuf> {
    let sibling = ffmpeg.with_file_name(EngineLocator::binary_name("ffprobe"));
    if sibling.is_file() {
        return Some(sibling);
    }
    which::which("ffprobe").ok()
}

async fn probe_version(path: &Path) -> cf_core::Result<String> {
    let output = ToolCommand::new(path.to_path_buf())
        .arg("-version")
        .timeout(Some(VERSION_TIMEOUT))
        .execute()
        .await?;
    Ok(output
        .stdout
        .lines()
        .next()
        .unwrap_or_default()
        .trim()
        .to_string())
}
