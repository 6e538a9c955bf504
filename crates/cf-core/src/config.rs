//! Application configuration types.
//!
//! The top-level [`Config`] is deserialized from TOML. Every section defaults
//! sensibly so an empty file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::Error;

/// Locations searched by [`Config::load_or_default`] when no path is given.
const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "./clipforge.toml",
    "~/.config/clipforge/config.toml",
    "/etc/clipforge/config.toml",
];

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub remote: RemoteConfig,
    pub storage: StorageConfig,
    pub workspace: WorkspaceConfig,
    pub server: ServerConfig,
}

impl Config {
    /// Deserialize a `Config` from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Load configuration from a file. Unlike [`Config::load_or_default`] a
    /// missing or malformed file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Load configuration from `path`, or from the first default location that
    /// exists, falling back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }

        for candidate in DEFAULT_CONFIG_PATHS {
            let expanded = shellexpand::tilde(candidate);
            let candidate = Path::new(expanded.as_ref());
            if candidate.exists() {
                tracing::info!("Loading config from {}", candidate.display());
                return Self::load(candidate);
            }
        }

        tracing::debug!("No config file found; using defaults");
        Ok(Self::default())
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.server.port == 0 {
            warnings.push("server.port is 0; a random port will be assigned".into());
        }

        if self.remote.enabled && self.remote.base_url.trim().is_empty() {
            warnings.push("remote is enabled but remote.base_url is empty".into());
        }

        if self.remote.health_cache_ttl_ms > 0 {
            warnings.push(format!(
                "remote.health_cache_ttl_ms = {}: backend choice may be reused across requests",
                self.remote.health_cache_ttl_ms
            ));
        }

        if self.storage.backend == StorageBackend::Http && self.storage.http_endpoint.is_none() {
            warnings.push("storage.backend is 'http' but storage.http_endpoint is not set".into());
        }

        if self.engine.allow_download && self.engine.download_url.trim().is_empty() {
            warnings.push("engine.allow_download is set but engine.download_url is empty".into());
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// How the local media engine binary is located.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Path to a bundled binary, tried first.
    pub bundled_path: Option<PathBuf>,
    /// Base for the relative install locations and dependency directory.
    pub project_root: PathBuf,
    /// Well-known install locations, relative to `project_root`.
    pub install_locations: Vec<PathBuf>,
    /// Directory searched recursively for the engine binary.
    pub dependency_dir: PathBuf,
    /// Platform archive downloaded as a last resort.
    pub download_url: String,
    /// Where downloaded archives are extracted. Defaults to the system temp dir.
    pub download_dir: Option<PathBuf>,
    pub allow_download: bool,
    /// Optional subprocess timeout. `None` lets the engine run to completion.
    pub timeout_secs: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bundled_path: None,
            project_root: PathBuf::from("."),
            install_locations: vec![
                PathBuf::from("bin/ffmpeg"),
                PathBuf::from("vendor/ffmpeg/ffmpeg"),
                PathBuf::from("tools/ffmpeg/bin/ffmpeg"),
            ],
            dependency_dir: PathBuf::from("vendor"),
            download_url:
                "https://www.gyan.dev/ffmpeg/builds/ffmpeg-release-essentials.zip".into(),
            download_dir: None,
            allow_download: true,
            timeout_secs: None,
        }
    }
}

/// Remote processing service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub enabled: bool,
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub health_timeout_secs: u64,
    /// How long a health probe result may be reused. `0` probes on every
    /// top-level request.
    pub health_cache_ttl_ms: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "http://localhost:3001".into(),
            request_timeout_secs: 300,
            health_timeout_secs: 5,
            health_cache_ttl_ms: 0,
        }
    }
}

/// Which durable storage implementation to publish results to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Local,
    Http,
}

/// Durable storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Directory written by the local backend.
    pub local_dir: PathBuf,
    /// URL prefix under which `local_dir` is served.
    pub public_base_url: String,
    /// Object store endpoint for the http backend.
    pub http_endpoint: Option<String>,
    pub http_token: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Local,
            local_dir: PathBuf::from("public/processed"),
            public_base_url: "http://localhost:3001/public/processed".into(),
            http_endpoint: None,
            http_token: None,
        }
    }
}

/// Scratch space for temporary inputs and outputs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    pub scratch_dir: Option<PathBuf>,
}

impl WorkspaceConfig {
    /// Configured scratch directory, or `<system temp>/clipforge`.
    pub fn resolved_scratch_dir(&self) -> PathBuf {
        self.scratch_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("clipforge"))
    }
}

/// HTTP service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory served under `/public`.
    pub public_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3001,
            public_dir: PathBuf::from("public"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = Config::default();
        assert_eq!(cfg.server.port, 3001);
        assert!(!cfg.remote.enabled);
        assert_eq!(cfg.remote.health_cache_ttl_ms, 0);
        assert_eq!(cfg.storage.backend, StorageBackend::Local);
        assert!(cfg.engine.timeout_secs.is_none());
        assert!(cfg.validate().is_empty(), "{:?}", cfg.validate());
    }

    #[test]
    fn parse_empty_toml_uses_defaults() {
        let cfg = Config::from_toml("").unwrap();
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.engine.dependency_dir, PathBuf::from("vendor"));
    }

    #[test]
    fn parse_sections() {
        let toml = r#"
            [remote]
            enabled = true
            base_url = "http://processor:3001"

            [storage]
            backend = "http"
            http_endpoint = "https://blob.example/upload"
        "#;
        let cfg = Config::from_toml(toml).unwrap();
        assert!(cfg.remote.enabled);
        assert_eq!(cfg.remote.base_url, "http://processor:3001");
        assert_eq!(cfg.storage.backend, StorageBackend::Http);
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn malformed_toml_is_validation_error() {
        let err = Config::from_toml("[remote\nenabled = ").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn http_storage_without_endpoint_warns() {
        let mut cfg = Config::default();
        cfg.storage.backend = StorageBackend::Http;
        assert!(cfg.validate().iter().any(|w| w.contains("http_endpoint")));
    }

    #[test]
    fn health_cache_warns() {
        let mut cfg = Config::default();
        cfg.remote.health_cache_ttl_ms = 2_000;
        assert!(cfg.validate().iter().any(|w| w.contains("health_cache_ttl_ms")));
    }

    #[test]
    fn load_missing_file_errors() {
        assert!(Config::load(Path::new("/nonexistent/clipforge.toml")).is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clipforge.toml");
        std::fs::write(&path, "[server]\nport = 9090\n").unwrap();
        let cfg = Config::load_or_default(Some(&path)).unwrap();
        assert_eq!(cfg.server.port, 9090);
    }

    #[test]
    fn scratch_dir_defaults_to_temp() {
        let ws = WorkspaceConfig::default();
        assert!(ws.resolved_scratch_dir().ends_with("clipforge"));
    }
}
