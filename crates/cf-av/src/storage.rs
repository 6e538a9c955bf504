//! Durable storage for published results.
//!
//! Results are written once under a unique name and addressed by URL from
//! then on. Two implementations are provided: a local directory served over
//! HTTP, and a generic object store accepting authenticated `PUT`s.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use bytes::Bytes;
use cf_core::config::{StorageBackend, StorageConfig};
use cf_core::Error;
use serde::Deserialize;

/// Write-once blob storage addressed by URL.
#[async_trait]
pub trait DurableStorage: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Store `bytes` under `filename` and return the public URL.
    async fn upload(&self, filename: &str, bytes: Bytes, content_type: &str)
        -> cf_core::Result<String>;

    /// Read back the bytes behind a URL returned by [`upload`](Self::upload).
    async fn read(&self, url: &str) -> cf_core::Result<Bytes>;
}

/// Build the configured storage backend.
pub fn from_config(config: &StorageConfig) -> cf_core::Result<Arc<dyn DurableStorage>> {
    match config.backend {
        StorageBackend::Local => Ok(Arc::new(LocalDirStorage::new(
            config.local_dir.clone(),
            config.public_base_url.clone(),
        ))),
        StorageBackend::Http => {
            let endpoint = config.http_endpoint.clone().ok_or_else(|| {
                Error::Validation("storage.http_endpoint is required for the http backend".into())
            })?;
            Ok(Arc::new(HttpStorage::new(endpoint, config.http_token.clone())))
        }
    }
}

/// `<unix-millis>-<8 hex>-<sanitised name>`.
pub fn unique_name(original: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let random = uuid::Uuid::new_v4().simple().to_string();
    format!("{millis}-{}-{}", &random[..8], sanitize(original))
}

fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches(|c| c == '.' || c == '_');
    if cleaned.is_empty() {
        "output".into()
    } else {
        cleaned.to_string()
    }
}

// ---------------------------------------------------------------------------
// Local directory
// ---------------------------------------------------------------------------

/// Writes into a directory that is served under `public_base_url`.
#[derive(Debug, Clone)]
pub struct LocalDirStorage {
    dir: PathBuf,
    public_base_url: String,
}

impl LocalDirStorage {
    pub fn new(dir: PathBuf, public_base_url: impl Into<String>) -> Self {
        Self {
            dir,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl DurableStorage for LocalDirStorage {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn upload(
        &self,
        filename: &str,
        bytes: Bytes,
        _content_type: &str,
    ) -> cf_core::Result<String> {
        let upload_err = |e: std::io::Error| Error::Upload(format!("{filename}: {e}"));
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(upload_err)?;
        tokio::fs::write(self.dir.join(filename), &bytes)
            .await
            .map_err(upload_err)?;
        Ok(format!("{}/{filename}", self.public_base_url))
    }

    async fn read(&self, url: &str) -> cf_core::Result<Bytes> {
        let filename = url
            .strip_prefix(&self.public_base_url)
            .map(|rest| rest.trim_start_matches('/'))
            .filter(|name| !name.is_empty() && !name.contains('/') && !name.contains(".."))
            .ok_or_else(|| Error::Resolution(format!("{url} is not served by this storage")))?;
        let data = tokio::fs::read(self.dir.join(filename))
            .await
            .map_err(|e| Error::Resolution(format!("{url}: {e}")))?;
        Ok(Bytes::from(data))
    }
}

// ---------------------------------------------------------------------------
// HTTP object store
// ---------------------------------------------------------------------------

/// `PUT <endpoint>/<filename>` with an optional bearer token. The store is
/// expected to answer with `{"url": ...}`; otherwise the `PUT` URL is used.
#[derive(Debug, Clone)]
pub struct HttpStorage {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PutResponse {
    url: Option<String>,
}

impl HttpStorage {
    pub fn new(endpoint: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            token,
        }
    }
}

#[async_trait]
impl DurableStorage for HttpStorage {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn upload(
        &self,
        filename: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> cf_core::Result<String> {
        let target = format!("{}/{filename}", self.endpoint);
        let mut request = self
            .client
            .put(&target)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Upload(format!("{target}: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upload(format!("{target}: HTTP {status}: {body}")));
        }

        let url = response
            .json::<PutResponse>()
            .await
            .ok()
            .and_then(|r| r.url)
            .unwrap_or(target);
        Ok(url)
    }

    async fn read(&self, url: &str) -> cf_core::Result<Bytes> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Resolution(format!("{url}: {e}")))?;
        if !response.status().is_success() {
            return Err(Error::Resolution(format!(
                "{url}: HTTP {}",
                response.status()
            )));
        }
        response
            .bytes()
            .await
            .map_err(|e| Error::Resolution(format!("{url}: {e}")))
    }
}
