//! Request/response bodies of the processing service HTTP contract.
//!
//! Shared by the remote client in `cf-pipeline` and the service in
//! `cf-server` so both sides agree on field names.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Parameter bag as it travels over the wire.
pub type WireParameters = Map<String, Value>;

/// `GET /health` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(alias = "ffmpeg_available")]
    pub engine_available: bool,
    #[serde(default)]
    pub version: String,
}

impl HealthResponse {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// One entry of a `POST /batch` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireOperation {
    #[serde(rename = "type")]
    pub op_type: String,
    #[serde(default)]
    pub parameters: WireParameters,
    #[serde(default)]
    pub order: u32,
}

/// `POST /process` request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessRequest {
    pub video_url: String,
    pub operation: String,
    #[serde(default)]
    pub parameters: WireParameters,
}

/// `POST /batch` request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRequest {
    pub video_url: String,
    pub operations: Vec<WireOperation>,
}

/// Response shape shared by `/process` and `/batch`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessResponse {
    pub success: bool,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub processing_time_ms: u64,
    #[serde(default)]
    pub operation: String,
}
