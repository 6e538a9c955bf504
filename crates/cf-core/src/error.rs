//! Unified error type for the clipforge engine.
//!
//! Every failure raised while compiling, executing, or publishing an operation
//! funnels into [`Error`]. The orchestrator boundary classifies errors with
//! [`Error::kind`] so callers only ever see an [`ErrorKind`] plus a message.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error type covering all failure modes in clipforge.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The source media could not be fetched.
    #[error("Resolution error: {0}")]
    Resolution(String),

    /// An operation descriptor or one of its parameters is out of schema.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Neither processing backend can be used.
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The media engine could not be started at all.
    #[error("Failed to spawn {tool}: {message}")]
    Spawn {
        /// Name of the executable.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// The media engine ran but exited unsuccessfully.
    #[error("Invocation error [{tool}]: {message}")]
    Invocation {
        /// Name of the executable.
        tool: String,
        /// Human-readable error description (includes the exit status).
        message: String,
        /// Captured standard error.
        stderr: String,
        /// Captured standard output.
        stdout: String,
    },

    /// A call to the remote processing service failed.
    #[error("Network error: {0}")]
    Network(String),

    /// Unknown operation kind, filter name, or style id.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Writing the result to durable storage failed.
    #[error("Upload error: {0}")]
    Upload(String),

    /// Removing a temporary artifact failed. Never fatal.
    #[error("Cleanup error: {0}")]
    Cleanup(String),

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error classification reported to callers of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    ResolutionError,
    ValidationError,
    BackendUnavailable,
    InvocationError,
    NetworkError,
    UnsupportedOperation,
    UploadError,
    CleanupError,
    InternalError,
}

impl ErrorKind {
    /// The taxonomy name, identical to the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ResolutionError => "ResolutionError",
            ErrorKind::ValidationError => "ValidationError",
            ErrorKind::BackendUnavailable => "BackendUnavailable",
            ErrorKind::InvocationError => "InvocationError",
            ErrorKind::NetworkError => "NetworkError",
            ErrorKind::UnsupportedOperation => "UnsupportedOperation",
            ErrorKind::UploadError => "UploadError",
            ErrorKind::CleanupError => "CleanupError",
            ErrorKind::InternalError => "InternalError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    /// Classify this error into the caller-facing taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Resolution(_) => ErrorKind::ResolutionError,
            Error::Validation(_) => ErrorKind::ValidationError,
            Error::BackendUnavailable(_) => ErrorKind::BackendUnavailable,
            Error::Spawn { .. } | Error::Invocation { .. } => ErrorKind::InvocationError,
            Error::Network(_) => ErrorKind::NetworkError,
            Error::UnsupportedOperation(_) => ErrorKind::UnsupportedOperation,
            Error::Upload(_) => ErrorKind::UploadError,
            Error::Cleanup(_) => ErrorKind::CleanupError,
            Error::Io { .. } | Error::Internal(_) => ErrorKind::InternalError,
        }
    }

    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self.kind() {
            ErrorKind::ValidationError => 400,
            ErrorKind::UnsupportedOperation => 422,
            ErrorKind::ResolutionError => 424,
            ErrorKind::InvocationError | ErrorKind::NetworkError => 502,
            ErrorKind::BackendUnavailable => 503,
            ErrorKind::UploadError | ErrorKind::CleanupError | ErrorKind::InternalError => 500,
        }
    }

    /// Convenience constructor for [`Error::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// Convenience constructor for [`Error::UnsupportedOperation`].
    pub fn unsupported(what: impl fmt::Display) -> Self {
        Error::UnsupportedOperation(what.to_string())
    }

    /// Convenience constructor for [`Error::Spawn`].
    pub fn spawn(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Spawn {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Invocation`].
    pub fn invocation(
        tool: impl Into<String>,
        message: impl Into<String>,
        stderr: impl Into<String>,
        stdout: impl Into<String>,
    ) -> Self {
        Error::Invocation {
            tool: tool.into(),
            message: message.into(),
            stderr: stderr.into(),
            stdout: stdout.into(),
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_display_and_kind() {
        let err = Error::validation("factor out of range");
        assert_eq!(err.to_string(), "Validation error: factor out of range");
        assert_eq!(err.kind(), ErrorKind::ValidationError);
        assert_eq!(err.http_status(), 400);
    }

    #[test]
    fn spawn_and_invocation_share_kind() {
        let spawn = Error::spawn("ffmpeg", "No such file or directory");
        let invocation = Error::invocation("ffmpeg", "exit status: 1", "boom", "");
        assert_eq!(spawn.kind(), ErrorKind::InvocationError);
        assert_eq!(invocation.kind(), ErrorKind::InvocationError);
        assert!(matches!(spawn, Error::Spawn { .. }));
        assert_eq!(invocation.http_status(), 502);
    }

    #[test]
    fn unsupported_display() {
        let err = Error::unsupported("style 'neon'");
        assert_eq!(err.to_string(), "Unsupported operation: style 'neon'");
        assert_eq!(err.http_status(), 422);
    }

    #[test]
    fn io_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io { .. }));
        assert_eq!(err.kind(), ErrorKind::InternalError);
    }

    #[test]
    fn kind_serializes_as_taxonomy_name() {
        let json = serde_json::to_string(&ErrorKind::BackendUnavailable).unwrap();
        assert_eq!(json, "\"BackendUnavailable\"");
        assert_eq!(ErrorKind::UploadError.to_string(), "UploadError");
    }

    #[test]
    fn backend_unavailable_is_503() {
        let err = Error::BackendUnavailable("no engine".into());
        assert_eq!(err.http_status(), 503);
    }
}
