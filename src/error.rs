//! Error types for the catalog and its persistence layer.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the persisted annotation and cache store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage backend error: {0}")]
    Sled(#[from] sled::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt record {namespace}/{key}")]
    Corrupt { namespace: String, key: String },
}

/// Errors surfaced to catalog callers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The path is outside every configured root. Never retried or downgraded.
    #[error("Path {} is not in the config", .0.display())]
    PathNotAllowed(PathBuf),

    #[error("Path {} does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("Path {} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("Path {} is neither a file nor a directory", .0.display())]
    UnsupportedKind(PathBuf),

    #[error("Error executing {tool} (status {status}): {stderr}")]
    ExternalToolFailure {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    StorageError(#[from] StorageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// True for authorization failures, which must always reach the caller.
    pub fn is_security_violation(&self) -> bool {
        matches!(self, ApiError::PathNotAllowed(_))
    }

    /// Map an I/O error on `path` to the catalog taxonomy.
    pub fn from_io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => ApiError::NotFound(path.into()),
            _ => ApiError::Io(err),
        }
    }

    pub(crate) fn tool_failure(tool: &str, status: impl ToString, stderr: &[u8]) -> Self {
        ApiError::ExternalToolFailure {
            tool: tool.to_string(),
            status: status.to_string(),
            stderr: String::from_utf8_lossy(stderr).trim().to_string(),
        }
    }
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigInvalid(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_from_io_kind() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let mapped = ApiError::from_io("/videos/a.mkv", err);
        assert!(matches!(mapped, ApiError::NotFound(p) if p == PathBuf::from("/videos/a.mkv")));
    }

    #[test]
    fn test_only_path_not_allowed_is_security_violation() {
        assert!(ApiError::PathNotAllowed(PathBuf::from("/etc")).is_security_violation());
        assert!(!ApiError::NotFound(PathBuf::from("/etc")).is_security_violation());
        assert!(!ApiError::ConfigInvalid("bad".into()).is_security_violation());
    }

    #[test]
    fn test_tool_failure_carries_trimmed_stderr() {
        let err = ApiError::tool_failure("ffprobe", 1, b"  no such file \n");
        match err {
            ApiError::ExternalToolFailure { tool, status, stderr } => {
                assert_eq!(tool, "ffprobe");
                assert_eq!(status, "1");
                assert_eq!(stderr, "no such file");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
