//! Error types for the dbwheel client

use dbwheel_core::CoreError;
use thiserror::Error;

use crate::poll::ResourceKind;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur while talking to the workspace
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// External command exited unsuccessfully
    #[error("Command `{command}` failed (exit code {code:?}): {stderr}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Polled resource reached a failure status
    #[error("{resource} entered failed state {status}... aborting.")]
    RemoteOperationFailed {
        resource: ResourceKind,
        status: String,
    },

    /// No library status matched the tracked wheel
    #[error("No library status for {wheel} on cluster {cluster_id}")]
    LibraryNotFound { cluster_id: String, wheel: String },

    /// More than one library status matched the tracked wheel
    #[error("{count} library statuses match {wheel} on cluster {cluster_id}")]
    AmbiguousLibrary {
        cluster_id: String,
        wheel: String,
        count: usize,
    },

    /// Polling gave up before a terminal status was observed
    #[error("Gave up waiting for {resource} after {attempts} attempt(s)")]
    PollTimeout {
        resource: ResourceKind,
        attempts: u32,
    },

    /// Job definition cannot be upserted
    #[error("Invalid job definition: {0}")]
    InvalidDefinition(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ApiError { status: 404, .. })
    }

    /// Check if the remote call itself failed, as opposed to a status the
    /// remote reported
    pub fn is_remote_call_error(&self) -> bool {
        matches!(
            self,
            Self::RequestFailed(_)
                | Self::ApiError { .. }
                | Self::ParseError(_)
                | Self::CommandFailed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_message_names_status() {
        let err = ClientError::RemoteOperationFailed {
            resource: ResourceKind::Run,
            status: "INTERNAL_ERROR".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Run entered failed state INTERNAL_ERROR... aborting."
        );
        assert!(!err.is_remote_call_error());
    }

    #[test]
    fn test_not_found() {
        assert!(ClientError::api_error(404, "RESOURCE_DOES_NOT_EXIST").is_not_found());
        assert!(!ClientError::api_error(500, "boom").is_not_found());
        assert!(ClientError::api_error(500, "boom").is_remote_call_error());
    }
}
