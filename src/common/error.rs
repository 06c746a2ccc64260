use thiserror::Error;
use uuid::Uuid;

use crate::domain::value_objects::provider_kind::ProviderKind;

/// Coarse classification of [`ScmClientError`] that callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Connection,
    NotFound,
    NotAFile,
    NotADirectory,
    Unsupported,
    UnresolvedMergeState,
    Canceled,
    DeadlineExceeded,
    Upstream,
}

#[derive(Error, Debug)]
pub enum ScmClientError {
    #[error("[{correlation_id}] Unable to connect to {provider}: {message}")]
    ConnectionError {
        correlation_id: Uuid,
        provider: ProviderKind,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Path is not a file: {path}")]
    NotAFile { path: String },

    #[error("Path is not a directory: {path}")]
    NotADirectory { path: String },

    #[error("{operation} is not supported by {provider}")]
    Unsupported {
        provider: ProviderKind,
        operation: String,
    },

    #[error("Pull request #{pull_request_id} has no merge commit yet: {reason}")]
    UnresolvedMergeState { pull_request_id: u64, reason: String },

    #[error("Operation cancelled")]
    Canceled,

    #[error("Operation deadline exceeded")]
    DeadlineExceeded,

    #[error("Upstream request failed{}: {message}", format_status(.status))]
    UpstreamError {
        message: String,
        status: Option<u16>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unable to decode provider response: {message}")]
    DecodeError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

fn format_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" with status {s}")).unwrap_or_default()
}

impl ScmClientError {
    pub fn connection_error(
        correlation_id: Uuid,
        provider: ProviderKind,
        message: impl Into<String>,
    ) -> Self {
        Self::ConnectionError {
            correlation_id,
            provider,
            message: message.into(),
            source: None,
        }
    }

    pub fn connection_error_with_source(
        correlation_id: Uuid,
        provider: ProviderKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::ConnectionError {
            correlation_id,
            provider,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn not_a_file(path: impl Into<String>) -> Self {
        Self::NotAFile { path: path.into() }
    }

    pub fn not_a_directory(path: impl Into<String>) -> Self {
        Self::NotADirectory { path: path.into() }
    }

    pub fn unsupported(provider: ProviderKind, operation: impl Into<String>) -> Self {
        Self::Unsupported {
            provider,
            operation: operation.into(),
        }
    }

    pub fn unresolved_merge_state(pull_request_id: u64, reason: impl Into<String>) -> Self {
        Self::UnresolvedMergeState {
            pull_request_id,
            reason: reason.into(),
        }
    }

    pub fn upstream_error(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::UpstreamError {
            message: message.into(),
            status,
            source: None,
        }
    }

    pub fn upstream_error_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::UpstreamError {
            message: message.into(),
            status: None,
            source: Some(Box::new(source)),
        }
    }

    pub fn decode_error(message: impl Into<String>) -> Self {
        Self::DecodeError {
            message: message.into(),
            source: None,
        }
    }

    pub fn decode_error_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::DecodeError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Classify this error. Undecodable payloads count as upstream failures.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConnectionError { .. } => ErrorKind::Connection,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::NotAFile { .. } => ErrorKind::NotAFile,
            Self::NotADirectory { .. } => ErrorKind::NotADirectory,
            Self::Unsupported { .. } => ErrorKind::Unsupported,
            Self::UnresolvedMergeState { .. } => ErrorKind::UnresolvedMergeState,
            Self::Canceled => ErrorKind::Canceled,
            Self::DeadlineExceeded => ErrorKind::DeadlineExceeded,
            Self::UpstreamError { .. } | Self::DecodeError { .. } => ErrorKind::Upstream,
        }
    }

    /// HTTP status reported by the provider, when there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::UpstreamError { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ScmClientError {
    fn from(error: reqwest::Error) -> Self {
        // A transport timeout is the server's failure, not the caller's
        // deadline.
        let message = if error.is_timeout() {
            "Network request timed out"
        } else {
            "Network request failed"
        };
        let status = error.status().map(|s| s.as_u16());
        Self::UpstreamError {
            message: message.to_string(),
            status,
            source: Some(Box::new(error)),
        }
    }
}

impl From<serde_json::Error> for ScmClientError {
    fn from(error: serde_json::Error) -> Self {
        Self::decode_error_with_source("JSON deserialization failed", error)
    }
}

impl From<base64::DecodeError> for ScmClientError {
    fn from(error: base64::DecodeError) -> Self {
        Self::decode_error_with_source("Base64 content decoding failed", error)
    }
}

impl From<url::ParseError> for ScmClientError {
    fn from(error: url::ParseError) -> Self {
        Self::upstream_error_with_source("Invalid endpoint URL", error)
    }
}
