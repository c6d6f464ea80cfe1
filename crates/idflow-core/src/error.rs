//! Error types for the verification provider client.

use std::time::Duration;

/// Errors raised below the normalization boundary.
///
/// These never reach the orchestrator directly: the response normalizer turns
/// every one of them into a [`ProviderResult::Failure`](crate::types::ProviderResult).
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    /// Bearer token could not be obtained.
    #[error("failed to obtain bearer token: {body}")]
    Credential { status: Option<u16>, body: String },

    /// Provider answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Provider answered with a body that is not a JSON object.
    #[error("invalid response from provider: {status} - {body}")]
    InvalidResponse { status: u16, body: String },

    /// Request never produced a response.
    #[error("transport error: {message}")]
    Transport { message: String },

    /// Request exceeded the configured timeout.
    #[error("request timed out after {after:?}")]
    Timeout { after: Duration },

    /// Client could not be built from the configuration.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl ProviderError {
    /// HTTP status attached to the error, when a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Credential { status, .. } => *status,
            Self::Http { status, .. } | Self::InvalidResponse { status, .. } => Some(*status),
            Self::Transport { .. } | Self::Timeout { .. } | Self::Config { .. } => None,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport {
            message: err.to_string(),
        }
    }
}

/// Result type for provider operations below the normalization boundary.
pub type CallResult<T> = Result<T, ProviderError>;

/// Fatal conditions recorded as the report's top-level `error` string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReportError {
    /// Face or front-document image missing; nothing was called.
    #[error("Missing biometric data")]
    MissingBiometricData,

    /// OCR failed or flagged its own error status; dependent steps were not run.
    #[error("OCR Failed: {message}")]
    OcrFailed { message: String },
}

/// Configuration loading and validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("missing credential: {name}")]
    MissingCredential { name: &'static str },

    #[error("invalid {name} URL '{value}': {reason}")]
    InvalidUrl {
        name: &'static str,
        value: String,
        reason: String,
    },
}
