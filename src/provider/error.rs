//! Provider error types and retry classification

use crate::provider::ProviderKind;
use thiserror::Error;

/// Longest slice of an error response body kept in messages
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Errors raised while analyzing one URL with one worker
///
/// Each variant is either terminal or retryable; see [`AnalysisError::is_retryable`].
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("API key is missing for {provider}")]
    MissingCredential { provider: ProviderKind },

    #[error("Model name is missing for {provider}")]
    MissingModel { provider: ProviderKind },

    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    #[error("API request failed for {provider} with status {status}: {body}")]
    Http {
        provider: ProviderKind,
        status: u16,
        body: String,
    },

    #[error("Request to {provider} timed out after {secs} seconds")]
    Timeout { provider: ProviderKind, secs: u64 },

    #[error("Request to {provider} failed: {message}")]
    Transport {
        provider: ProviderKind,
        message: String,
    },

    #[error("Received an empty response from {provider}")]
    EmptyResponse { provider: ProviderKind },

    #[error("Invalid response structure: {0}")]
    MalformedResponse(String),

    #[error("API returned invalid JSON. The response may be malformed or an error message. Details: {0}")]
    InvalidJson(String),
}

impl AnalysisError {
    /// Returns true if another attempt may succeed
    ///
    /// | Error | Retry |
    /// |-------|-------|
    /// | HTTP 4xx except 408 and 429 | No |
    /// | HTTP 408, 429, 5xx | Yes |
    /// | Timeout, transport failure | Yes |
    /// | Empty, malformed or non-JSON reply | Yes |
    /// | Missing credential or model, unsupported provider | No |
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::MissingCredential { .. }
            | Self::MissingModel { .. }
            | Self::UnsupportedProvider(_) => false,
            Self::Http { status, .. } => is_retryable_status(*status),
            Self::Timeout { .. }
            | Self::Transport { .. }
            | Self::EmptyResponse { .. }
            | Self::MalformedResponse(_)
            | Self::InvalidJson(_) => true,
        }
    }

    /// Converts a transport-level reqwest failure
    pub fn from_transport(provider: ProviderKind, err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                provider,
                secs: timeout_secs,
            }
        } else {
            Self::Transport {
                provider,
                message: err.to_string(),
            }
        }
    }

    /// Builds an HTTP status error, keeping only the head of a long body
    pub fn http(provider: ProviderKind, status: u16, body: &str) -> Self {
        let body = body.trim();
        let body = if body.chars().count() > MAX_ERROR_BODY_CHARS {
            let head: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
            format!("{}...", head)
        } else {
            body.to_string()
        };
        Self::Http {
            provider,
            status,
            body,
        }
    }
}

/// Classifies an HTTP status code
///
/// Client errors are permanent (bad credential, malformed request) except for
/// request timeout and rate limiting.
pub fn is_retryable_status(status: u16) -> bool {
    !((400..500).contains(&status) && status != 408 && status != 429)
}
