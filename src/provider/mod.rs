//! Provider adapters for AI analysis
//!
//! This module turns one `(url, worker)` pair into one provider call and
//! normalizes whatever comes back into [`AnalysisResultData`]:
//! - Schema-constrained generation (Gemini) with a strict output schema
//! - Generic chat completion over HTTP, in two wire shapes: the bearer-token
//!   `chat/completions` shape (OpenAI, OpenRouter, Groq) and the header-keyed
//!   `messages` shape (Claude)
//! - Error classification for the retry policy

mod chat;
mod client;
mod error;
mod gemini;
mod prompt;
mod response;

pub use client::{build_http_client, ProviderClient};
pub use error::{is_retryable_status, AnalysisError};
pub use prompt::{analysis_schema, user_prompt, SYSTEM_INSTRUCTION};
pub use response::{parse_analysis, strip_code_fence, ProviderReply};

use crate::config::WorkerCredential;
use crate::state::AnalysisResultData;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported AI providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    OpenAi,
    #[serde(alias = "anthropic")]
    Claude,
    OpenRouter,
    Groq,
}

/// Wire family a provider belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderFamily {
    /// Structured-output generation with a response schema
    SchemaConstrained,
    /// `chat/completions` with bearer authorization
    ChatCompletion,
    /// `messages` with an API-key header and a version header
    Messages,
}

impl ProviderKind {
    pub fn all() -> [Self; 5] {
        [
            Self::Gemini,
            Self::OpenAi,
            Self::Claude,
            Self::OpenRouter,
            Self::Groq,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAi => "openai",
            Self::Claude => "claude",
            Self::OpenRouter => "openrouter",
            Self::Groq => "groq",
        }
    }

    pub fn family(&self) -> ProviderFamily {
        match self {
            Self::Gemini => ProviderFamily::SchemaConstrained,
            Self::Claude => ProviderFamily::Messages,
            Self::OpenAi | Self::OpenRouter | Self::Groq => ProviderFamily::ChatCompletion,
        }
    }

    /// Gemini authenticates with an environment-supplied key instead of a
    /// per-worker one
    pub fn uses_ambient_credential(&self) -> bool {
        matches!(self, Self::Gemini)
    }

    /// Returns true if workers for this provider must name a model
    pub fn requires_model(&self) -> bool {
        matches!(self, Self::OpenRouter | Self::Groq)
    }

    /// Fixed model used by providers that do not take a model from config
    pub fn default_model(&self) -> Option<&'static str> {
        match self {
            Self::Gemini => Some("gemini-2.5-flash"),
            Self::OpenAi => Some("gpt-4-turbo"),
            Self::Claude => Some("claude-3-haiku-20240307"),
            Self::OpenRouter | Self::Groq => None,
        }
    }

    /// Resolves the model to request for a worker
    pub fn resolve_model<'a>(&self, worker: &'a WorkerCredential) -> Result<&'a str, AnalysisError> {
        if self.requires_model() {
            worker
                .model()
                .ok_or(AnalysisError::MissingModel { provider: *self })
        } else {
            self.default_model()
                .ok_or(AnalysisError::MissingModel { provider: *self })
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAi),
            "claude" | "anthropic" => Ok(Self::Claude),
            "openrouter" => Ok(Self::OpenRouter),
            "groq" => Ok(Self::Groq),
            other => Err(AnalysisError::UnsupportedProvider(other.to_string())),
        }
    }
}

/// Performs a single analysis attempt for one URL with one worker credential
///
/// Implementations make exactly one provider call; retrying is the dispatcher's
/// job.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(
        &self,
        url: &str,
        worker: &WorkerCredential,
    ) -> Result<AnalysisResultData, AnalysisError>;
}
