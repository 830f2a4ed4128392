//! Affiliate Scout: sitemap-driven affiliate monetization analysis
//!
//! This crate takes the page URLs listed in a sitemap and fans them out across a
//! pool of AI provider credentials, collecting one structured monetization verdict
//! per URL while streaming progress as results arrive.

pub mod config;
pub mod dispatch;
pub mod output;
pub mod provider;
pub mod sitemap;
pub mod state;

use thiserror::Error;

/// Main error type for Affiliate Scout operations
#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Sitemap error: {0}")]
    Sitemap(#[from] SitemapError),

    #[error("{0}")]
    Fetch(#[from] FetchError),

    #[error("Analysis error: {0}")]
    Analysis(#[from] provider::AnalysisError),

    #[error("Invalid outcome transition for task {index}: already {from}")]
    InvalidTransition {
        index: usize,
        from: state::OutcomeStatus,
    },

    #[error("Task {index} can only be resolved to success or error")]
    NonTerminalOutcome { index: usize },

    #[error("No task with index {index}")]
    UnknownTask { index: usize },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Worker '{worker}' has no API key configured")]
    MissingCredential { worker: String },

    #[error("Worker '{worker}' uses {provider}, which requires a model name")]
    MissingModel { worker: String, provider: String },
}

/// Sitemap parsing errors
#[derive(Debug, Error)]
pub enum SitemapError {
    #[error("Invalid XML content provided. Content must be a non-empty string.")]
    EmptyInput,

    #[error("Failed to parse the sitemap XML. The content may be malformed or not valid XML: {0}")]
    Malformed(String),

    #[error("Sitemap index files are not supported. Please provide the XML from a specific sitemap (e.g., page-sitemap.xml).")]
    SitemapIndex,

    #[error("No URLs found in the sitemap XML. Please check the content.")]
    NoUrls,
}

/// Remote sitemap fetch errors
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Sitemap fetch failed. Last attempt error: {last}")]
    AllProxiesFailed { last: String },

    #[error("Sitemap fetch failed. No fetch proxies are configured.")]
    NoProxies,
}

/// Result type alias for Affiliate Scout operations
pub type Result<T> = std::result::Result<T, ScoutError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{Config, WorkerCredential};
pub use dispatch::{AnalysisReport, Coordinator};
pub use provider::{AnalysisError, ProviderKind};
pub use state::{AnalysisOutcome, AnalysisResult, AnalysisResultData, Priority};
