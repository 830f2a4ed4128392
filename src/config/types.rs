use crate::provider::ProviderKind;
use serde::Deserialize;
use std::fmt;

/// Main configuration structure for Affiliate Scout
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub sitemap: SitemapConfig,
    #[serde(default)]
    pub endpoints: EndpointConfig,
    #[serde(default, rename = "worker")]
    pub workers: Vec<WorkerCredential>,

    /// Ambient credential for the schema-constrained provider, read from the
    /// environment rather than the config file
    #[serde(skip)]
    pub gemini_api_key: Option<String>,
}

/// Dispatcher behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    /// Number of concurrent analysis lanes
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,

    /// Per-request timeout for provider calls (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Total attempts per URL, including the first
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base of the exponential backoff (milliseconds)
    #[serde(rename = "backoff-base-ms", default = "default_backoff_base")]
    pub backoff_base_ms: u64,

    /// Upper bound of the random jitter added to each backoff (milliseconds)
    #[serde(rename = "max-jitter-ms", default = "default_max_jitter")]
    pub max_jitter_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            request_timeout_secs: default_request_timeout(),
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base(),
            max_jitter_ms: default_max_jitter(),
        }
    }
}

/// Remote sitemap fetch configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SitemapConfig {
    /// Fetch proxy prefixes, tried in order. An empty prefix fetches directly.
    #[serde(default = "default_proxies")]
    pub proxies: Vec<String>,

    /// Timeout for each fetch attempt (seconds)
    #[serde(rename = "fetch-timeout-secs", default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self {
            proxies: default_proxies(),
            fetch_timeout_secs: default_fetch_timeout(),
        }
    }
}

/// Provider endpoint overrides
///
/// Each field defaults to the provider's public API endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    /// Base URL for the generative language API; the model path is appended
    #[serde(default = "default_gemini_endpoint")]
    pub gemini: String,
    #[serde(default = "default_openai_endpoint")]
    pub openai: String,
    #[serde(default = "default_claude_endpoint")]
    pub claude: String,
    #[serde(default = "default_openrouter_endpoint")]
    pub openrouter: String,
    #[serde(default = "default_groq_endpoint")]
    pub groq: String,
}

impl EndpointConfig {
    /// Returns the endpoint configured for a provider
    pub fn for_provider(&self, provider: ProviderKind) -> &str {
        match provider {
            ProviderKind::Gemini => &self.gemini,
            ProviderKind::OpenAi => &self.openai,
            ProviderKind::Claude => &self.claude,
            ProviderKind::OpenRouter => &self.openrouter,
            ProviderKind::Groq => &self.groq,
        }
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            gemini: default_gemini_endpoint(),
            openai: default_openai_endpoint(),
            claude: default_claude_endpoint(),
            openrouter: default_openrouter_endpoint(),
            groq: default_groq_endpoint(),
        }
    }
}

/// One configured (provider, API key, optional model) entry of the worker pool
#[derive(Clone, Deserialize)]
pub struct WorkerCredential {
    /// Identifier, unique within the pool
    pub id: String,

    pub provider: ProviderKind,

    /// Literal API key
    #[serde(rename = "api-key", default)]
    pub api_key: Option<String>,

    /// Name of an environment variable holding the API key
    #[serde(rename = "api-key-env", default)]
    pub api_key_env: Option<String>,

    /// Model name; only consulted for providers that require one
    #[serde(default)]
    pub model: Option<String>,
}

impl WorkerCredential {
    /// Creates a worker with an inline API key
    pub fn new(id: impl Into<String>, provider: ProviderKind, api_key: Option<String>) -> Self {
        Self {
            id: id.into(),
            provider,
            api_key,
            api_key_env: None,
            model: None,
        }
    }

    /// Sets the model name
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Returns the API key if one is set and non-blank
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    /// Returns the configured model if one is set and non-blank
    pub fn model(&self) -> Option<&str> {
        self.model
            .as_deref()
            .map(str::trim)
            .filter(|model| !model.is_empty())
    }
}

impl fmt::Debug for WorkerCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerCredential")
            .field("id", &self.id)
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_key_env", &self.api_key_env)
            .field("model", &self.model)
            .finish()
    }
}

fn default_concurrency() -> u32 {
    8
}

fn default_request_timeout() -> u64 {
    60
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_base() -> u64 {
    1000
}

fn default_max_jitter() -> u64 {
    1000
}

fn default_fetch_timeout() -> u64 {
    30
}

fn default_proxies() -> Vec<String> {
    vec![
        String::new(),
        "https://corsproxy.io/?".to_string(),
        "https://api.allorigins.win/raw?url=".to_string(),
    ]
}

fn default_gemini_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_claude_endpoint() -> String {
    "https://api.anthropic.com/v1/messages".to_string()
}

fn default_openrouter_endpoint() -> String {
    "https://openrouter.ai/api/v1/chat/completions".to_string()
}

fn default_groq_endpoint() -> String {
    "https://api.groq.com/openai/v1/chat/completions".to_string()
}
