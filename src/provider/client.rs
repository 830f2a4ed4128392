//! HTTP provider client
//!
//! [`ProviderClient`] owns one shared `reqwest::Client` and performs exactly one
//! provider call per [`Analyzer::analyze`] invocation.

use crate::config::{Config, DispatchConfig, EndpointConfig, WorkerCredential};
use crate::provider::chat::{ChatCompletionRequest, MessagesRequest, ANTHROPIC_VERSION};
use crate::provider::response::ProviderReply;
use crate::provider::{gemini, AnalysisError, Analyzer, ProviderFamily, ProviderKind};
use crate::state::AnalysisResultData;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use std::fmt;
use std::time::Duration;

/// User agent sent with every provider and sitemap request
const USER_AGENT: &str = concat!("affiliate-scout/", env!("CARGO_PKG_VERSION"));

/// Builds the shared HTTP client
///
/// # Arguments
///
/// * `config` - Dispatcher configuration; supplies the per-request timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &DispatchConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Analyzer backed by the real provider HTTP APIs
#[derive(Clone)]
pub struct ProviderClient {
    http: Client,
    endpoints: EndpointConfig,
    gemini_api_key: Option<String>,
    timeout_secs: u64,
}

impl ProviderClient {
    /// Creates a client from its parts
    ///
    /// `gemini_api_key` is the ambient credential used by every gemini worker.
    pub fn new(http: Client, endpoints: EndpointConfig, gemini_api_key: Option<String>) -> Self {
        Self {
            http,
            endpoints,
            gemini_api_key,
            timeout_secs: DispatchConfig::default().request_timeout_secs,
        }
    }

    /// Creates a client with its own HTTP client built from `config`
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let http = build_http_client(&config.dispatch)?;
        Ok(Self {
            timeout_secs: config.dispatch.request_timeout_secs,
            ..Self::new(
                http,
                config.endpoints.clone(),
                config.gemini_api_key.clone(),
            )
        })
    }

    fn credential<'a>(&'a self, worker: &'a WorkerCredential) -> Result<&'a str, AnalysisError> {
        let key = if worker.provider.uses_ambient_credential() {
            self.gemini_api_key
                .as_deref()
                .map(str::trim)
                .filter(|key| !key.is_empty())
        } else {
            worker.api_key()
        };
        key.ok_or(AnalysisError::MissingCredential {
            provider: worker.provider,
        })
    }

    fn build_request(
        &self,
        url: &str,
        worker: &WorkerCredential,
    ) -> Result<RequestBuilder, AnalysisError> {
        let provider = worker.provider;
        let key = self.credential(worker)?;
        let model = provider.resolve_model(worker)?;
        let endpoint = self.endpoints.for_provider(provider);

        let request = match provider.family() {
            ProviderFamily::SchemaConstrained => self
                .http
                .post(gemini::endpoint(endpoint, model))
                .header("x-goog-api-key", key)
                .json(&gemini::request_body(url)),
            ProviderFamily::ChatCompletion => self
                .http
                .post(endpoint)
                .bearer_auth(key)
                .json(&ChatCompletionRequest::new(model, url)),
            ProviderFamily::Messages => self
                .http
                .post(endpoint)
                .header("x-api-key", key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&MessagesRequest::new(model, url)),
        };

        tracing::debug!(
            "Requesting {} analysis of {} (worker {}, model {})",
            provider,
            url,
            worker.id,
            model
        );
        Ok(request)
    }

    async fn send(&self, provider: ProviderKind, request: RequestBuilder) -> Result<String, AnalysisError> {
        let response = request
            .send()
            .await
            .map_err(|e| AnalysisError::from_transport(provider, e, self.timeout_secs))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AnalysisError::from_transport(provider, e, self.timeout_secs))?;

        tracing::trace!("{} replied {} ({} bytes)", provider, status, body.len());

        if !status.is_success() {
            return Err(AnalysisError::http(provider, status.as_u16(), &body));
        }
        Ok(body)
    }
}

impl fmt::Debug for ProviderClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderClient")
            .field("endpoints", &self.endpoints)
            .field("gemini_api_key", &self.gemini_api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[async_trait]
impl Analyzer for ProviderClient {
    async fn analyze(
        &self,
        url: &str,
        worker: &WorkerCredential,
    ) -> Result<AnalysisResultData, AnalysisError> {
        let request = self.build_request(url, worker)?;
        let body = self.send(worker.provider, request).await?;
        ProviderReply::normalize(worker.provider, &body)
    }
}
