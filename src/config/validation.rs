use crate::config::types::{Config, DispatchConfig, EndpointConfig, SitemapConfig, WorkerCredential};
use crate::provider::ProviderKind;
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Upper bound on concurrent analysis lanes
pub const MAX_CONCURRENCY: u32 = 50;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_dispatch_config(&config.dispatch)?;
    validate_sitemap_config(&config.sitemap)?;
    validate_endpoints(&config.endpoints)?;
    validate_workers(&config.workers, config.gemini_api_key.as_deref())?;
    Ok(())
}

/// Validates dispatcher configuration
fn validate_dispatch_config(config: &DispatchConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > MAX_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and {}, got {}",
            MAX_CONCURRENCY, config.concurrency
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    Ok(())
}

/// Validates sitemap fetch configuration
fn validate_sitemap_config(config: &SitemapConfig) -> Result<(), ConfigError> {
    if config.fetch_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "fetch_timeout_secs must be >= 1".to_string(),
        ));
    }

    for proxy in config.proxies.iter().filter(|p| !p.is_empty()) {
        Url::parse(proxy)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid proxy '{}': {}", proxy, e)))?;
    }

    Ok(())
}

/// Validates provider endpoint overrides
fn validate_endpoints(endpoints: &EndpointConfig) -> Result<(), ConfigError> {
    for provider in ProviderKind::all() {
        let endpoint = endpoints.for_provider(provider);
        Url::parse(endpoint).map_err(|e| {
            ConfigError::InvalidUrl(format!(
                "Invalid {} endpoint '{}': {}",
                provider, endpoint, e
            ))
        })?;
    }
    Ok(())
}

/// Validates the worker pool
///
/// Every rule here is a run-level configuration error: it must be caught before
/// any URL is dispatched.
pub fn validate_workers(
    workers: &[WorkerCredential],
    gemini_api_key: Option<&str>,
) -> Result<(), ConfigError> {
    if workers.is_empty() {
        return Err(ConfigError::Validation(
            "at least one worker must be configured".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for worker in workers {
        if worker.id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "worker id cannot be empty".to_string(),
            ));
        }

        if !seen.insert(worker.id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate worker id '{}'",
                worker.id
            )));
        }

        validate_worker(worker, gemini_api_key)?;
    }

    Ok(())
}

/// Validates a single worker's credential and model requirements
fn validate_worker(
    worker: &WorkerCredential,
    gemini_api_key: Option<&str>,
) -> Result<(), ConfigError> {
    let has_key = if worker.provider.uses_ambient_credential() {
        gemini_api_key.is_some_and(|key| !key.trim().is_empty())
    } else {
        worker.api_key().is_some()
    };

    if !has_key {
        return Err(ConfigError::MissingCredential {
            worker: worker.id.clone(),
        });
    }

    if worker.provider.requires_model() && worker.model().is_none() {
        return Err(ConfigError::MissingModel {
            worker: worker.id.clone(),
            provider: worker.provider.to_string(),
        });
    }

    if !worker.provider.requires_model() && worker.model().is_some() {
        tracing::debug!(
            "Worker '{}' sets a model, but {} always uses {}",
            worker.id,
            worker.provider,
            worker.provider.default_model().unwrap_or("its default model")
        );
    }

    Ok(())
}
