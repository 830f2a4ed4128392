use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Environment variables consulted for the ambient Gemini credential, in order
pub const GEMINI_KEY_VARS: &[&str] = &["GEMINI_API_KEY", "API_KEY"];

/// Loads and parses a configuration file from the given path
///
/// Worker keys given through `api-key-env` and the ambient Gemini credential are
/// resolved from the environment before validation runs.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use affiliate_scout::config::load_config;
///
/// let config = load_config(Path::new("scout.toml")).unwrap();
/// println!("Lanes: {}", config.dispatch.concurrency);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let config = parse_config(path)?;
    validate(&config)?;
    Ok(config)
}

/// Reads, parses and resolves a configuration file without validating it
///
/// The binary uses this when command-line flags may still complete the config
/// (for example an ad-hoc worker), and validates afterwards.
pub fn parse_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut config: Config = toml::from_str(&content)?;
    resolve_environment(&mut config);
    Ok(config)
}

/// Fills in credentials that come from the environment
pub fn resolve_environment(config: &mut Config) {
    for worker in &mut config.workers {
        if worker.api_key().is_some() {
            continue;
        }
        if let Some(var) = &worker.api_key_env {
            match std::env::var(var) {
                Ok(value) => worker.api_key = Some(value),
                Err(_) => {
                    tracing::warn!(
                        "Environment variable {} for worker '{}' is not set",
                        var,
                        worker.id
                    );
                }
            }
        }
    }

    if config.gemini_api_key.is_none() {
        config.gemini_api_key = GEMINI_KEY_VARS
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|value| !value.trim().is_empty());
    }
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so a run's results can be traced back to the exact
/// configuration that produced them.
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}
