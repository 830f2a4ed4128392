//! Configuration module for Affiliate Scout
//!
//! This module handles loading, parsing, and validating TOML configuration files:
//! the dispatcher settings, the sitemap fetch proxies, provider endpoints and the
//! worker pool.
//!
//! # Example
//!
//! ```no_run
//! use affiliate_scout::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("scout.toml")).unwrap();
//! println!("Worker pool size: {}", config.workers.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, DispatchConfig, EndpointConfig, SitemapConfig, WorkerCredential};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, load_config_with_hash, parse_config, resolve_environment,
    GEMINI_KEY_VARS,
};
pub use validation::{validate, validate_workers, MAX_CONCURRENCY};
