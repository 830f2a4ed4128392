//! Dispatch module for concurrent analysis runs
//!
//! This module contains the core dispatch logic, including:
//! - The retry policy wrapped around every provider call
//! - The shared task queue with round-robin worker assignment
//! - Lane orchestration and run finalization
//! - Cancellation

mod coordinator;
mod retry;
mod scheduler;

pub use coordinator::{AnalysisReport, Coordinator, ABORTED_MESSAGE, CANCELLED_MESSAGE};
pub use retry::{with_retry, RetryPolicy};
pub use scheduler::{AnalysisTask, Assignment, CancelHandle, Scheduler};

use crate::config::Config;
use crate::provider::ProviderClient;
use crate::ScoutError;

/// Analyzes `urls` with the worker pool and settings from `config`
///
/// This is the one-call entry point. It will:
/// 1. Build the shared HTTP client
/// 2. Snapshot the worker pool
/// 3. Run every URL to a terminal outcome
///
/// # Arguments
///
/// * `config` - A validated configuration
/// * `urls` - URLs to analyze, in report order
///
/// # Returns
///
/// * `Ok(AnalysisReport)` - Every URL resolved; individual URLs may have failed
/// * `Err(ScoutError)` - The HTTP client could not be built or the pool is empty
pub async fn analyze_urls(config: &Config, urls: &[String]) -> Result<AnalysisReport, ScoutError> {
    let client = ProviderClient::from_config(config)?;
    Coordinator::new(client, urls, &config.workers, &config.dispatch)
        .run()
        .await
}
