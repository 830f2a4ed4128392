//! Analysis coordinator - concurrent dispatch of one run
//!
//! The coordinator spawns up to `concurrency` lanes on a [`JoinSet`]. Each lane
//! repeatedly takes an assignment from the shared [`Scheduler`], runs the
//! retry-wrapped provider call, and records the terminal outcome in the
//! [`Aggregator`]. A failing task never stops its lane or any other lane.

use crate::config::{DispatchConfig, WorkerCredential};
use crate::dispatch::retry::{with_retry, RetryPolicy};
use crate::dispatch::scheduler::{Assignment, CancelHandle, Scheduler};
use crate::provider::Analyzer;
use crate::state::{
    Aggregator, AnalysisOutcome, AnalysisResult, OutcomeEvent, OutcomeStatus, Progress,
};
use crate::{ConfigError, ScoutError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;

/// Error recorded for tasks still queued when a run is cancelled
pub const CANCELLED_MESSAGE: &str = "Analysis cancelled before this URL was dispatched";

/// Error recorded for a task whose lane stopped while it was in flight
pub const ABORTED_MESSAGE: &str = "Analysis did not complete because its worker lane stopped";

/// Final state of a run
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// One result per input URL, in input order
    pub results: Vec<AnalysisResult>,
    pub progress: Progress,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub cancelled: bool,
}

impl AnalysisReport {
    pub fn succeeded(&self) -> usize {
        self.count(OutcomeStatus::Success)
    }

    pub fn failed(&self) -> usize {
        self.count(OutcomeStatus::Error)
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    fn count(&self, status: OutcomeStatus) -> usize {
        self.results.iter().filter(|r| r.status() == status).count()
    }
}

/// Runs one batch of URLs across a worker pool
pub struct Coordinator<A> {
    analyzer: Arc<A>,
    scheduler: Arc<Scheduler>,
    aggregator: Arc<Aggregator>,
    policy: RetryPolicy,
    concurrency: usize,
}

impl<A: Analyzer + 'static> Coordinator<A> {
    /// Creates a coordinator for `urls`
    ///
    /// # Arguments
    ///
    /// * `analyzer` - Performs one provider call per attempt
    /// * `urls` - URLs to analyze, in the order results should be reported
    /// * `workers` - Worker pool; copied, so later edits do not affect this run
    /// * `config` - Concurrency and retry settings
    pub fn new(
        analyzer: A,
        urls: &[String],
        workers: &[WorkerCredential],
        config: &DispatchConfig,
    ) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
            scheduler: Arc::new(Scheduler::new(urls, workers)),
            aggregator: Arc::new(Aggregator::new(urls)),
            policy: RetryPolicy::from_config(config),
            concurrency: config.concurrency as usize,
        }
    }

    /// Replaces the retry policy derived from the config
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn progress(&self) -> Progress {
        self.aggregator.progress()
    }

    /// Subscribes to `{processed, total}` updates
    pub fn subscribe(&self) -> watch::Receiver<Progress> {
        self.aggregator.subscribe()
    }

    /// Opens a stream carrying each task's result as it resolves
    ///
    /// The stream ends when the run finishes.
    pub fn take_events(&self) -> mpsc::UnboundedReceiver<OutcomeEvent> {
        self.aggregator.take_events()
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.scheduler.cancel_handle()
    }

    /// Number of lanes a run will spawn: `min(concurrency, tasks)`, at least one
    pub fn lane_count(&self) -> usize {
        self.concurrency.clamp(1, self.progress().total.max(1))
    }

    /// Runs every task to a terminal outcome
    ///
    /// # Returns
    ///
    /// * `Ok(AnalysisReport)` - All tasks resolved; individual tasks may have failed
    /// * `Err(ScoutError)` - The worker pool is empty
    pub async fn run(self) -> Result<AnalysisReport, ScoutError> {
        let started_at = Utc::now();
        let total = self.progress().total;

        if total == 0 {
            tracing::info!("No URLs to analyze");
            self.aggregator.close_events();
            return Ok(self.report(started_at));
        }

        if self.scheduler.worker_count() == 0 {
            return Err(ConfigError::Validation(
                "at least one worker must be configured".to_string(),
            )
            .into());
        }

        let lanes = self.lane_count();
        tracing::info!(
            "Analyzing {} URLs with {} lanes across {} workers",
            total,
            lanes,
            self.scheduler.worker_count()
        );

        let mut set = JoinSet::new();
        for lane in 0..lanes {
            set.spawn(run_lane(
                lane,
                Arc::clone(&self.analyzer),
                Arc::clone(&self.scheduler),
                Arc::clone(&self.aggregator),
                self.policy,
            ));
        }

        while let Some(joined) = set.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Analysis lane stopped unexpectedly: {}", e);
            }
        }

        self.finalize();

        let report = self.report(started_at);
        tracing::info!(
            "Analysis finished: {} succeeded, {} failed out of {}",
            report.succeeded(),
            report.failed(),
            total
        );
        Ok(report)
    }

    /// Resolves every task the lanes left pending
    fn finalize(&self) {
        let cancelled = self.scheduler.drain_remaining();
        if !cancelled.is_empty() {
            tracing::warn!("{} URLs were not dispatched before cancellation", cancelled.len());
        }
        for task in cancelled {
            self.resolve_leftover(task.index, CANCELLED_MESSAGE);
        }

        for index in self.aggregator.pending_indices() {
            self.resolve_leftover(index, ABORTED_MESSAGE);
        }

        self.aggregator.close_events();
    }

    fn resolve_leftover(&self, index: usize, message: &str) {
        let outcome = AnalysisOutcome::Error {
            message: message.to_string(),
        };
        if let Err(e) = self.aggregator.record(index, outcome) {
            tracing::warn!("Could not resolve task {}: {}", index, e);
        }
    }

    fn report(&self, started_at: DateTime<Utc>) -> AnalysisReport {
        AnalysisReport {
            results: self.aggregator.snapshot(),
            progress: self.aggregator.progress(),
            started_at,
            finished_at: Utc::now(),
            cancelled: self.scheduler.is_cancelled(),
        }
    }
}

/// One lane: pull, analyze, record, until the queue is empty or cancelled
async fn run_lane<A: Analyzer>(
    lane: usize,
    analyzer: Arc<A>,
    scheduler: Arc<Scheduler>,
    aggregator: Arc<Aggregator>,
    policy: RetryPolicy,
) {
    tracing::trace!("Lane {} started", lane);

    while let Some(Assignment { task, worker }) = scheduler.next_assignment() {
        let label = format!("Analysis of {} with worker {}", task.url, worker.id);
        let analyzer_ref = analyzer.as_ref();
        let url = task.url.as_str();
        let credential = worker.as_ref();

        let outcome = match with_retry(&policy, &label, move || analyzer_ref.analyze(url, credential)).await {
            Ok(data) => AnalysisOutcome::Success { data },
            Err(e) => {
                tracing::warn!("{} failed: {}", label, e);
                AnalysisOutcome::Error {
                    message: format!("Failed to analyze {}. Reason: {}", task.url, e),
                }
            }
        };

        match aggregator.record(task.index, outcome) {
            Ok(progress) => tracing::debug!(
                "Lane {} resolved task {} ({}/{})",
                lane,
                task.index,
                progress.processed,
                progress.total
            ),
            Err(e) => tracing::warn!("Lane {} could not record task {}: {}", lane, task.index, e),
        }
    }

    tracing::trace!("Lane {} finished", lane);
}
