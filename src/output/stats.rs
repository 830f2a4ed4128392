//! Run statistics
//!
//! Summarizes an [`AnalysisReport`] into counts by outcome, priority and score
//! band, and prints them to stdout.

use crate::dispatch::AnalysisReport;
use crate::state::{OutcomeStatus, Priority, ScoreBand};
use serde::Serialize;
use std::collections::HashMap;

/// Run statistics summary
#[derive(Debug, Clone, Serialize)]
pub struct RunStatistics {
    /// Number of URLs in the run
    pub total: usize,

    /// URLs with a successful analysis
    pub succeeded: usize,

    /// URLs whose analysis failed
    pub failed: usize,

    /// Successful analyses by priority
    pub by_priority: HashMap<Priority, usize>,

    /// Successful analyses by score band
    #[serde(skip)]
    pub by_band: HashMap<ScoreBand, usize>,

    /// Mean monetization score of successful analyses
    pub average_score: Option<f64>,

    pub duration_seconds: i64,

    pub cancelled: bool,
}

impl RunStatistics {
    /// Computes statistics from a finished run
    pub fn from_report(report: &AnalysisReport) -> Self {
        let mut by_priority = HashMap::new();
        let mut by_band = HashMap::new();
        let mut score_sum = 0u64;
        let mut failed = 0;

        for result in &report.results {
            match result.outcome.data() {
                Some(data) => {
                    *by_priority.entry(data.priority).or_insert(0) += 1;
                    *by_band.entry(data.score_band()).or_insert(0) += 1;
                    score_sum += u64::from(data.monetization_score);
                }
                None if result.status() == OutcomeStatus::Error => failed += 1,
                None => {}
            }
        }

        let succeeded: usize = by_priority.values().sum();
        let average_score = if succeeded > 0 {
            Some(score_sum as f64 / succeeded as f64)
        } else {
            None
        };

        Self {
            total: report.results.len(),
            succeeded,
            failed,
            by_priority,
            by_band,
            average_score,
            duration_seconds: report.duration().num_seconds(),
            cancelled: report.cancelled,
        }
    }

    /// Percentage of URLs analyzed successfully
    pub fn success_rate(&self) -> f64 {
        if self.total > 0 {
            (self.succeeded as f64 / self.total as f64) * 100.0
        } else {
            0.0
        }
    }

    pub fn priority_count(&self, priority: Priority) -> usize {
        self.by_priority.get(&priority).copied().unwrap_or(0)
    }

    pub fn band_count(&self, band: ScoreBand) -> usize {
        self.by_band.get(&band).copied().unwrap_or(0)
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &RunStatistics) {
    println!("=== Analysis Statistics ===\n");

    println!("Overview:");
    println!("  URLs analyzed: {}", stats.total);
    println!("  Successful: {}", stats.succeeded);
    println!("  Failed: {}", stats.failed);
    if let Some(average) = stats.average_score {
        println!("  Average score: {:.1}", average);
    }
    println!("  Duration: {}s", stats.duration_seconds);
    if stats.cancelled {
        println!("  Run was cancelled before all URLs were dispatched");
    }
    println!();

    if stats.succeeded > 0 {
        println!("By Priority:");
        for priority in Priority::all() {
            println!("  {}: {}", priority, stats.priority_count(priority));
        }
        println!();

        println!("By Score Band:");
        for band in [ScoreBand::Strong, ScoreBand::Moderate, ScoreBand::Weak] {
            println!("  {}: {}", band.label(), stats.band_count(band));
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} URLs successfully analyzed)",
        stats.success_rate(),
        stats.succeeded,
        stats.total
    );
}
