//! State module for tracking analysis progress
//!
//! This module provides the canonical analysis record and the per-task outcome
//! state shared between the dispatcher and whatever renders its results.
//!
//! # Components
//!
//! - `AnalysisOutcome`: Pending / success / error lifecycle of one task
//! - `AnalysisResultData`: The normalized verdict produced by a provider
//! - `Aggregator`: Ordered outcome store plus the `{processed, total}` counter

mod aggregator;
mod outcome;

// Re-export main types
pub use aggregator::{Aggregator, OutcomeEvent, Progress};
pub use outcome::{
    AnalysisOutcome, AnalysisResult, AnalysisResultData, Impact, OutcomeStatus, Priority,
    ScoreBand, SuggestedAction,
};
