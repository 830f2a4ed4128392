//! Outcome and analysis record definitions
//!
//! This module defines the canonical per-URL analysis record and the lifecycle
//! of a task's outcome: `pending`, then exactly one of `success` or `error`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Urgency of acting on a page's monetization opportunity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Parses a priority label, ignoring case and surrounding whitespace
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }

    pub fn all() -> [Self; 3] {
        [Self::High, Self::Medium, Self::Low]
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expected impact of a single suggested action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Impact {
    High,
    Medium,
    Low,
}

impl Impact {
    /// Parses an impact label, ignoring case and surrounding whitespace
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One concrete optimization step suggested for a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedAction {
    pub title: String,
    pub description: String,
    pub impact: Impact,
}

/// Coarse grouping of monetization scores used when presenting results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreBand {
    /// Score of 70 or more
    Strong,
    /// Score from 40 to 69
    Moderate,
    /// Score below 40
    Weak,
}

impl ScoreBand {
    pub fn from_score(score: u8) -> Self {
        if score >= 70 {
            Self::Strong
        } else if score >= 40 {
            Self::Moderate
        } else {
            Self::Weak
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Strong => "strong",
            Self::Moderate => "moderate",
            Self::Weak => "weak",
        }
    }
}

/// Canonical affiliate monetization verdict for one URL
///
/// Every provider's reply is normalized into this shape before it reaches the
/// dispatcher. Only the structure is checked; the content is the model's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResultData {
    pub url: String,

    /// Estimated affiliate revenue potential, 1 to 100
    pub monetization_score: u8,

    /// Expert explanation of the score
    pub justification: String,

    pub priority: Priority,

    pub suggested_actions: Vec<SuggestedAction>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affiliate_niche: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_gap_analysis: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversion_booster: Option<String>,
}

impl AnalysisResultData {
    pub fn score_band(&self) -> ScoreBand {
        ScoreBand::from_score(self.monetization_score)
    }
}

/// Lifecycle status of a task's outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Pending,
    Success,
    Error,
}

impl OutcomeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current outcome of one analysis task
///
/// Starts as `Pending` and transitions exactly once to `Success` or `Error`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AnalysisOutcome {
    Pending,
    Success {
        data: AnalysisResultData,
    },
    Error {
        #[serde(rename = "error")]
        message: String,
    },
}

impl AnalysisOutcome {
    pub fn status(&self) -> OutcomeStatus {
        match self {
            Self::Pending => OutcomeStatus::Pending,
            Self::Success { .. } => OutcomeStatus::Success,
            Self::Error { .. } => OutcomeStatus::Error,
        }
    }

    /// Returns true once the outcome can no longer change
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn data(&self) -> Option<&AnalysisResultData> {
        match self {
            Self::Success { data } => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Error { message } => Some(message),
            _ => None,
        }
    }
}

/// A URL paired with its current outcome, as exposed to renderers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub url: String,
    #[serde(flatten)]
    pub outcome: AnalysisOutcome,
}

impl AnalysisResult {
    pub fn pending(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            outcome: AnalysisOutcome::Pending,
        }
    }

    pub fn status(&self) -> OutcomeStatus {
        self.outcome.status()
    }
}
