//! Output module for presenting analysis results
//!
//! This module handles:
//! - Rendering a finished run as plain text, markdown or JSON
//! - Computing and printing run statistics
//!
//! Everything is rendered to strings or stdout; nothing is persisted.

mod markdown;
pub mod stats;
mod text;

pub use markdown::render_markdown;
pub use stats::{print_statistics, RunStatistics};
pub use text::render_text;

use crate::dispatch::AnalysisReport;
use crate::ScoutError;
use serde::Serialize;

#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    report: &'a AnalysisReport,
    statistics: RunStatistics,
}

/// Serializes a run report as pretty-printed JSON
///
/// Results appear in input order as `{url, status, data?, error?}` objects,
/// next to the final progress pair and the run statistics.
///
/// # Returns
///
/// * `Ok(String)` - The JSON document
/// * `Err(ScoutError)` - Serialization failed
pub fn render_json(report: &AnalysisReport) -> Result<String, ScoutError> {
    let document = JsonReport {
        report,
        statistics: RunStatistics::from_report(report),
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::state::{
        AnalysisOutcome, AnalysisResult, AnalysisResultData, Impact, Priority, Progress,
        SuggestedAction,
    };
    use chrono::{TimeZone, Utc};

    pub fn sample_report() -> AnalysisReport {
        let boots = AnalysisResultData {
            url: "https://example.com/best-boots".to_string(),
            monetization_score: 87,
            justification: "Buyer-intent review page.".to_string(),
            priority: Priority::High,
            suggested_actions: vec![
                SuggestedAction {
                    title: "Add comparison table".to_string(),
                    description: "Top picks | side by side".to_string(),
                    impact: Impact::High,
                },
                SuggestedAction {
                    title: "Add affiliate links".to_string(),
                    description: String::new(),
                    impact: Impact::Medium,
                },
            ],
            affiliate_niche: Some("outdoor gear".to_string()),
            content_gap_analysis: None,
            conversion_booster: Some("Sticky buy box".to_string()),
        };
        let about = AnalysisResultData {
            url: "https://example.com/about".to_string(),
            monetization_score: 25,
            justification: "Company page with little commercial intent.".to_string(),
            priority: Priority::Low,
            suggested_actions: Vec::new(),
            affiliate_niche: None,
            content_gap_analysis: None,
            conversion_booster: None,
        };

        AnalysisReport {
            results: vec![
                AnalysisResult {
                    url: boots.url.clone(),
                    outcome: AnalysisOutcome::Success { data: boots },
                },
                AnalysisResult {
                    url: about.url.clone(),
                    outcome: AnalysisOutcome::Success { data: about },
                },
                AnalysisResult {
                    url: "https://example.com/contact".to_string(),
                    outcome: AnalysisOutcome::Error {
                        message: "Failed to analyze https://example.com/contact. Reason: API request failed for openai with status 401: bad key".to_string(),
                    },
                },
            ],
            progress: Progress {
                processed: 3,
                total: 3,
            },
            started_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            finished_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 42).unwrap(),
            cancelled: false,
        }
    }

    #[test]
    fn test_render_json() {
        let json = render_json(&sample_report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["progress"]["processed"], 3);
        assert_eq!(value["results"][0]["status"], "success");
        assert_eq!(value["results"][0]["data"]["monetization_score"], 87);
        assert_eq!(value["results"][2]["status"], "error");
        assert!(value["results"][2]["error"]
            .as_str()
            .unwrap()
            .starts_with("Failed to analyze"));
        assert_eq!(value["statistics"]["succeeded"], 2);
        assert_eq!(value["statistics"]["duration_seconds"], 42);
    }
}
