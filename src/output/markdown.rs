//! Markdown report generation
//!
//! Renders one section per URL in input order, with the analysis fields and a
//! table of suggested actions, or the error for URLs that failed.

use crate::dispatch::AnalysisReport;
use crate::output::RunStatistics;
use crate::state::{AnalysisOutcome, AnalysisResultData, Priority};

/// Formats a run report as markdown
///
/// # Arguments
///
/// * `report` - The finished run
///
/// # Returns
///
/// A formatted markdown string
pub fn render_markdown(report: &AnalysisReport) -> String {
    let stats = RunStatistics::from_report(report);
    let mut md = String::new();

    md.push_str("# Affiliate Monetization Report\n\n");

    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Started**: {}\n", report.started_at.to_rfc3339()));
    md.push_str(&format!("- **Finished**: {}\n", report.finished_at.to_rfc3339()));
    md.push_str(&format!(
        "- **Analyzed**: {} / {} URLs\n",
        stats.succeeded, stats.total
    ));
    if stats.failed > 0 {
        md.push_str(&format!("- **Failed**: {}\n", stats.failed));
    }
    if report.cancelled {
        md.push_str("- **Cancelled**: yes\n");
    }
    md.push('\n');

    if stats.succeeded > 0 {
        md.push_str("| Priority | Pages |\n");
        md.push_str("|----------|-------|\n");
        for priority in Priority::all() {
            md.push_str(&format!(
                "| {} | {} |\n",
                priority,
                stats.priority_count(priority)
            ));
        }
        md.push('\n');
    }

    for (i, result) in report.results.iter().enumerate() {
        md.push_str(&format!("## {}. {}\n\n", i + 1, result.url));
        match &result.outcome {
            AnalysisOutcome::Success { data } => push_analysis(&mut md, data),
            AnalysisOutcome::Error { message } => {
                md.push_str(&format!("> **Analysis failed**: {}\n\n", message));
            }
            AnalysisOutcome::Pending => md.push_str("_Pending_\n\n"),
        }
    }

    md
}

fn push_analysis(md: &mut String, data: &AnalysisResultData) {
    md.push_str(&format!(
        "- **Monetization Score**: {}/100 ({})\n",
        data.monetization_score,
        data.score_band().label()
    ));
    md.push_str(&format!("- **Priority**: {}\n", data.priority));
    if let Some(niche) = &data.affiliate_niche {
        md.push_str(&format!("- **Affiliate Niche**: {}\n", niche));
    }
    md.push('\n');

    md.push_str(&format!("{}\n\n", data.justification));

    if let Some(gaps) = &data.content_gap_analysis {
        md.push_str(&format!("**Content Gaps**: {}\n\n", gaps));
    }
    if let Some(booster) = &data.conversion_booster {
        md.push_str(&format!("**Conversion Booster**: {}\n\n", booster));
    }

    if !data.suggested_actions.is_empty() {
        md.push_str("| Action | Impact | Details |\n");
        md.push_str("|--------|--------|---------|\n");
        for action in &data.suggested_actions {
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                escape_cell(&action.title),
                action.impact,
                escape_cell(&action.description)
            ));
        }
        md.push('\n');
    }
}

/// Keeps free text from breaking a table row
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
