//! Plain text report rendering

use crate::dispatch::AnalysisReport;
use crate::state::AnalysisOutcome;
use std::fmt::Write;

/// Formats a run report for the terminal, one block per URL
pub fn render_text(report: &AnalysisReport) -> String {
    let mut out = String::new();

    for (i, result) in report.results.iter().enumerate() {
        let _ = writeln!(out, "[{}] {}", i + 1, result.url);
        match &result.outcome {
            AnalysisOutcome::Success { data } => {
                let _ = writeln!(
                    out,
                    "    Score: {}/100 ({})   Priority: {}",
                    data.monetization_score,
                    data.score_band().label(),
                    data.priority
                );
                if let Some(niche) = &data.affiliate_niche {
                    let _ = writeln!(out, "    Niche: {}", niche);
                }
                let _ = writeln!(out, "    {}", data.justification);
                for action in &data.suggested_actions {
                    if action.description.is_empty() {
                        let _ = writeln!(out, "    - [{}] {}", action.impact, action.title);
                    } else {
                        let _ = writeln!(
                            out,
                            "    - [{}] {}: {}",
                            action.impact, action.title, action.description
                        );
                    }
                }
                if let Some(booster) = &data.conversion_booster {
                    let _ = writeln!(out, "    Booster: {}", booster);
                }
            }
            AnalysisOutcome::Error { message } => {
                let _ = writeln!(out, "    ERROR: {}", message);
            }
            AnalysisOutcome::Pending => {
                let _ = writeln!(out, "    pending");
            }
        }
        out.push('\n');
    }

    let _ = writeln!(
        out,
        "{} of {} URLs analyzed successfully",
        report.succeeded(),
        report.results.len()
    );
    out
}
