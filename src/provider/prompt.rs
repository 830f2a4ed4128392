//! Prompts and the structured output schema shared by all providers

use serde_json::{json, Value};

/// System instruction sent with every analysis request
pub const SYSTEM_INSTRUCTION: &str = "\
You are an affiliate marketing strategist and monetization analyst, combining the \
skills of a conversion-rate optimizer, an SEO strategist and an affiliate revenue \
specialist. For the web page at the given URL, judge how much affiliate revenue it \
could generate and what should be done to realize it.

Reply with a single JSON object and nothing else. It must contain:
- \"url\": the URL that was analyzed
- \"monetization_score\": integer from 1 to 100
- \"justification\": an expert explanation of the score covering intent, audience, \
product relevance and affiliate viability
- \"priority\": one of \"High\", \"Medium\", \"Low\"
- \"suggested_actions\": at least three objects, each with \"title\", \"description\" \
and \"impact\" (one of \"High\", \"Medium\", \"Low\")
- \"affiliate_niche\": the most relevant affiliate niche
- \"content_gap_analysis\": missing elements that hold back affiliate performance
- \"conversion_booster\": one advanced tactic to raise conversions

Every field is required. Never use placeholders such as \"N/A\".";

/// Builds the per-URL user instruction
///
/// `bare_json` adds an explicit request for an unfenced JSON object, for providers
/// that have no JSON response mode.
pub fn user_prompt(url: &str, bare_json: bool) -> String {
    let mut prompt = format!(
        "Please perform an affiliate monetization analysis for the following URL: {}",
        url
    );
    if bare_json {
        prompt.push_str(
            ". Respond ONLY with the JSON object, without any markdown formatting or extra text.",
        );
    }
    prompt
}

/// Output schema for schema-constrained generation
pub fn analysis_schema() -> Value {
    let level = json!({ "type": "STRING", "enum": ["High", "Medium", "Low"] });

    json!({
        "type": "OBJECT",
        "properties": {
            "url": { "type": "STRING" },
            "monetization_score": {
                "type": "INTEGER",
                "description": "A score from 1-100 estimating the page's potential to generate affiliate revenue"
            },
            "justification": {
                "type": "STRING",
                "description": "Expert explanation of the score: page intent, audience, product relevance and affiliate viability"
            },
            "priority": level.clone(),
            "suggested_actions": {
                "type": "ARRAY",
                "description": "At least three specific, high-impact affiliate optimization steps",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "title": { "type": "STRING" },
                        "description": { "type": "STRING" },
                        "impact": level
                    },
                    "required": ["title", "description", "impact"]
                }
            },
            "affiliate_niche": { "type": "STRING" },
            "content_gap_analysis": { "type": "STRING" },
            "conversion_booster": { "type": "STRING" }
        },
        "required": [
            "url",
            "monetization_score",
            "justification",
            "priority",
            "suggested_actions",
            "affiliate_niche",
            "content_gap_analysis",
            "conversion_booster"
        ]
    })
}
