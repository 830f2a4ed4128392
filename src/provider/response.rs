//! Provider response envelopes and normalization
//!
//! Each wire family has its own reply envelope. They are decoded into the closed
//! [`ProviderReply`] union, the assistant text is pulled out, and that text is
//! normalized into the canonical [`AnalysisResultData`] before it leaves the
//! provider layer.

use crate::provider::{AnalysisError, ProviderFamily, ProviderKind};
use crate::state::{AnalysisResultData, Impact, Priority, SuggestedAction};
use serde::Deserialize;
use serde_json::Value;

/// `generateContent` reply
#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

/// `chat/completions` reply
#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// `messages` reply
#[derive(Debug, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

/// Decoded reply envelope, one variant per wire family
#[derive(Debug)]
pub enum ProviderReply {
    Gemini(GenerateContentResponse),
    ChatCompletion(ChatCompletionResponse),
    Messages(MessagesResponse),
}

impl ProviderReply {
    /// Decodes a raw HTTP body according to the provider's wire family
    pub fn decode(provider: ProviderKind, body: &str) -> Result<Self, AnalysisError> {
        if body.trim().is_empty() {
            return Err(AnalysisError::EmptyResponse { provider });
        }

        let malformed = |e: serde_json::Error| {
            AnalysisError::MalformedResponse(format!("{} reply envelope: {}", provider, e))
        };

        let reply = match provider.family() {
            ProviderFamily::SchemaConstrained => {
                Self::Gemini(serde_json::from_str(body).map_err(malformed)?)
            }
            ProviderFamily::ChatCompletion => {
                Self::ChatCompletion(serde_json::from_str(body).map_err(malformed)?)
            }
            ProviderFamily::Messages => {
                Self::Messages(serde_json::from_str(body).map_err(malformed)?)
            }
        };
        Ok(reply)
    }

    /// Extracts the assistant's text from the envelope
    pub fn into_text(self) -> Option<String> {
        let text = match self {
            Self::Gemini(reply) => {
                let parts: Vec<String> = reply
                    .candidates
                    .into_iter()
                    .next()?
                    .content?
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect();
                parts.concat()
            }
            Self::ChatCompletion(reply) => reply.choices.into_iter().next()?.message?.content?,
            Self::Messages(reply) => reply.content.into_iter().find_map(|block| block.text)?,
        };

        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Decodes a body all the way to the canonical analysis record
    pub fn normalize(provider: ProviderKind, body: &str) -> Result<AnalysisResultData, AnalysisError> {
        let text = Self::decode(provider, body)?
            .into_text()
            .ok_or(AnalysisError::EmptyResponse { provider })?;
        parse_analysis(&text)
    }
}

/// Removes an optional markdown code fence around a JSON block
///
/// ```
/// use affiliate_scout::provider::strip_code_fence;
///
/// assert_eq!(strip_code_fence("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
/// assert_eq!(strip_code_fence("  {\"a\": 1} "), "{\"a\": 1}");
/// ```
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    // Fences inside the JSON body belong to string values
    let start = match trimmed.find("```") {
        Some(start) if trimmed.find('{').map_or(true, |brace| start < brace) => start,
        _ => return trimmed,
    };

    let after = &trimmed[start + 3..];
    let body = match after.find('\n') {
        Some(i) if after[..i].trim().chars().all(|c| c.is_ascii_alphanumeric()) => &after[i + 1..],
        _ => after.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
    };

    match body.rfind("```") {
        Some(end) => body[..end].trim(),
        None => trimmed,
    }
}

/// Parses model output text into the canonical analysis record
///
/// Syntax errors surface as [`AnalysisError::InvalidJson`]; well-formed JSON with
/// the wrong shape surfaces as [`AnalysisError::MalformedResponse`].
pub fn parse_analysis(text: &str) -> Result<AnalysisResultData, AnalysisError> {
    let json = strip_code_fence(text);
    let value: Value =
        serde_json::from_str(json).map_err(|e| AnalysisError::InvalidJson(e.to_string()))?;

    if !matches!(&value, Value::Object(map) if !map.is_empty()) {
        return Err(AnalysisError::InvalidJson(
            "Parsed JSON is not a valid object or is empty.".to_string(),
        ));
    }

    let raw: RawAnalysis =
        serde_json::from_value(value).map_err(|e| AnalysisError::MalformedResponse(e.to_string()))?;
    raw.normalize()
}

/// Analysis as the model wrote it, before coercion
#[derive(Debug, Deserialize)]
struct RawAnalysis {
    url: String,
    monetization_score: Value,
    #[serde(alias = "summary")]
    justification: String,
    priority: String,
    suggested_actions: Vec<RawAction>,
    #[serde(default)]
    affiliate_niche: Option<String>,
    #[serde(default)]
    content_gap_analysis: Option<String>,
    #[serde(default)]
    conversion_booster: Option<String>,
}

/// Action items arrive either as bare strings or as objects
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawAction {
    Text(String),
    Item {
        #[serde(alias = "action", alias = "name")]
        title: String,
        #[serde(default, alias = "details")]
        description: String,
        #[serde(default)]
        impact: Option<String>,
    },
}

impl RawAnalysis {
    fn normalize(self) -> Result<AnalysisResultData, AnalysisError> {
        let priority = Priority::parse(&self.priority).ok_or_else(|| {
            AnalysisError::MalformedResponse(format!("unknown priority '{}'", self.priority))
        })?;

        let suggested_actions = self
            .suggested_actions
            .into_iter()
            .map(RawAction::normalize)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(AnalysisResultData {
            url: self.url,
            monetization_score: coerce_score(&self.monetization_score)?,
            justification: self.justification,
            priority,
            suggested_actions,
            affiliate_niche: non_blank(self.affiliate_niche),
            content_gap_analysis: non_blank(self.content_gap_analysis),
            conversion_booster: non_blank(self.conversion_booster),
        })
    }
}

impl RawAction {
    fn normalize(self) -> Result<SuggestedAction, AnalysisError> {
        let (title, description, impact) = match self {
            Self::Text(text) => (text, String::new(), None),
            Self::Item {
                title,
                description,
                impact,
            } => (title, description, impact),
        };

        let title = title.trim().to_string();
        if title.is_empty() {
            return Err(AnalysisError::MalformedResponse(
                "suggested action without a title".to_string(),
            ));
        }

        let impact = match impact.as_deref() {
            None => Impact::Medium,
            Some(label) => Impact::parse(label).ok_or_else(|| {
                AnalysisError::MalformedResponse(format!("unknown action impact '{}'", label))
            })?,
        };

        Ok(SuggestedAction {
            title,
            description: description.trim().to_string(),
            impact,
        })
    }
}

/// Coerces a score to an integer in 1..=100
///
/// Accepts integers, floats (rounded) and numeric strings such as `"85"` or `"85%"`.
fn coerce_score(value: &Value) -> Result<u8, AnalysisError> {
    let raw = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    };

    match raw {
        Some(score) if score.is_finite() => {
            let clamped = score.round().clamp(1.0, 100.0);
            if clamped != score.round() {
                tracing::debug!("Clamped out-of-range monetization score {}", score);
            }
            Ok(clamped as u8)
        }
        _ => Err(AnalysisError::MalformedResponse(format!(
            "monetization_score must be a number, got {}",
            value
        ))),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
