//! Schema-constrained `generateContent` requests

use crate::provider::prompt::{analysis_schema, user_prompt, SYSTEM_INSTRUCTION};
use serde_json::{json, Value};

/// Sampling temperature for structured generation
const TEMPERATURE: f64 = 0.2;

/// Builds the `generateContent` URL for a model under the configured base
pub fn endpoint(base: &str, model: &str) -> String {
    format!(
        "{}/models/{}:generateContent",
        base.trim_end_matches('/'),
        model
    )
}

/// Builds the request body, constraining the reply to [`analysis_schema`]
pub fn request_body(url: &str) -> Value {
    json!({
        "systemInstruction": {
            "parts": [{ "text": SYSTEM_INSTRUCTION }]
        },
        "contents": [{
            "role": "user",
            "parts": [{ "text": user_prompt(url, false) }]
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": analysis_schema(),
            "temperature": TEMPERATURE
        }
    })
}
