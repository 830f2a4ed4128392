//! Generic chat completion requests
//!
//! Two wire shapes share this module. The `chat/completions` shape carries the
//! system instruction as the first message and asks for JSON mode; the `messages`
//! shape carries it in a top-level `system` field and has no JSON mode, so the
//! user prompt asks for a bare object instead.

use crate::provider::prompt::{user_prompt, SYSTEM_INSTRUCTION};
use serde::Serialize;

/// Version header value required by the `messages` API
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Output token cap for `messages` requests
pub const MAX_TOKENS: u32 = 4096;

#[derive(Debug, Serialize)]
pub struct Message {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

/// `chat/completions` request body
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<Message>,
    pub response_format: ResponseFormat,
}

impl<'a> ChatCompletionRequest<'a> {
    pub fn new(model: &'a str, url: &str) -> Self {
        Self {
            model,
            messages: vec![
                Message {
                    role: "system",
                    content: SYSTEM_INSTRUCTION.to_string(),
                },
                Message {
                    role: "user",
                    content: user_prompt(url, false),
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
        }
    }
}

/// `messages` request body
#[derive(Debug, Serialize)]
pub struct MessagesRequest<'a> {
    pub model: &'a str,
    pub max_tokens: u32,
    pub system: &'static str,
    pub messages: Vec<Message>,
}

impl<'a> MessagesRequest<'a> {
    pub fn new(model: &'a str, url: &str) -> Self {
        Self {
            model,
            max_tokens: MAX_TOKENS,
            system: SYSTEM_INSTRUCTION,
            messages: vec![Message {
                role: "user",
                content: user_prompt(url, true),
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_completion_body() {
        let body = serde_json::to_value(ChatCompletionRequest::new(
            "gpt-4-turbo",
            "https://example.com/a",
        ))
        .unwrap();

        assert_eq!(body["model"], "gpt-4-turbo");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_messages_body() {
        let body = serde_json::to_value(MessagesRequest::new(
            "claude-3-haiku-20240307",
            "https://example.com/a",
        ))
        .unwrap();

        assert_eq!(body["max_tokens"], 4096);
        assert_eq!(body["system"], SYSTEM_INSTRUCTION);
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert!(body["messages"][0]["content"]
            .as_str()
            .unwrap()
            .contains("Respond ONLY with the JSON object"));
        assert!(body.get("response_format").is_none());
    }
}
