//! Integration tests for analysis runs
//!
//! These tests use wiremock to stand in for every AI provider and for the
//! sitemap proxies, and test the full sitemap-to-report cycle end-to-end.

use affiliate_scout::config::{
    load_config, Config, DispatchConfig, EndpointConfig, SitemapConfig, WorkerCredential,
};
use affiliate_scout::dispatch::analyze_urls;
use affiliate_scout::sitemap::{build_sitemap_client, fetch_sitemap, parse_sitemap};
use affiliate_scout::state::{OutcomeStatus, Priority};
use affiliate_scout::{FetchError, ProviderKind};
use serde_json::json;
use std::io::Write;
use tempfile::NamedTempFile;
use wiremock::matchers::{bearer_token, body_partial_json, header, method, path, query_param};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

/// Matches requests whose body mentions the given text
struct BodyContains(String);

impl Match for BodyContains {
    fn matches(&self, request: &Request) -> bool {
        String::from_utf8_lossy(&request.body).contains(&self.0)
    }
}

/// Analysis JSON as a model would write it
fn analysis_json(url: &str, score: u8) -> String {
    json!({
        "url": url,
        "monetization_score": score,
        "justification": "Product review with strong buyer intent.",
        "priority": "High",
        "suggested_actions": [
            {"title": "Add comparison table", "description": "Compare the top picks", "impact": "High"},
            {"title": "Add a buying guide", "description": "Cover sizing", "impact": "Medium"},
            "Link to current deals"
        ],
        "affiliate_niche": "outdoor gear",
        "content_gap_analysis": "No price comparison",
        "conversion_booster": "Sticky buy button"
    })
    .to_string()
}

fn chat_reply(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}, "finish_reason": "stop"}]
    })
}

fn messages_reply(text: &str) -> serde_json::Value {
    json!({
        "id": "msg_1",
        "type": "message",
        "role": "assistant",
        "content": [{"type": "text", "text": text}]
    })
}

fn gemini_reply(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]
    })
}

/// Creates a test configuration pointing every provider at the mock server
fn create_test_config(base_url: &str, workers: Vec<WorkerCredential>, concurrency: u32) -> Config {
    Config {
        dispatch: DispatchConfig {
            concurrency,
            request_timeout_secs: 5,
            max_attempts: 3,
            backoff_base_ms: 1, // Very short for testing
            max_jitter_ms: 0,
        },
        sitemap: SitemapConfig {
            proxies: vec![String::new()],
            fetch_timeout_secs: 5,
        },
        endpoints: EndpointConfig {
            gemini: format!("{}/v1beta", base_url),
            openai: format!("{}/v1/chat/completions", base_url),
            claude: format!("{}/v1/messages", base_url),
            openrouter: format!("{}/api/v1/chat/completions", base_url),
            groq: format!("{}/openai/v1/chat/completions", base_url),
        },
        workers,
        gemini_api_key: Some("gemini-test-key".to_string()),
    }
}

fn openai_worker() -> WorkerCredential {
    WorkerCredential::new("openai", ProviderKind::OpenAi, Some("sk-test".to_string()))
}

fn claude_worker() -> WorkerCredential {
    WorkerCredential::new("claude", ProviderKind::Claude, Some("claude-key".to_string()))
}

#[tokio::test]
async fn test_openai_wire_shape_and_fenced_reply() {
    let mock_server = MockServer::start().await;
    let url = "https://shop.example.com/best-tents".to_string();

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(bearer_token("sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4-turbo",
            "response_format": {"type": "json_object"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(&format!(
            "```json\n{}\n```",
            analysis_json(&url, 88)
        ))))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), vec![openai_worker()], 2);
    let report = analyze_urls(&config, &[url.clone()]).await.unwrap();

    let data = report.results[0].outcome.data().expect("analysis should succeed");
    assert_eq!(data.url, url);
    assert_eq!(data.monetization_score, 88);
    assert_eq!(data.priority, Priority::High);
    assert_eq!(data.suggested_actions.len(), 3);
    assert_eq!(data.suggested_actions[2].title, "Link to current deals");
    assert_eq!(data.affiliate_niche.as_deref(), Some("outdoor gear"));
}

#[tokio::test]
async fn test_claude_wire_shape() {
    let mock_server = MockServer::start().await;
    let url = "https://shop.example.com/kayaks".to_string();

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "claude-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "model": "claude-3-haiku-20240307",
            "max_tokens": 4096
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(messages_reply(&analysis_json(&url, 64))))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), vec![claude_worker()], 1);
    let report = analyze_urls(&config, &[url]).await.unwrap();

    assert_eq!(report.results[0].status(), OutcomeStatus::Success);
    assert_eq!(report.results[0].outcome.data().unwrap().monetization_score, 64);
}

#[tokio::test]
async fn test_gemini_wire_shape_uses_ambient_key() {
    let mock_server = MockServer::start().await;
    let url = "https://shop.example.com/stoves".to_string();

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
        .and(header("x-goog-api-key", "gemini-test-key"))
        .and(body_partial_json(json!({
            "generationConfig": {"responseMimeType": "application/json"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply(&analysis_json(&url, 42))))
        .expect(1)
        .mount(&mock_server)
        .await;

    let gemini = WorkerCredential::new("gemini", ProviderKind::Gemini, None);
    let config = create_test_config(&mock_server.uri(), vec![gemini], 1);
    let report = analyze_urls(&config, &[url]).await.unwrap();

    assert_eq!(report.results[0].outcome.data().unwrap().monetization_score, 42);
}

#[tokio::test]
async fn test_groq_sends_configured_model() {
    let mock_server = MockServer::start().await;
    let url = "https://shop.example.com/lamps".to_string();

    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .and(bearer_token("gsk-test"))
        .and(body_partial_json(json!({"model": "llama3-70b-8192"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(&analysis_json(&url, 71))))
        .expect(1)
        .mount(&mock_server)
        .await;

    let groq = WorkerCredential::new("groq", ProviderKind::Groq, Some("gsk-test".to_string()))
        .with_model("llama3-70b-8192");
    let config = create_test_config(&mock_server.uri(), vec![groq], 1);
    let report = analyze_urls(&config, &[url]).await.unwrap();

    assert_eq!(report.succeeded(), 1);
}

#[tokio::test]
async fn test_unauthorized_is_attempted_once() {
    let mock_server = MockServer::start().await;
    let url = "https://shop.example.com/a".to_string();

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_string(r#"{"error":{"message":"Incorrect API key provided"}}"#),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), vec![openai_worker()], 1);
    let report = analyze_urls(&config, &[url]).await.unwrap();

    let message = report.results[0].outcome.error().unwrap();
    assert!(message.starts_with("Failed to analyze https://shop.example.com/a. Reason:"));
    assert!(message.contains("401"));
    assert!(message.contains("Incorrect API key provided"));
}

#[tokio::test]
async fn test_rate_limit_then_success() {
    let mock_server = MockServer::start().await;
    let url = "https://shop.example.com/b".to_string();

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(messages_reply(&analysis_json(&url, 90))))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), vec![claude_worker()], 1);
    let report = analyze_urls(&config, &[url]).await.unwrap();

    assert_eq!(report.results[0].status(), OutcomeStatus::Success);
}

#[tokio::test]
async fn test_server_error_exhausts_three_attempts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .expect(3)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), vec![openai_worker()], 1);
    let report = analyze_urls(&config, &["https://shop.example.com/c".to_string()])
        .await
        .unwrap();

    assert_eq!(report.failed(), 1);
    assert!(report.results[0].outcome.error().unwrap().contains("503"));
}

#[tokio::test]
async fn test_request_timeout_is_retried() {
    let mock_server = MockServer::start().await;
    let url = "https://shop.example.com/slow".to_string();

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_reply(&analysis_json(&url, 70)))
                .set_delay(std::time::Duration::from_secs(3)),
        )
        .expect(3)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri(), vec![openai_worker()], 1);
    config.dispatch.request_timeout_secs = 1;

    let report = analyze_urls(&config, &[url.clone()]).await.unwrap();

    assert_eq!(mock_server.received_requests().await.unwrap().len(), 3);
    assert_eq!(report.failed(), 1);
    let error = report.results[0].outcome.error().unwrap();
    assert!(error.starts_with(&format!("Failed to analyze {}", url)));
    assert!(error.contains("timed out after 1 seconds"));
}

#[tokio::test]
async fn test_invalid_json_fails_only_its_url() {
    let mock_server = MockServer::start().await;
    let urls: Vec<String> = (1..=3)
        .map(|i| format!("https://shop.example.com/item-{}", i))
        .collect();

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(BodyContains("item-2".to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("Sorry, I cannot help with that.")))
        .mount(&mock_server)
        .await;

    for url in [&urls[0], &urls[2]] {
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(BodyContains(url.clone()))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(&analysis_json(url, 55))))
            .mount(&mock_server)
            .await;
    }

    let config = create_test_config(&mock_server.uri(), vec![openai_worker()], 3);
    let report = analyze_urls(&config, &urls).await.unwrap();

    assert_eq!(report.results[0].status(), OutcomeStatus::Success);
    assert_eq!(report.results[2].status(), OutcomeStatus::Success);
    let message = report.results[1].outcome.error().unwrap();
    assert!(message.contains("API returned invalid JSON"));
}

#[tokio::test]
async fn test_sitemap_proxy_fallback() {
    let mock_server = MockServer::start().await;
    let sitemap_url = format!("{}/sitemap.xml", mock_server.uri());
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://shop.example.com/one</loc></url>
  <url><loc>https://shop.example.com/two</loc></url>
</urlset>"#;

    // Direct fetch is blocked
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/proxy"))
        .and(query_param("url", sitemap_url.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string(xml))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = SitemapConfig {
        proxies: vec![String::new(), format!("{}/proxy?url=", mock_server.uri())],
        fetch_timeout_secs: 5,
    };
    let client = build_sitemap_client(&config).unwrap();
    let body = fetch_sitemap(&client, &sitemap_url, &config.proxies)
        .await
        .unwrap();

    assert_eq!(
        parse_sitemap(&body).unwrap(),
        vec!["https://shop.example.com/one", "https://shop.example.com/two"]
    );
}

#[tokio::test]
async fn test_sitemap_all_proxies_fail() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&mock_server)
        .await;

    let proxies = vec![String::new(), format!("{}/proxy?url=", mock_server.uri())];
    let client = build_sitemap_client(&SitemapConfig::default()).unwrap();
    let err = fetch_sitemap(
        &client,
        &format!("{}/sitemap.xml", mock_server.uri()),
        &proxies,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, FetchError::AllProxiesFailed { .. }));
    assert_eq!(
        err.to_string(),
        "Sitemap fetch failed. Last attempt error: HTTP error! status: 503"
    );
}

#[tokio::test]
async fn test_full_run_from_config_file() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let xml = (1..=6)
        .map(|i| format!("<url><loc>https://shop.example.com/p{}</loc></url>", i))
        .collect::<String>();
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!("<urlset>{}</urlset>", xml)))
        .mount(&mock_server)
        .await;

    for i in 1..=6 {
        let url = format!("https://shop.example.com/p{}", i);
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(BodyContains(format!("{}\"", url)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(chat_reply(&analysis_json(&url, 10 * i as u8)))
                    .set_delay(std::time::Duration::from_millis(60 - 10 * i as u64)),
            )
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(BodyContains(format!("{}.", url)))
            .respond_with(ResponseTemplate::new(200).set_body_json(messages_reply(&analysis_json(&url, 10 * i as u8))))
            .mount(&mock_server)
            .await;
    }

    let toml = format!(
        r#"
[dispatch]
concurrency = 3
backoff-base-ms = 1
max-jitter-ms = 0

[sitemap]
proxies = [""]

[endpoints]
openai = "{base}/v1/chat/completions"
claude = "{base}/v1/messages"

[[worker]]
id = "openai-main"
provider = "openai"
api-key = "sk-test"

[[worker]]
id = "claude-main"
provider = "claude"
api-key = "claude-key"
"#,
        base = base_url
    );
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(toml.as_bytes()).unwrap();
    file.flush().unwrap();

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.workers.len(), 2);

    let client = build_sitemap_client(&config.sitemap).unwrap();
    let body = fetch_sitemap(
        &client,
        &format!("{}/sitemap.xml", base_url),
        &config.sitemap.proxies,
    )
    .await
    .unwrap();
    let urls = parse_sitemap(&body).unwrap();
    assert_eq!(urls.len(), 6);

    let report = analyze_urls(&config, &urls).await.unwrap();

    assert_eq!(report.progress.processed, 6);
    assert_eq!(report.progress.total, 6);
    assert_eq!(report.succeeded(), 6);
    for (i, result) in report.results.iter().enumerate() {
        assert_eq!(result.url, urls[i]);
        let data = result.outcome.data().unwrap();
        assert_eq!(data.url, urls[i]);
        assert_eq!(data.monetization_score, 10 * (i as u8 + 1));
    }

    // Round-robin assignment sends half the pages to each provider
    let requests = mock_server.received_requests().await.unwrap();
    let chat_calls = requests
        .iter()
        .filter(|r| r.url.path() == "/v1/chat/completions")
        .count();
    let messages_calls = requests
        .iter()
        .filter(|r| r.url.path() == "/v1/messages")
        .count();
    assert_eq!(chat_calls, 3);
    assert_eq!(messages_calls, 3);
}
