/// LLM Client: the single point of entry for all model calls in the scorer.
///
/// ARCHITECTURAL RULE: No other module may call the Anthropic API directly.
/// All LLM interactions MUST go through this module.
///
/// Model: claude-sonnet-4-5 (hardcoded, not configurable)
use std::time::Duration;

use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;

const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for all LLM calls.
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 1800;
const TEMPERATURE: f32 = 0.2;
const BASE_BACKOFF_MS: u64 = 1000;
const MAX_BACKOFF_MS: u64 = 8000;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Gave up after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("LLM response contained no JSON object")]
    NoJsonObject,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Extracts the text content from the first text block.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// Wraps the Anthropic Messages API with a request timeout, bounded retries
/// and a structured-output helper.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    api_url: String,
    max_attempts: u32,
}

impl LlmClient {
    pub fn new(config: &Config) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(config.llm_timeout_secs))
                .build()?,
            api_key: config.anthropic_api_key.clone(),
            api_url: config.anthropic_api_url.clone(),
            max_attempts: config.llm_max_retries.max(1),
        })
    }

    /// Makes a raw call to the Claude API, returning the full response object.
    /// Retries transport errors, 429 and 5xx with exponential backoff.
    pub async fn call(&self, prompt: &str, system: &str) -> Result<LlmResponse, LlmError> {
        let request_body = AnthropicRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..self.max_attempts {
            if attempt > 0 {
                let delay = backoff_delay(attempt);
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&self.api_url)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .header("content-type", "application/json")
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<AnthropicError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let llm_response: LlmResponse = response.json().await?;

            debug!(
                "LLM call succeeded: input_tokens={}, output_tokens={}",
                llm_response.usage.input_tokens, llm_response.usage.output_tokens
            );

            return Ok(llm_response);
        }

        Err(last_error.unwrap_or(LlmError::RetriesExhausted {
            attempts: self.max_attempts,
        }))
    }

    /// Calls the LLM and deserializes the first JSON object found in its text.
    /// Prose or code fences around the object are ignored.
    pub async fn call_json<T: DeserializeOwned>(
        &self,
        prompt: &str,
        system: &str,
    ) -> Result<T, LlmError> {
        let response = self.call(prompt, system).await?;

        let text = response.text().ok_or(LlmError::EmptyContent)?;
        debug!("LLM raw text: {}", truncate_chars(text, 300));

        let object = extract_json_object(text).ok_or(LlmError::NoJsonObject)?;

        serde_json::from_str(object).map_err(LlmError::Parse)
    }
}

/// Exponential backoff before retry `attempt` (1-based): 1s, 2s, 4s, then 8s.
fn backoff_delay(attempt: u32) -> Duration {
    let factor = 1u64
        .checked_shl(attempt.saturating_sub(1))
        .unwrap_or(u64::MAX);
    Duration::from_millis(BASE_BACKOFF_MS.saturating_mul(factor).min(MAX_BACKOFF_MS))
}

/// Returns the first balanced `{ ... }` object in `text`.
///
/// Braces inside JSON string literals (including escaped quotes) are not
/// counted. `None` if no object opens or the first one never closes.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn client_for(server: &mockito::ServerGuard, max_retries: u32) -> LlmClient {
        let config = Config::for_tests(&format!("{}/v1/messages", server.url()), max_retries);
        LlmClient::new(&config).unwrap()
    }

    fn message_body(text: &str) -> String {
        json!({
            "content": [{"type": "text", "text": text}],
            "usage": {"input_tokens": 12, "output_tokens": 34}
        })
        .to_string()
    }

    #[test]
    fn test_extract_plain_object() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(extract_json_object(input), Some(input));
    }

    #[test]
    fn test_extract_object_wrapped_in_prose_and_fences() {
        let input = "Here you go:\n```json\n{\"a\": {\"b\": 1}}\n```\nThanks!";
        assert_eq!(extract_json_object(input), Some("{\"a\": {\"b\": 1}}"));
    }

    #[test]
    fn test_extract_takes_first_object_only() {
        let input = "{\"first\": 1} and {\"second\": 2}";
        assert_eq!(extract_json_object(input), Some("{\"first\": 1}"));
    }

    #[test]
    fn test_extract_ignores_braces_inside_strings() {
        let input = r#"{"note": "use {braces} and \"quotes\" }", "n": 1} trailing"#;
        assert_eq!(
            extract_json_object(input),
            Some(r#"{"note": "use {braces} and \"quotes\" }", "n": 1}"#)
        );
    }

    #[test]
    fn test_extract_none_without_braces() {
        assert_eq!(extract_json_object("no json here"), None);
    }

    #[test]
    fn test_extract_none_when_unbalanced() {
        assert_eq!(extract_json_object("{\"matchedSkills\": [\"SQL\""), None);
    }

    #[test]
    fn test_backoff_doubles_then_caps() {
        assert_eq!(backoff_delay(1), Duration::from_secs(1));
        assert_eq!(backoff_delay(2), Duration::from_secs(2));
        assert_eq!(backoff_delay(3), Duration::from_secs(4));
        assert_eq!(backoff_delay(4), Duration::from_secs(8));
        assert_eq!(backoff_delay(20), Duration::from_secs(8));
        assert_eq!(backoff_delay(200), Duration::from_secs(8));
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("ééé", 2), "éé");
        assert_eq!(truncate_chars("ab", 5), "ab");
    }

    #[tokio::test]
    async fn test_call_json_parses_embedded_object() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .match_header("x-api-key", "test-key")
            .match_header("anthropic-version", ANTHROPIC_VERSION)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(message_body("Sure! {\"ok\": true}"))
            .create_async()
            .await;

        let value: Value = client_for(&server, 1)
            .call_json("prompt", "system")
            .await
            .unwrap();

        assert_eq!(value, json!({"ok": true}));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .with_status(400)
            .with_body(r#"{"error": {"message": "bad request"}}"#)
            .expect(1)
            .create_async()
            .await;

        let err = client_for(&server, 3).call("p", "s").await.unwrap_err();

        match err {
            LlmError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "bad request");
            }
            other => panic!("unexpected error: {other}"),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error_is_retried_until_attempts_run_out() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .with_status(503)
            .with_body("overloaded")
            .expect(2)
            .create_async()
            .await;

        let err = client_for(&server, 2).call("p", "s").await.unwrap_err();

        assert!(matches!(err, LlmError::Api { status: 503, .. }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_call_json_without_object_fails() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/messages")
            .with_status(200)
            .with_body(message_body("I cannot help with that."))
            .create_async()
            .await;

        let err = client_for(&server, 1)
            .call_json::<Value>("p", "s")
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::NoJsonObject));
    }
}
