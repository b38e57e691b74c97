/// LLM Client: the single point of entry for all model calls in the SDR API.
///
/// ARCHITECTURAL RULE: prospect research, email drafting, and meeting emails all
/// go through this module. Nothing else talks to the Anthropic API.
use std::time::Duration;

use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Sampling temperature for outreach copy.
pub const DRAFTING_TEMPERATURE: f32 = 0.7;
/// Sampling temperature for research and scheduling, where variety matters less.
pub const PRECISE_TEMPERATURE: f32 = 0.3;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

impl LlmError {
    /// True when the request never produced a usable model response
    /// (network failure, non-2xx status, exhausted retries).
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            LlmError::Http(_) | LlmError::Api { .. } | LlmError::RateLimited { .. }
        )
    }
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

/// The single LLM client shared through `AppState`.
/// Wraps the Anthropic Messages API with retry logic and structured output helpers.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    max_tokens: u32,
}

impl LlmClient {
    pub fn new(api_key: String, max_tokens: u32) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()?,
            api_key,
            max_tokens,
        })
    }

    /// Makes a raw call to the Claude API, returning the full response object.
    /// Retries on 429 (rate limit) and 5xx errors with exponential backoff.
    pub async fn call(
        &self,
        prompt: &str,
        system: &str,
        temperature: f32,
    ) -> Result<LlmResponse, LlmError> {
        let request_body = AnthropicRequest {
            model: MODEL,
            max_tokens: self.max_tokens,
            temperature,
            system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };

        let mut last_error = LlmError::RateLimited {
            retries: MAX_RETRIES,
        };

        for attempt in 0..MAX_RETRIES {
            if let Some(delay) = retry_delay(attempt) {
                warn!(
                    "LLM call attempt {attempt} failed ({last_error}), retrying after {}ms",
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            match self.send_once(&request_body).await {
                Ok(response) => {
                    debug!(
                        "LLM call succeeded: input_tokens={}, output_tokens={}",
                        response.usage.input_tokens, response.usage.output_tokens
                    );
                    return Ok(response);
                }
                Err(err) if is_retryable(&err) => last_error = err,
                Err(err) => return Err(err),
            }
        }

        Err(last_error)
    }

    async fn send_once(&self, body: &AnthropicRequest<'_>) -> Result<LlmResponse, LlmError> {
        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let raw = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<AnthropicError>(&raw)
            .map(|e| e.error.message)
            .unwrap_or(raw);
        Err(LlmError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// Convenience method that calls the LLM and deserializes the text response as JSON.
    /// The prompt must instruct the model to return valid JSON.
    pub async fn call_json<T: DeserializeOwned>(
        &self,
        prompt: &str,
        system: &str,
        temperature: f32,
    ) -> Result<T, LlmError> {
        let response = self.call(prompt, system, temperature).await?;

        let text = response.text().ok_or(LlmError::EmptyContent)?;
        parse_json_text(text)
    }
}

/// Network failures, 429s and 5xx responses are retried; other API errors are final.
fn is_retryable(err: &LlmError) -> bool {
    match err {
        LlmError::Http(_) => true,
        LlmError::Api { status, .. } => *status == 429 || *status >= 500,
        _ => false,
    }
}

/// Exponential backoff before attempt n: none, 1s, 2s, 4s, ...
fn retry_delay(attempt: u32) -> Option<Duration> {
    (attempt > 0).then(|| Duration::from_millis(1000 * (1 << (attempt - 1))))
}

/// Deserializes model output as JSON after stripping optional code fences.
pub fn parse_json_text<T: DeserializeOwned>(text: &str) -> Result<T, LlmError> {
    let text = strip_json_fences(text);
    if text.is_empty() {
        return Err(LlmError::EmptyContent);
    }
    serde_json::from_str(text).map_err(LlmError::Parse)
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_parse_json_text_fenced_object() {
        #[derive(Deserialize)]
        struct Email {
            subject: String,
        }
        let email: Email = parse_json_text("```json\n{\"subject\": \"Hi\"}\n```").unwrap();
        assert_eq!(email.subject, "Hi");
    }

    #[test]
    fn test_parse_json_text_prose_is_parse_error() {
        let result: Result<serde_json::Value, _> = parse_json_text("Sure! Here is your email:");
        assert!(matches!(result, Err(LlmError::Parse(_))));
    }

    #[test]
    fn test_parse_json_text_blank_is_empty_content() {
        let result: Result<serde_json::Value, _> = parse_json_text("   ");
        assert!(matches!(result, Err(LlmError::EmptyContent)));
    }

    #[test]
    fn test_retry_delay_backoff() {
        assert_eq!(retry_delay(0), None);
        assert_eq!(retry_delay(1), Some(Duration::from_secs(1)));
        assert_eq!(retry_delay(2), Some(Duration::from_secs(2)));
        assert_eq!(retry_delay(3), Some(Duration::from_secs(4)));
    }

    #[test]
    fn test_client_errors_are_not_retried() {
        let bad_request = LlmError::Api {
            status: 400,
            message: "max_tokens too large".to_string(),
        };
        assert!(!is_retryable(&bad_request));
        assert!(is_retryable(&LlmError::Api {
            status: 529,
            message: "overloaded".to_string()
        }));
        assert!(!is_retryable(&LlmError::EmptyContent));
    }

    #[test]
    fn test_transport_classification() {
        assert!(LlmError::RateLimited { retries: 3 }.is_transport());
        assert!(LlmError::Api {
            status: 500,
            message: "overloaded".to_string()
        }
        .is_transport());
        assert!(!LlmError::EmptyContent.is_transport());
        let parse_err = serde_json::from_str::<serde_json::Value>("nope").unwrap_err();
        assert!(!LlmError::Parse(parse_err).is_transport());
    }
}
