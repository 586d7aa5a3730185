//! OpenAI-compatible chat-completions client, Groq-hosted by default.
//!
//! Every request carries a hard timeout; 429s, 5xx responses, and
//! transport errors are retried a bounded number of times with
//! exponential backoff before surfacing. The assistant's text is returned
//! verbatim; no post-processing of the completion happens here.

use std::thread;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::error::{LlmError, Result};

/// Default chat-completions endpoint base (Groq's OpenAI-compatible API).
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Generation client settings.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Bearer credential for the service.
    pub api_key: String,
    /// Model identifier, e.g. `llama-3.1-8b-instant`.
    pub model: String,
    /// Endpoint base; `/chat/completions` is appended.
    pub base_url: String,
    /// Hard deadline for one generation request.
    pub timeout: Duration,
    /// Total attempts for transient failures (429, 5xx, transport).
    pub max_attempts: usize,
    /// Sampling temperature.
    pub temperature: f32,
    /// Completion token budget.
    pub max_tokens: usize,
}

impl ChatConfig {
    /// Config with defaults for everything except credential and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            max_attempts: 3,
            temperature: 0.7,
            max_tokens: 1024,
        }
    }
}

/// Blocking chat client. Cheap to reuse; the underlying connection pool is
/// shared across calls and safe for concurrent use through `&self`.
#[derive(Debug)]
pub struct ChatClient {
    client: Client,
    endpoint: String,
    model: String,
    temperature: f32,
    max_tokens: usize,
    max_attempts: usize,
}

impl ChatClient {
    /// Builds the client. Fails with [`LlmError::MissingApiKey`] when the
    /// credential is absent, before any request is attempted.
    pub fn new(config: ChatConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(LlmError::MissingApiKey);
        }

        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", config.api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth).map_err(|_| LlmError::InvalidApiKey)?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/chat/completions",
                config.base_url.trim_end_matches('/')
            ),
            model: config.model,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_attempts: config.max_attempts.max(1),
        })
    }

    /// Sends one system+user exchange and returns the assistant text
    /// unmodified.
    pub fn complete(&self, system: &str, user: &str) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };

        let mut attempt = 0usize;
        loop {
            let response = self.client.post(&self.endpoint).json(&body).send();
            match response {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        let parsed: ChatResponse = resp.json()?;
                        let content = parsed
                            .choices
                            .into_iter()
                            .next()
                            .map(|choice| choice.message.content)
                            .filter(|content| !content.trim().is_empty())
                            .ok_or(LlmError::EmptyCompletion)?;
                        return Ok(content);
                    }

                    let body_text = resp
                        .text()
                        .unwrap_or_else(|_| "<body unavailable>".to_string());
                    if should_retry(status) && attempt + 1 < self.max_attempts {
                        attempt += 1;
                        tracing::warn!(%status, attempt, "generation call failed, retrying");
                        thread::sleep(backoff(attempt));
                        continue;
                    }
                    return Err(LlmError::Api {
                        status: status.as_u16(),
                        body: body_text,
                    });
                }
                Err(err) => {
                    if is_retryable(&err) && attempt + 1 < self.max_attempts {
                        attempt += 1;
                        tracing::warn!(error = %err, attempt, "generation transport error, retrying");
                        thread::sleep(backoff(attempt));
                        continue;
                    }
                    return Err(err.into());
                }
            }
        }
    }
}

fn should_retry(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn is_retryable(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

fn backoff(attempt: usize) -> Duration {
    let capped = attempt.min(5) as u32;
    Duration::from_millis(500 * (1 << capped))
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: usize,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_api_key_fails_fast() {
        let err = ChatClient::new(ChatConfig::new("", "llama-3.1-8b-instant")).unwrap_err();
        assert!(matches!(err, LlmError::MissingApiKey));

        let err = ChatClient::new(ChatConfig::new("   ", "llama-3.1-8b-instant")).unwrap_err();
        assert!(matches!(err, LlmError::MissingApiKey));
    }

    #[test]
    fn endpoint_strips_trailing_slash() {
        let mut config = ChatConfig::new("key", "model");
        config.base_url = "https://example.test/v1/".into();
        let client = ChatClient::new(config).unwrap();
        assert_eq!(client.endpoint, "https://example.test/v1/chat/completions");
    }

    #[test]
    fn request_serializes_to_openai_wire_format() {
        let body = ChatRequest {
            model: "llama-3.1-8b-instant",
            temperature: 0.7,
            max_tokens: 1024,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "preamble",
                },
                ChatMessage {
                    role: "user",
                    content: "query",
                },
            ],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "llama-3.1-8b-instant");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "query");
    }

    #[test]
    fn response_parses_first_choice() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"1. K-On!"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content, "1. K-On!");
    }

    #[test]
    fn retry_policy_covers_rate_limits_and_server_errors() {
        assert!(should_retry(StatusCode::TOO_MANY_REQUESTS));
        assert!(should_retry(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(!should_retry(StatusCode::UNAUTHORIZED));
        assert!(!should_retry(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn backoff_grows_and_caps() {
        assert!(backoff(1) < backoff(2));
        assert!(backoff(2) < backoff(3));
        assert_eq!(backoff(5), backoff(9));
    }
}
