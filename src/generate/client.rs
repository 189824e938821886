//! Client for OpenAI-compatible chat completion services.
//!
//! Sends one non-streaming request per prompt:
//! POST {base_url}/chat/completions

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize};
use tokio::runtime::Runtime;
use tracing::{debug, error};

use super::error::make_snippet;
use super::{GenerationError, TextGenerator};
use crate::config::LlmConfig;

/// Blocking chat client backed by its own tokio runtime.
pub struct ChatClient {
    http: reqwest::Client,
    runtime: Runtime,
    url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    timeout_seconds: u64,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatClient {
    /// Build a client from configuration, reading the API key from the
    /// environment variable the configuration names.
    pub fn from_config(config: &LlmConfig) -> Result<Self, GenerationError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| GenerationError::MissingApiKey(config.api_key_env.clone()))?;
        Self::with_api_key(config, &api_key)
    }

    /// Build a client with an explicit API key.
    pub fn with_api_key(config: &LlmConfig, api_key: &str) -> Result<Self, GenerationError> {
        let mut headers = header::HeaderMap::new();
        let bearer = header::HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
            .map_err(|e| GenerationError::InvalidConfig(format!("invalid API key header: {e}")))?;
        headers.insert(header::AUTHORIZATION, bearer);
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let http = reqwest::Client::builder()
            .user_agent(concat!("docsmith/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .build()?;
        let runtime = Runtime::new().map_err(GenerationError::Runtime)?;

        debug!(
            model = %config.model,
            base_url = %config.base_url,
            timeout_secs = config.timeout_seconds,
            "chat client initialized"
        );

        Ok(Self {
            http,
            runtime,
            url: completions_url(&config.base_url),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout_seconds: config.timeout_seconds,
        })
    }

    /// Endpoint the client posts to.
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn request(&self, prompt: &str) -> Result<String, GenerationError> {
        let started = Instant::now();
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);
            error!(
                %status,
                url = %self.url,
                %snippet,
                latency_ms = started.elapsed().as_millis(),
                "chat completion returned non-success status"
            );
            return Err(GenerationError::Status {
                status: status.as_u16(),
                snippet,
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| self.classify(e))?;
        debug!(
            latency_ms = started.elapsed().as_millis(),
            "chat completion received"
        );
        first_content(parsed).ok_or(GenerationError::EmptyResponse)
    }

    fn classify(&self, err: reqwest::Error) -> GenerationError {
        if err.is_timeout() {
            GenerationError::Timeout(self.timeout_seconds)
        } else {
            GenerationError::Network(err)
        }
    }
}

impl TextGenerator for ChatClient {
    fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        self.runtime.block_on(self.request(prompt))
    }
}

fn completions_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim().trim_end_matches('/'))
}

fn first_content(response: ChatResponse) -> Option<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completions_url() {
        assert_eq!(
            completions_url("https://api.groq.com/openai/v1/"),
            "https://api.groq.com/openai/v1/chat/completions"
        );
        assert_eq!(
            completions_url("http://localhost:8080/v1"),
            "http://localhost:8080/v1/chat/completions"
        );
    }

    #[test]
    fn test_first_content() {
        let parsed: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"Add numbers."}}]}"#,
        )
        .unwrap();
        assert_eq!(first_content(parsed).as_deref(), Some("Add numbers."));

        let empty: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(first_content(empty).is_none());

        let blank: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":"  "}}]}"#).unwrap();
        assert!(first_content(blank).is_none());
    }

    #[test]
    fn test_request_body_shape() {
        let body = ChatRequest {
            model: "llama-3.1-8b-instant",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
            temperature: 0.2,
            max_tokens: 512,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["max_tokens"], 512);
    }

    #[test]
    fn test_missing_api_key() {
        let config = LlmConfig {
            api_key_env: "DOCSMITH_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..LlmConfig::default()
        };
        match ChatClient::from_config(&config) {
            Err(GenerationError::MissingApiKey(var)) => {
                assert_eq!(var, "DOCSMITH_TEST_KEY_THAT_IS_NEVER_SET")
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("client built without a key"),
        }
    }

    #[test]
    fn test_with_api_key_builds() {
        let client = ChatClient::with_api_key(&LlmConfig::default(), "secret").unwrap();
        assert_eq!(client.url(), "https://api.groq.com/openai/v1/chat/completions");
    }
}
