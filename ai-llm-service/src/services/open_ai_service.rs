//! OpenAI-compatible chat completion client.
//!
//! Minimal, non-streaming client shared by every supported provider. The
//! endpoint is derived from `LlmModelConfig::endpoint`:
//! - POST {endpoint}/chat/completions — chat completion (non-streaming)
//!
//! Constructor validation:
//! - `cfg.api_key` must be non-empty
//! - `cfg.endpoint` must start with http:// or https://
//!
//! Errors are normalized via unified error types in `error_handler`.

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use crate::{
    config::{default_config::DEFAULT_TIMEOUT_SECS, llm_model_config::LlmModelConfig},
    error_handler::{AiLlmError, HttpError, ProviderError, ProviderErrorKind, make_snippet},
};

/// Role of a chat message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// A single chat message as sent on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Thin client for an OpenAI-compatible chat API.
///
/// Constructed from a complete [`LlmModelConfig`]. Internally keeps a
/// preconfigured `reqwest::Client` (with timeout and default headers).
#[derive(Debug)]
pub struct OpenAiService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_chat: String,
}

impl OpenAiService {
    /// Creates a new [`OpenAiService`] from the given config.
    ///
    /// Validates the API key and endpoint scheme. Builds an HTTP client with
    /// default headers and a configurable timeout.
    ///
    /// # Errors
    /// - [`AiLlmError::Provider`] with `MissingApiKey` if `cfg.api_key` is blank
    /// - [`AiLlmError::Provider`] with `InvalidEndpoint` if `cfg.endpoint` is invalid
    /// - [`AiLlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        let api_key = cfg.api_key.trim();
        if api_key.is_empty() {
            return Err(ProviderError::new(cfg.provider, ProviderErrorKind::MissingApiKey).into());
        }

        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(ProviderError::new(
                cfg.provider,
                ProviderErrorKind::InvalidEndpoint(cfg.endpoint.clone()),
            )
            .into());
        }

        let timeout_secs = cfg.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|e| {
                ProviderError::new(
                    cfg.provider,
                    ProviderErrorKind::Decode(format!("invalid API key header: {e}")),
                )
            })?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .default_headers(headers)
            .build()?;

        let url_chat = format!("{}/chat/completions", endpoint.trim_end_matches('/'));

        info!(
            provider = %cfg.provider,
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            timeout_secs,
            "OpenAiService initialized"
        );

        Ok(Self {
            client,
            cfg,
            url_chat,
        })
    }

    /// The config this client was built from.
    pub fn config(&self) -> &LlmModelConfig {
        &self.cfg
    }

    /// Performs a **non-streaming** chat completion request (`/chat/completions`)
    /// using the sampling options of the config this client was built from.
    ///
    /// # Errors
    /// See [`OpenAiService::complete_with`].
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String, AiLlmError> {
        self.complete_with(&self.cfg, messages).await
    }

    /// Performs a **non-streaming** chat completion request with the sampling
    /// options (`temperature`, `top_p`, `max_tokens`) taken from `sampling`.
    ///
    /// Connection settings (endpoint, key, model) always come from the client's
    /// own config. Returns the content of the first choice that carries one.
    ///
    /// # Errors
    /// - [`AiLlmError::Provider`] with `HttpStatus` for non-2xx responses
    /// - [`AiLlmError::HttpTransport`] for client/network failures
    /// - [`AiLlmError::Provider`] with `Decode` if the JSON cannot be parsed
    /// - [`AiLlmError::Provider`] with `EmptyChoices` if no content is returned
    #[instrument(skip_all, fields(provider = %self.cfg.provider, model = %self.cfg.model))]
    pub async fn complete_with(
        &self,
        sampling: &LlmModelConfig,
        messages: &[ChatMessage],
    ) -> Result<String, AiLlmError> {
        let started = Instant::now();
        let body = ChatCompletionRequest {
            model: &self.cfg.model,
            messages,
            temperature: sampling.temperature,
            top_p: sampling.top_p,
            max_tokens: sampling.max_tokens,
        };

        debug!(
            endpoint = %self.cfg.endpoint,
            messages = messages.len(),
            temperature = ?sampling.temperature,
            "POST {}", self.url_chat
        );

        let resp = self.client.post(&self.url_chat).json(&body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let url = self.url_chat.clone();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);

            error!(
                %status,
                %url,
                %snippet,
                latency_ms = started.elapsed().as_millis(),
                "/chat/completions returned non-success status"
            );

            return Err(ProviderError::new(
                self.cfg.provider,
                ProviderErrorKind::HttpStatus(HttpError {
                    status,
                    url,
                    snippet,
                }),
            )
            .into());
        }

        let out: ChatCompletionResponse = match resp.json().await {
            Ok(v) => v,
            Err(e) => {
                error!(
                    error = %e,
                    latency_ms = started.elapsed().as_millis(),
                    "failed to decode /chat/completions response"
                );
                return Err(ProviderError::new(
                    self.cfg.provider,
                    ProviderErrorKind::Decode(format!(
                        "serde error: {e}; expected `choices[0].message.content`"
                    )),
                )
                .into());
            }
        };

        let content = out
            .choices
            .into_iter()
            .find_map(|c| c.message.content)
            .ok_or_else(|| ProviderError::new(self.cfg.provider, ProviderErrorKind::EmptyChoices))?;

        info!(
            latency_ms = started.elapsed().as_millis(),
            content_len = content.len(),
            "chat completion completed"
        );

        Ok(content)
    }
}

/* ===========================================================================
HTTP payloads
======================================================================== */

/// Request body for `/chat/completions` (non-streaming).
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

/// Minimal response for `/chat/completions`.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageOut,
}

#[derive(Debug, Deserialize)]
struct ChatMessageOut {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        LlmProvider,
        test_support::{MockLlm, MockReply},
    };

    fn cfg_for(endpoint: &str) -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::DeepSeek,
            model: "deepseek-chat".into(),
            endpoint: endpoint.into(),
            api_key: "test-key".into(),
            max_tokens: Some(128),
            temperature: Some(0.2),
            top_p: None,
            timeout_secs: Some(5),
        }
    }

    #[test]
    fn rejects_blank_key_and_bad_endpoint() {
        let mut cfg = cfg_for("http://localhost:1");
        cfg.api_key = "  ".into();
        let err = OpenAiService::new(cfg).unwrap_err();
        assert!(matches!(
            err,
            AiLlmError::Provider(ProviderError { kind: ProviderErrorKind::MissingApiKey, .. })
        ));

        let err = OpenAiService::new(cfg_for("ftp://example.com")).unwrap_err();
        assert!(matches!(
            err,
            AiLlmError::Provider(ProviderError { kind: ProviderErrorKind::InvalidEndpoint(_), .. })
        ));
    }

    #[test]
    fn messages_serialize_with_lowercase_roles() {
        let msgs = [ChatMessage::system("rules"), ChatMessage::user("hi")];
        let v = serde_json::to_value(msgs).unwrap();
        assert_eq!(v[0]["role"], "system");
        assert_eq!(v[1]["role"], "user");
        assert_eq!(v[1]["content"], "hi");
    }

    #[tokio::test]
    async fn posts_messages_and_returns_first_content() {
        let mock = MockLlm::start(vec![MockReply::content("hello there")]).await;
        let svc = OpenAiService::new(cfg_for(&format!("{}/", mock.base_url()))).unwrap();

        let out = svc
            .complete(&[ChatMessage::system("be brief"), ChatMessage::user("hi")])
            .await
            .unwrap();
        assert_eq!(out, "hello there");

        let reqs = mock.requests().await;
        assert_eq!(reqs.len(), 1);
        let body = &reqs[0].body;
        assert_eq!(reqs[0].authorization.as_deref(), Some("Bearer test-key"));
        assert_eq!(body["model"], "deepseek-chat");
        assert_eq!(body["max_tokens"], 128);
        assert!(body.get("top_p").is_none());
        assert_eq!(body["messages"][0]["content"], "be brief");
        assert_eq!(body["messages"][1]["role"], "user");
    }

    #[tokio::test]
    async fn non_success_status_is_reported_with_snippet() {
        let mock = MockLlm::start(vec![MockReply::status(429, "rate limited\nslow down")]).await;
        let svc = OpenAiService::new(cfg_for(&mock.base_url())).unwrap();

        let err = svc.complete(&[ChatMessage::user("hi")]).await.unwrap_err();
        match err {
            AiLlmError::Provider(ProviderError {
                kind: ProviderErrorKind::HttpStatus(h),
                provider,
            }) => {
                assert_eq!(provider, LlmProvider::DeepSeek);
                assert_eq!(h.status.as_u16(), 429);
                assert_eq!(h.snippet, "rate limited slow down");
                assert!(h.url.ends_with("/chat/completions"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn null_content_and_bad_json_are_distinguished() {
        let mock = MockLlm::start(vec![
            MockReply::raw(r#"{"choices":[{"message":{"content":null}}]}"#),
            MockReply::raw("not json"),
        ])
        .await;
        let svc = OpenAiService::new(cfg_for(&mock.base_url())).unwrap();

        let empty = svc.complete(&[ChatMessage::user("a")]).await.unwrap_err();
        assert!(matches!(
            empty,
            AiLlmError::Provider(ProviderError { kind: ProviderErrorKind::EmptyChoices, .. })
        ));

        let decode = svc.complete(&[ChatMessage::user("b")]).await.unwrap_err();
        assert!(matches!(
            decode,
            AiLlmError::Provider(ProviderError { kind: ProviderErrorKind::Decode(_), .. })
        ));
    }
}
