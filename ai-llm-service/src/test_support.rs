//! In-process mock of an OpenAI-compatible provider.
//!
//! Serves `POST /chat/completions` from a scripted queue of replies and
//! `GET /models` from a fixed model list. Every chat request is recorded so
//! tests can assert on the messages that were sent.

use std::{collections::VecDeque, net::SocketAddr, sync::Arc};

use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use tokio::sync::Mutex;

use crate::{LlmModelConfig, LlmProvider};

/// Model id reported by the mock and used by [`MockLlm::config`].
pub const MOCK_MODEL: &str = "mock-model";

/// One scripted reply for `/chat/completions`.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// 200 with a raw body.
    Raw(String),
    /// Given status with a raw body.
    Status(u16, String),
}

impl MockReply {
    /// 200 with a standard completion carrying `content`.
    pub fn content(content: &str) -> Self {
        let body = json!({
            "id": "chatcmpl-mock",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }]
        });
        MockReply::Raw(body.to_string())
    }

    pub fn raw(body: &str) -> Self {
        MockReply::Raw(body.to_string())
    }

    pub fn status(code: u16, body: &str) -> Self {
        MockReply::Status(code, body.to_string())
    }
}

/// A chat request captured by the mock.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub authorization: Option<String>,
    pub body: Value,
}

impl RecordedRequest {
    /// `messages[i].content` as a string (empty if absent).
    pub fn message(&self, i: usize) -> &str {
        self.body["messages"][i]["content"].as_str().unwrap_or_default()
    }
}

struct MockState {
    replies: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<RecordedRequest>>,
    models: Option<Vec<String>>,
}

/// Handle to a running mock server. The server lives until the test runtime stops.
pub struct MockLlm {
    addr: SocketAddr,
    state: Arc<MockState>,
}

impl MockLlm {
    /// Starts a mock that lists [`MOCK_MODEL`] under `/models`.
    pub async fn start(replies: Vec<MockReply>) -> Self {
        Self::start_with_models(replies, Some(vec![MOCK_MODEL.to_string()])).await
    }

    /// Starts a mock with a custom model list; `None` makes `/models` return 503.
    pub async fn start_with_models(replies: Vec<MockReply>, models: Option<Vec<String>>) -> Self {
        let state = Arc::new(MockState {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
            models,
        });

        let app = Router::new()
            .route("/chat/completions", post(chat))
            .route("/models", get(list_models))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock LLM listener");
        let addr = listener.local_addr().expect("mock LLM local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, state }
    }

    /// Base URL to use as `LlmModelConfig::endpoint`.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Config pointing at this mock.
    pub fn config(&self, provider: LlmProvider) -> LlmModelConfig {
        LlmModelConfig {
            provider,
            model: MOCK_MODEL.to_string(),
            endpoint: self.base_url(),
            api_key: "test-key".to_string(),
            max_tokens: None,
            temperature: None,
            top_p: None,
            timeout_secs: Some(5),
        }
    }

    /// Chat requests received so far, in arrival order.
    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().await.clone()
    }
}

async fn chat(State(state): State<Arc<MockState>>, headers: HeaderMap, body: String) -> Response {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = serde_json::from_str(&body).unwrap_or(Value::Null);
    state
        .requests
        .lock()
        .await
        .push(RecordedRequest { authorization, body });

    let reply = state.replies.lock().await.pop_front();
    let (status, body) = match reply {
        Some(MockReply::Raw(body)) => (StatusCode::OK, body),
        Some(MockReply::Status(code, body)) => (
            StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body,
        ),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"error":"no scripted reply left"}"#.to_string(),
        ),
    };
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

async fn list_models(State(state): State<Arc<MockState>>) -> Response {
    match &state.models {
        Some(models) => {
            let data: Vec<Value> = models
                .iter()
                .map(|id| json!({ "id": id, "object": "model" }))
                .collect();
            axum::Json(json!({ "object": "list", "data": data })).into_response()
        }
        None => (StatusCode::SERVICE_UNAVAILABLE, "maintenance").into_response(),
    }
}
