//! Shared LLM service for OpenAI-compatible chat providers.
//!
//! - [`config`]: provider selection and model configs resolved from env.
//! - [`services::open_ai_service`]: non-streaming `/chat/completions` client.
//! - [`service_profiles`]: extraction/harmonization profiles with cached clients.
//! - [`health_service`]: best-effort provider probes for `/health`.
//! - [`telemetry`]: library-scoped `tracing` layer.

pub mod config;
pub mod error_handler;
pub mod health_service;
pub mod service_profiles;
pub mod services;
pub mod telemetry;

pub use config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider};
pub use error_handler::{AiLlmError, ConfigError};
pub use services::open_ai_service::{ChatMessage, ChatRole, OpenAiService};

#[cfg(any(test, feature = "test-util"))]
pub mod test_support;
