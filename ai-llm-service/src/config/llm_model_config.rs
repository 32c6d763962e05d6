use crate::config::llm_provider::LlmProvider;

/// Configuration for an LLM model invocation.
///
/// # Fields
///
/// - `provider`: Which OpenAI-compatible backend to use.
/// - `model`: The model identifier (e.g., `"gpt-4.1-mini"`, `"glm-4-flash"`).
/// - `endpoint`: API base URL; `/chat/completions` is appended to it.
/// - `api_key`: Bearer token for the provider.
/// - `max_tokens`: Maximum number of tokens to generate (if supported).
/// - `temperature`: Controls randomness (0.0 = deterministic).
/// - `top_p`: Nucleus sampling cutoff (alternative to temperature).
/// - `timeout_secs`: Optional request timeout in seconds.
///
/// # Examples
///
/// ```
/// use ai_llm_service::{LlmModelConfig, LlmProvider};
///
/// let cfg = LlmModelConfig {
///     provider: LlmProvider::OpenAI,
///     model: "gpt-4.1-mini".to_string(),
///     endpoint: "https://api.openai.com/v1".to_string(),
///     api_key: "sk-...".to_string(),
///     max_tokens: None,
///     temperature: None,
///     top_p: None,
///     timeout_secs: Some(60),
/// };
/// assert_eq!(cfg.with_temperature(0.2).temperature, Some(0.2));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    /// The LLM provider/backend.
    pub provider: LlmProvider,

    /// Model identifier string.
    pub model: String,

    /// API base URL (e.g., `https://api.deepseek.com`).
    pub endpoint: String,

    /// API key for authentication.
    pub api_key: String,

    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,

    /// Sampling temperature.
    pub temperature: Option<f32>,

    /// Nucleus sampling parameter.
    pub top_p: Option<f32>,

    /// Optional request timeout (in seconds).
    pub timeout_secs: Option<u64>,
}

impl LlmModelConfig {
    /// Returns a copy of this config with the given sampling temperature.
    pub fn with_temperature(&self, temperature: f32) -> Self {
        Self {
            temperature: Some(temperature),
            ..self.clone()
        }
    }
}
