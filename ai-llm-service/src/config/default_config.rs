//! LLM configs resolved from environment variables.
//!
//! One base [`LlmModelConfig`] is resolved for the provider selected by
//! `LLM_PROVIDER`; the two role profiles used by the service differ only in
//! sampling temperature:
//!
//! - **Extraction**    → deterministic drug-name extraction (`temperature = 0.0`)
//! - **Harmonization** → templated markdown answer (`temperature = 0.2`)
//!
//! # Environment variables
//!
//! Common:
//! - `LLM_PROVIDER`     = `openai` (default) | `zhipu` | `deepseek`
//! - `LLM_API_KEY`      = API key, overrides the provider-specific key
//! - `LLM_API_BASE`     = base URL, overrides the provider-specific base
//! - `LLM_MODEL`        = model, overrides the provider-specific model
//! - `LLM_MAX_TOKENS`   = optional max tokens (u32)
//! - `LLM_TIMEOUT_SECS` = optional request timeout (u64, default 60)
//!
//! Provider-specific fallbacks (`OPENAI_*`, `ZHIPU_*`, `DEEPSEEK_*`):
//! `*_API_KEY`, `*_BASE_URL`, `*_MODEL`.

use tracing::debug;

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{ConfigError, Result, first_non_empty, opt_u32, opt_u64, validate_http_endpoint},
};

/// Sampling temperature for drug-name extraction.
pub const EXTRACTION_TEMPERATURE: f32 = 0.0;

/// Sampling temperature for the harmonized answer.
pub const HARMONIZATION_TEMPERATURE: f32 = 0.2;

/// Default request timeout when `LLM_TIMEOUT_SECS` is not set.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Resolves the base config from the process environment.
///
/// # Errors
///
/// - [`ConfigError::UnsupportedProvider`] for an unknown `LLM_PROVIDER`
/// - [`ConfigError::MissingApiKey`] if no key is found for the provider
/// - [`ConfigError::InvalidFormat`] if the base URL is not http(s)
/// - [`ConfigError::InvalidNumber`] for malformed numeric knobs
pub fn config_from_env() -> Result<LlmModelConfig> {
    config_from_lookup(|name| std::env::var(name).ok())
}

/// Resolves the base config using an arbitrary variable lookup.
///
/// Precedence for each setting: the generic `LLM_*` variable, then the
/// provider-specific variable, then the provider default.
pub fn config_from_lookup<F>(lookup: F) -> Result<LlmModelConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let provider = match first_non_empty(&lookup, &["LLM_PROVIDER"]) {
        Some(name) => name.parse::<LlmProvider>()?,
        None => LlmProvider::OpenAI,
    };

    let api_key = first_non_empty(&lookup, &["LLM_API_KEY", provider.api_key_var()])
        .ok_or(ConfigError::MissingApiKey(provider))?;

    let endpoint = first_non_empty(&lookup, &["LLM_API_BASE", provider.base_url_var()])
        .unwrap_or_else(|| provider.default_base_url().to_string());
    validate_http_endpoint("LLM_API_BASE", &endpoint)?;

    let model = first_non_empty(&lookup, &["LLM_MODEL", provider.model_var()])
        .unwrap_or_else(|| provider.default_model().to_string());

    let max_tokens = opt_u32("LLM_MAX_TOKENS", lookup("LLM_MAX_TOKENS"))?;
    let timeout_secs =
        opt_u64("LLM_TIMEOUT_SECS", lookup("LLM_TIMEOUT_SECS"))?.or(Some(DEFAULT_TIMEOUT_SECS));

    debug!(
        provider = %provider,
        model = %model,
        endpoint = %endpoint,
        "resolved LLM config"
    );

    Ok(LlmModelConfig {
        provider,
        model,
        endpoint,
        api_key,
        max_tokens,
        temperature: None,
        top_p: None,
        timeout_secs,
    })
}

/// Profile used for drug-name extraction.
pub fn extraction_profile(base: &LlmModelConfig) -> LlmModelConfig {
    base.with_temperature(EXTRACTION_TEMPERATURE)
}

/// Profile used for the harmonized answer.
pub fn harmonization_profile(base: &LlmModelConfig) -> LlmModelConfig {
    base.with_temperature(HARMONIZATION_TEMPERATURE)
}
