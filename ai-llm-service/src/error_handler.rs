//! Unified error handling for `ai-llm-service`.
//!
//! This module exposes a single top-level error type [`AiLlmError`] for the whole
//! library, and groups domain-specific errors in nested enums ([`ConfigError`],
//! [`ProviderError`], [`HealthError`]). Small helpers for reading/validating
//! environment values are provided and return the unified [`Result<T>`] alias.
//!
//! All messages include the suffix `[AI LLM Service]` to simplify attribution in logs.

use reqwest::StatusCode;
use std::{fmt, time::Duration};
use thiserror::Error;

use crate::config::llm_provider::LlmProvider;

/* ------------------------------------------------------------------------- */
/* Public result alias                                                       */
/* ------------------------------------------------------------------------- */

/// Unified result alias for the entire crate.
pub type Result<T> = std::result::Result<T, AiLlmError>;

/* ------------------------------------------------------------------------- */
/* Top-level error                                                           */
/* ------------------------------------------------------------------------- */

/// Top-level error for the `ai-llm-service` crate.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AiLlmError {
    /// Configuration/validation errors (startup).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Errors reported by (or about) a concrete provider call.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Health-check/connectivity/decoding errors.
    #[error(transparent)]
    Health(#[from] HealthError),

    /// Underlying HTTP transport error (e.g., `reqwest::Error`).
    #[error("[AI LLM Service] transport error: {0}")]
    HttpTransport(#[from] reqwest::Error),

    /// Operation exceeded the configured timeout.
    #[error("[AI LLM Service] operation timed out after {0:?}")]
    Timeout(Duration),
}

impl AiLlmError {
    /// `true` when the failure happened while talking to the upstream provider
    /// (as opposed to local misconfiguration).
    pub fn is_upstream(&self) -> bool {
        match self {
            AiLlmError::Provider(p) => !matches!(
                p.kind,
                ProviderErrorKind::InvalidEndpoint(_) | ProviderErrorKind::MissingApiKey
            ),
            AiLlmError::HttpTransport(_) | AiLlmError::Timeout(_) => true,
            AiLlmError::Health(_) => true,
            AiLlmError::Config(_) => false,
        }
    }
}

/* ------------------------------------------------------------------------- */
/* Config errors                                                             */
/* ------------------------------------------------------------------------- */

/// Error enum for environment/config-driven setup.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable is missing or empty.
    #[error("[AI LLM Service] missing required environment variable: {0}")]
    MissingVar(&'static str),

    /// No API key for the selected provider.
    #[error("[AI LLM Service] missing API key for configured LLM provider: {0}")]
    MissingApiKey(LlmProvider),

    /// A number failed to parse (like limits, timeouts).
    #[error("[AI LLM Service] invalid number in {var}: {reason}")]
    InvalidNumber {
        /// Variable name (e.g., `LLM_MAX_TOKENS`).
        var: &'static str,
        /// Human-readable reason (e.g., `expected u32`).
        reason: &'static str,
    },

    /// Unsupported provider in `LLM_PROVIDER`.
    #[error("[AI LLM Service] unsupported LLM_PROVIDER: {0}")]
    UnsupportedProvider(String),

    /// Value had the wrong format (e.g., invalid URL).
    #[error("[AI LLM Service] invalid format in {var}: {reason}")]
    InvalidFormat {
        /// Variable name (e.g., `LLM_API_BASE`).
        var: &'static str,
        /// Explanation (e.g., `must start with http:// or https://`).
        reason: &'static str,
    },
}

/* ------------------------------------------------------------------------- */
/* Provider errors                                                           */
/* ------------------------------------------------------------------------- */

/// Non-2xx response details shared by provider and health errors.
#[derive(Debug, Clone)]
pub struct HttpError {
    /// Numeric HTTP status code.
    pub status: StatusCode,
    /// Request URL.
    pub url: String,
    /// Short snippet of the response body (trimmed).
    pub snippet: String,
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {} from {}: {}", self.status, self.url, self.snippet)
    }
}

/// What went wrong in a provider call.
#[derive(Debug)]
pub enum ProviderErrorKind {
    /// Endpoint is empty or does not start with http/https.
    InvalidEndpoint(String),
    /// No API key was configured.
    MissingApiKey,
    /// Upstream returned a non-successful HTTP status.
    HttpStatus(HttpError),
    /// Response payload could not be decoded as expected.
    Decode(String),
    /// Response had no choice with message content.
    EmptyChoices,
}

/// Provider-scoped error: which backend failed and how.
#[derive(Debug)]
pub struct ProviderError {
    pub provider: LlmProvider,
    pub kind: ProviderErrorKind,
}

impl ProviderError {
    pub fn new(provider: LlmProvider, kind: ProviderErrorKind) -> Self {
        Self { provider, kind }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[AI LLM Service] {}: ", self.provider)?;
        match &self.kind {
            ProviderErrorKind::InvalidEndpoint(e) => write!(f, "invalid endpoint: {e}"),
            ProviderErrorKind::MissingApiKey => f.write_str("missing API key"),
            ProviderErrorKind::HttpStatus(h) => write!(f, "{h}"),
            ProviderErrorKind::Decode(msg) => write!(f, "decode error: {msg}"),
            ProviderErrorKind::EmptyChoices => f.write_str("response contained no message content"),
        }
    }
}

impl std::error::Error for ProviderError {}

/* ------------------------------------------------------------------------- */
/* Health errors                                                             */
/* ------------------------------------------------------------------------- */

/// Error enum for provider health checks.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum HealthError {
    /// Upstream returned a non-successful HTTP status.
    #[error("[AI LLM Service] {0}")]
    HttpStatus(HttpError),

    /// Request could not be built (e.g., invalid header).
    #[error("[AI LLM Service] decode error: {0}")]
    Decode(String),
}

/* ------------------------------------------------------------------------- */
/* Env helpers                                                               */
/* ------------------------------------------------------------------------- */

/// Returns the first non-empty (after trim) value among `names`.
pub fn first_non_empty<F>(lookup: &F, names: &[&str]) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    names
        .iter()
        .filter_map(|n| lookup(n))
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

/// Parses an optional `u32` value (`Ok(None)` if unset/empty).
///
/// # Errors
/// Returns [`ConfigError::InvalidNumber`] if the value is set but not a valid `u32`.
pub fn opt_u32(var: &'static str, value: Option<String>) -> Result<Option<u32>> {
    match value {
        Some(v) if !v.trim().is_empty() => v.trim().parse::<u32>().map(Some).map_err(|_| {
            AiLlmError::from(ConfigError::InvalidNumber {
                var,
                reason: "expected u32",
            })
        }),
        _ => Ok(None),
    }
}

/// Parses an optional `u64` value (`Ok(None)` if unset/empty).
///
/// # Errors
/// Returns [`ConfigError::InvalidNumber`] if the value is set but not a valid `u64`.
pub fn opt_u64(var: &'static str, value: Option<String>) -> Result<Option<u64>> {
    match value {
        Some(v) if !v.trim().is_empty() => v.trim().parse::<u64>().map(Some).map_err(|_| {
            AiLlmError::from(ConfigError::InvalidNumber {
                var,
                reason: "expected u64",
            })
        }),
        _ => Ok(None),
    }
}

/* ------------------------------------------------------------------------- */
/* Validation helpers                                                        */
/* ------------------------------------------------------------------------- */

/// Validates that an HTTP endpoint starts with `http://` or `https://`.
///
/// # Errors
/// Returns [`ConfigError::InvalidFormat`] when the string does not start with
/// a valid HTTP scheme.
pub fn validate_http_endpoint(var: &'static str, value: &str) -> Result<()> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidFormat {
            var,
            reason: "must start with http:// or https://",
        }
        .into())
    }
}

/// Builds a short, single-line snippet of an upstream body for logs and errors.
pub fn make_snippet(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(240)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_non_empty_skips_blank_values() {
        let lookup = |k: &str| match k {
            "A" => Some("   ".to_string()),
            "B" => Some(" value ".to_string()),
            _ => None,
        };
        assert_eq!(first_non_empty(&lookup, &["MISSING", "A", "B"]), Some("value".into()));
        assert_eq!(first_non_empty(&lookup, &["MISSING", "A"]), None);
    }

    #[test]
    fn opt_u32_reports_variable_name() {
        assert_eq!(opt_u32("LLM_MAX_TOKENS", None).unwrap(), None);
        assert_eq!(opt_u32("LLM_MAX_TOKENS", Some("512".into())).unwrap(), Some(512));
        let err = opt_u32("LLM_MAX_TOKENS", Some("lots".into())).unwrap_err();
        assert!(err.to_string().contains("LLM_MAX_TOKENS"));
    }

    #[test]
    fn snippet_is_single_line_and_bounded() {
        let body = format!("line one\nline two\t{}", "x".repeat(500));
        let s = make_snippet(&body);
        assert!(s.starts_with("line one line two"));
        assert_eq!(s.chars().count(), 240);
    }

    #[test]
    fn upstream_classification() {
        let cfg = AiLlmError::from(ConfigError::MissingVar("LLM_API_KEY"));
        assert!(!cfg.is_upstream());

        let empty = AiLlmError::from(ProviderError::new(
            LlmProvider::OpenAI,
            ProviderErrorKind::EmptyChoices,
        ));
        assert!(empty.is_upstream());

        let key = AiLlmError::from(ProviderError::new(
            LlmProvider::Zhipu,
            ProviderErrorKind::MissingApiKey,
        ));
        assert!(!key.is_upstream());
    }
}
