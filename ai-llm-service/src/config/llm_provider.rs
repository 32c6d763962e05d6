use std::{fmt, str::FromStr};

use crate::error_handler::ConfigError;

/// Represents the OpenAI-compatible provider (backend) used for chat completions.
///
/// All providers speak the same `/chat/completions` wire format; they differ
/// only in base URL, default model, and which env vars carry their settings.
///
/// # Examples
///
/// ```
/// use ai_llm_service::LlmProvider;
///
/// let p: LlmProvider = "DeepSeek".parse().unwrap();
/// assert_eq!(p, LlmProvider::DeepSeek);
/// assert_eq!(p.default_model(), "deepseek-chat");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    /// OpenAI's public API.
    OpenAI,
    /// Zhipu AI (GLM models) open platform.
    Zhipu,
    /// DeepSeek platform.
    DeepSeek,
}

impl LlmProvider {
    /// Canonical lowercase name, as accepted in `LLM_PROVIDER`.
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::OpenAI => "openai",
            LlmProvider::Zhipu => "zhipu",
            LlmProvider::DeepSeek => "deepseek",
        }
    }

    /// Provider-specific API key variable, consulted after `LLM_API_KEY`.
    pub fn api_key_var(&self) -> &'static str {
        match self {
            LlmProvider::OpenAI => "OPENAI_API_KEY",
            LlmProvider::Zhipu => "ZHIPU_API_KEY",
            LlmProvider::DeepSeek => "DEEPSEEK_API_KEY",
        }
    }

    /// Provider-specific base URL variable, consulted after `LLM_API_BASE`.
    pub fn base_url_var(&self) -> &'static str {
        match self {
            LlmProvider::OpenAI => "OPENAI_BASE_URL",
            LlmProvider::Zhipu => "ZHIPU_BASE_URL",
            LlmProvider::DeepSeek => "DEEPSEEK_BASE_URL",
        }
    }

    /// Provider-specific model variable, consulted after `LLM_MODEL`.
    pub fn model_var(&self) -> &'static str {
        match self {
            LlmProvider::OpenAI => "OPENAI_MODEL",
            LlmProvider::Zhipu => "ZHIPU_MODEL",
            LlmProvider::DeepSeek => "DEEPSEEK_MODEL",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            LlmProvider::OpenAI => "https://api.openai.com/v1",
            LlmProvider::Zhipu => "https://open.bigmodel.cn/api/paas/v4",
            LlmProvider::DeepSeek => "https://api.deepseek.com",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            LlmProvider::OpenAI => "gpt-4.1-mini",
            LlmProvider::Zhipu => "glm-4-flash",
            LlmProvider::DeepSeek => "deepseek-chat",
        }
    }
}

impl FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(LlmProvider::OpenAI),
            "zhipu" => Ok(LlmProvider::Zhipu),
            "deepseek" => Ok(LlmProvider::DeepSeek),
            other => Err(ConfigError::UnsupportedProvider(other.to_string())),
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("OpenAI".parse::<LlmProvider>().unwrap(), LlmProvider::OpenAI);
        assert_eq!(" zhipu ".parse::<LlmProvider>().unwrap(), LlmProvider::Zhipu);
        assert_eq!("DEEPSEEK".parse::<LlmProvider>().unwrap(), LlmProvider::DeepSeek);
    }

    #[test]
    fn rejects_unknown_provider() {
        let err = "anthropic".parse::<LlmProvider>().unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedProvider(ref p) if p == "anthropic"));
    }
}
