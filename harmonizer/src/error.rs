//! Typed error for the harmonizer crate.

use ai_llm_service::AiLlmError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarmonizerError {
    /// LLM configuration, transport or provider failure.
    #[error("LLM error: {0}")]
    Llm(#[from] AiLlmError),

    /// Model output did not contain the expected JSON.
    #[error("invalid model output: {0}")]
    InvalidModelOutput(String),
}

impl HarmonizerError {
    /// `true` when an upstream LLM call failed (maps to a gateway error).
    pub fn is_upstream(&self) -> bool {
        match self {
            HarmonizerError::Llm(e) => e.is_upstream(),
            HarmonizerError::InvalidModelOutput(_) => true,
        }
    }
}
