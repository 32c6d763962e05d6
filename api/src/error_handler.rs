use ai_llm_service::AiLlmError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use drug_db::DrugDbError;
use harmonizer::HarmonizerError;
use thiserror::Error;
use tracing::error;

use crate::core::http::response_envelope::ApiResponse;

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error(transparent)]
    Llm(#[from] AiLlmError),

    #[error(transparent)]
    DrugDb(#[from] DrugDbError),

    // --- IO / server ---
    #[error("failed to bind listener on {address}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error")]
    Server(#[source] std::io::Error),

    /// Error mapped from a lower layer with a specific status & code.
    #[error("{message}")]
    Http {
        status: StatusCode,
        code: &'static str,
        message: String,
    },
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Http { status, .. } => *status,
            AppError::Llm(_) | AppError::DrugDb(_) | AppError::Bind { .. } | AppError::Server(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::Llm(_) => "LLM_CONFIG_ERROR",
            AppError::DrugDb(_) => "DRUG_DB_ERROR",
            AppError::Bind { .. } => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::Http { code, .. } => code,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(code = self.error_code(), error = %self, "request failed");
        }
        ApiResponse::<()>::error(self.error_code(), self.to_string(), Vec::new())
            .into_response_with_status(status)
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

/// Upstream LLM failures become `502 UPSTREAM_LLM_ERROR`; local misconfiguration stays a 500.
impl From<HarmonizerError> for AppError {
    fn from(err: HarmonizerError) -> Self {
        if err.is_upstream() {
            AppError::Http {
                status: StatusCode::BAD_GATEWAY,
                code: "UPSTREAM_LLM_ERROR",
                message: err.to_string(),
            }
        } else {
            AppError::Http {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "LLM_CONFIG_ERROR",
                message: err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use ai_llm_service::ConfigError;

    use super::*;

    #[test]
    fn harmonizer_errors_map_to_status() {
        let upstream: AppError = HarmonizerError::InvalidModelOutput("no JSON".into()).into();
        assert_eq!(upstream.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(upstream.error_code(), "UPSTREAM_LLM_ERROR");

        let local: AppError =
            HarmonizerError::Llm(AiLlmError::Config(ConfigError::MissingVar("LLM_PROVIDER"))).into();
        assert_eq!(local.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(local.error_code(), "LLM_CONFIG_ERROR");
    }
}
