//! POST /ask — drug extraction, DB lookup and harmonized answer.

use std::sync::Arc;

use axum::{Json, extract::State};
use harmonizer::{AskRequest, AskResponse};
use tracing::{info, instrument};

use crate::{core::app_state::AppState, error_handler::AppResult};

/// Handler: POST /ask
///
/// Malformed bodies are rejected by the `Json` extractor and rewritten into
/// the error envelope by `json_error_mapper`.
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8000/ask \
///   -H 'content-type: application/json' \
///   -d '{"question":"布洛芬和泰诺可以一起吃吗？","lang":"zh"}'
/// ```
#[instrument(name = "ask_route", skip_all)]
pub async fn ask_route(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AskRequest>,
) -> AppResult<Json<AskResponse>> {
    let resp = state.harmonizer.ask(&body).await?;
    info!(
        matched = resp.matched_drugs.len(),
        recognized = resp.recognized_drugs.len(),
        "question answered"
    );
    Ok(Json(resp))
}
