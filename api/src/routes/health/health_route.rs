use std::sync::Arc;

use axum::{Json, extract::State};
use tracing::{instrument, warn};

use crate::{core::app_state::AppState, routes::health::health_response::HealthResponse};

/// Handler: GET /health
///
/// Always answers 200; LLM reachability is reported per profile.
#[instrument(name = "health_route", skip_all)]
pub async fn health_route(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let llm = state.harmonizer.llm().health_all().await;
    let resp = HealthResponse::new(state.harmonizer.db().len(), llm);
    if resp.status != "ok" {
        warn!(status = resp.status, "LLM provider unhealthy");
    }
    Json(resp)
}
