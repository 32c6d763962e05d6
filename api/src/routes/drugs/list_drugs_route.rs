use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Response};

use crate::core::{app_state::AppState, http::response_envelope::ApiResponse};

/// Handler: GET /drugs — sorted base names.
pub async fn list_drugs_route(State(state): State<Arc<AppState>>) -> Response {
    ApiResponse::success(state.harmonizer.db().list_all_bases())
        .into_response_with_status(StatusCode::OK)
}
