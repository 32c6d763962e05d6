use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Response,
};
use tracing::{debug, instrument};

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    routes::drugs::match_drugs_request::MatchDrugsQuery,
};

/// Handler: GET /drugs/match — records mentioned verbatim in `text`, grouped by base name.
///
/// # Example
/// ```bash
/// curl 'http://127.0.0.1:8000/drugs/match?text=Advil%20or%20Tylenol'
/// ```
#[instrument(name = "match_drugs_route", skip_all)]
pub async fn match_drugs_route(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MatchDrugsQuery>,
) -> Response {
    let groups = state.harmonizer.db().find_drugs_in_text(&query.text);
    debug!(groups = groups.len(), "text matched against DB");
    ApiResponse::success(groups).into_response_with_status(StatusCode::OK)
}
