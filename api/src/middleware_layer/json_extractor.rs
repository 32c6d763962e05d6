//! Rewrites axum's plain-text extractor rejections into the JSON error envelope.

use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, HeaderValue, Request, StatusCode, header, response::Parts},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::debug;

use crate::core::http::response_envelope::{ApiErrorDetail, ApiResponse};

pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Request fields a rejection message may point at.
const KNOWN_FIELDS: [&str; 3] = ["question", "lang", "text"];

async fn take_body(res: Response) -> (Parts, Bytes) {
    let (parts, body) = res.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();
    (parts, bytes)
}

/// Serde messages name the field either as a path prefix (`lang: unknown variant`)
/// or in backticks (``missing field `question` ``).
fn guess_path_from_serde_msg(msg: &str) -> Option<String> {
    KNOWN_FIELDS
        .into_iter()
        .find(|key| msg.contains(&format!("{key}: ")) || msg.contains(&format!("`{key}`")))
        .map(str::to_string)
}

fn hint_for(msg: &str) -> Option<String> {
    let hint = if msg.contains("missing field") {
        "This field is required."
    } else if msg.contains("unknown variant") {
        "Use one of the values listed in the message."
    } else if msg.contains("invalid type") {
        "Check the JSON type of this field."
    } else if msg.contains("Content-Type") {
        "Send the body with `Content-Type: application/json`."
    } else if msg.contains("parse the request body") {
        "The request body must be valid JSON."
    } else {
        return None;
    };
    Some(hint.to_string())
}

fn error_code(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => "BAD_REQUEST",
        StatusCode::UNPROCESSABLE_ENTITY => "UNPROCESSABLE_ENTITY",
        StatusCode::UNSUPPORTED_MEDIA_TYPE => "UNSUPPORTED_MEDIA_TYPE",
        StatusCode::PAYLOAD_TOO_LARGE => "PAYLOAD_TOO_LARGE",
        _ => "REQUEST_REJECTED",
    }
}

fn request_id_from(headers: &HeaderMap) -> Option<String> {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn ensure_request_id(parts: &mut Parts, incoming: Option<String>) -> String {
    if let Some(id) = request_id_from(&parts.headers) {
        return id;
    }
    let id = incoming.unwrap_or_else(|| {
        let nanos = Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or_else(|| Utc::now().timestamp_micros() * 1000);
        format!("req-{nanos}")
    });
    if let Ok(value) = HeaderValue::from_str(&id) {
        parts.headers.insert(REQUEST_ID_HEADER, value);
    }
    id
}

fn is_json(parts: &Parts) -> bool {
    parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

/// Tags every error response with an `X-Request-Id` and wraps non-JSON
/// 4xx bodies (extractor rejections) in [`ApiResponse`].
pub async fn json_error_mapper(req: Request<Body>, next: Next) -> Response {
    let incoming = request_id_from(req.headers());
    let res = next.run(req).await;
    let status = res.status();

    if !(status.is_client_error() || status.is_server_error()) {
        return res;
    }

    let (mut parts, bytes) = take_body(res).await;
    let req_id = ensure_request_id(&mut parts, incoming);

    if status.is_server_error() || is_json(&parts) || status == StatusCode::NOT_FOUND {
        return Response::from_parts(parts, Body::from(bytes));
    }

    let original = String::from_utf8_lossy(&bytes);
    debug!(%req_id, status = status.as_u16(), message = %original.trim(), "request rejected");

    let detail = ApiErrorDetail {
        path: guess_path_from_serde_msg(&original),
        hint: hint_for(&original),
    };
    let details = if detail.path.is_none() && detail.hint.is_none() {
        Vec::new()
    } else {
        vec![detail]
    };
    let envelope = ApiResponse::<()>::error(error_code(status), original.trim(), details);

    let body = match serde_json::to_vec(&envelope) {
        Ok(v) => v,
        Err(_) => bytes.to_vec(),
    };

    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    parts.headers.remove(header::CONTENT_LENGTH);

    Response::from_parts(parts, Body::from(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_and_hint_are_guessed() {
        let missing = "Failed to deserialize the JSON body into the target type: missing field `question` at line 1 column 2";
        assert_eq!(guess_path_from_serde_msg(missing).as_deref(), Some("question"));
        assert_eq!(hint_for(missing).as_deref(), Some("This field is required."));

        let variant = "Failed to deserialize the JSON body into the target type: lang: unknown variant `de`, expected `zh` or `en` at line 1 column 29";
        assert_eq!(guess_path_from_serde_msg(variant).as_deref(), Some("lang"));
        assert!(hint_for(variant).unwrap().contains("values"));

        assert_eq!(guess_path_from_serde_msg("EOF while parsing"), None);
    }
}
