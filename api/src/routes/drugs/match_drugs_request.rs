use serde::Deserialize;

/// Query of `GET /drugs/match?text=...`.
#[derive(Debug, Deserialize)]
pub struct MatchDrugsQuery {
    pub text: String,
}
