use ai_llm_service::health_service::HealthStatus;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok` when every LLM probe succeeded, `degraded` otherwise.
    pub status: &'static str,
    pub drugs_loaded: usize,
    pub llm: Vec<HealthStatus>,
}

impl HealthResponse {
    pub fn new(drugs_loaded: usize, llm: Vec<HealthStatus>) -> Self {
        let status = if llm.iter().all(|s| s.ok) { "ok" } else { "degraded" };
        Self {
            status,
            drugs_loaded,
            llm,
        }
    }
}
