//! Shared LLM service with two profiles: `extraction` and `harmonization`.
//!
//! - Lives in the same Tokio runtime as the application.
//! - Construct once, wrap in `Arc`, and pass clones to dependents.
//! - Caches underlying HTTP clients per config (provider+endpoint+model+key+timeout).
//! - Both profiles normally share one client; they differ only in temperature,
//!   which is sent per request.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use ai_llm_service::{ChatMessage, service_profiles::LlmServiceProfiles};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ai_llm_service::AiLlmError> {
//!     let svc = Arc::new(LlmServiceProfiles::from_env(Some(10))?);
//!
//!     let txt = svc
//!         .chat_harmonization(&[ChatMessage::user("What is ibuprofen?")])
//!         .await?;
//!     println!("{txt}");
//!
//!     let statuses = svc.health_all().await;
//!     println!("Health = {statuses:?}");
//!     Ok(())
//! }
//! ```

use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;

use crate::{
    config::{
        default_config::{config_from_env, extraction_profile, harmonization_profile},
        llm_model_config::LlmModelConfig,
        llm_provider::LlmProvider,
    },
    error_handler::AiLlmError,
    health_service::{HealthService, HealthStatus},
    services::open_ai_service::{ChatMessage, OpenAiService},
};

/// Shared service that manages the two logical LLM profiles.
pub struct LlmServiceProfiles {
    extraction: LlmModelConfig,
    harmonization: LlmModelConfig,

    clients: RwLock<HashMap<ClientKey, Arc<OpenAiService>>>,

    health: HealthService,
}

impl LlmServiceProfiles {
    /// Creates a new service from explicit profiles.
    ///
    /// - `extraction`: drug-name extraction profile.
    /// - `harmonization`: answer generation profile.
    /// - `health_timeout_secs`: optional timeout for the health checker.
    pub fn new(
        extraction: LlmModelConfig,
        harmonization: LlmModelConfig,
        health_timeout_secs: Option<u64>,
    ) -> Result<Self, AiLlmError> {
        Ok(Self {
            extraction,
            harmonization,
            clients: RwLock::new(HashMap::new()),
            health: HealthService::new(health_timeout_secs)?,
        })
    }

    /// Resolves the base config from the environment and derives both profiles.
    ///
    /// # Errors
    /// Propagates [`crate::ConfigError`] from env resolution.
    pub fn from_env(health_timeout_secs: Option<u64>) -> Result<Self, AiLlmError> {
        Self::from_base(&config_from_env()?, health_timeout_secs)
    }

    /// Derives both profiles from an already resolved base config.
    pub fn from_base(
        base: &LlmModelConfig,
        health_timeout_secs: Option<u64>,
    ) -> Result<Self, AiLlmError> {
        Self::new(
            extraction_profile(base),
            harmonization_profile(base),
            health_timeout_secs,
        )
    }

    /// Chat completion using the **extraction** profile.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] if the client cannot be built or the call fails.
    pub async fn chat_extraction(&self, messages: &[ChatMessage]) -> Result<String, AiLlmError> {
        self.client_for(&self.extraction)
            .await?
            .complete_with(&self.extraction, messages)
            .await
    }

    /// Chat completion using the **harmonization** profile.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] if the client cannot be built or the call fails.
    pub async fn chat_harmonization(
        &self,
        messages: &[ChatMessage],
    ) -> Result<String, AiLlmError> {
        self.client_for(&self.harmonization)
            .await?
            .complete_with(&self.harmonization, messages)
            .await
    }

    /// Returns a health snapshot for all distinct provider targets.
    ///
    /// Profiles that only differ in sampling parameters are checked once.
    pub async fn health_all(&self) -> Vec<HealthStatus> {
        let mut list = vec![self.extraction.clone()];
        if ClientKey::from(&self.harmonization) != ClientKey::from(&self.extraction) {
            list.push(self.harmonization.clone());
        }
        self.health.check_many(&list).await
    }

    /// Returns references to the current profiles `(extraction, harmonization)`.
    pub fn profiles(&self) -> (&LlmModelConfig, &LlmModelConfig) {
        (&self.extraction, &self.harmonization)
    }

    /* --------------------- Internals --------------------- */

    async fn client_for(&self, cfg: &LlmModelConfig) -> Result<Arc<OpenAiService>, AiLlmError> {
        let key = ClientKey::from(cfg);
        if let Some(cli) = self.clients.read().await.get(&key).cloned() {
            return Ok(cli);
        }
        let mut w = self.clients.write().await;
        if let Some(cli) = w.get(&key) {
            return Ok(cli.clone());
        }
        let cli = Arc::new(OpenAiService::new(cfg.clone())?);
        w.insert(key, cli.clone());
        Ok(cli)
    }

    #[cfg(test)]
    async fn cached_clients(&self) -> usize {
        self.clients.read().await.len()
    }
}

/// Internal cache key to identify unique client configs.
#[derive(Clone, PartialEq, Eq, Hash)]
struct ClientKey {
    provider: LlmProvider,
    endpoint: String,
    model: String,
    api_key: String,
    timeout: Option<u64>,
}

impl From<&LlmModelConfig> for ClientKey {
    fn from(cfg: &LlmModelConfig) -> Self {
        Self {
            provider: cfg.provider,
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            api_key: cfg.api_key.clone(),
            timeout: cfg.timeout_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockLlm, MockReply};

    #[tokio::test]
    async fn profiles_share_a_client_and_send_their_temperature() {
        let mock = MockLlm::start(vec![
            MockReply::content("{\"mentioned_drugs\":[]}"),
            MockReply::content("answer"),
        ])
        .await;
        let svc = LlmServiceProfiles::from_base(&mock.config(LlmProvider::OpenAI), Some(5)).unwrap();

        let a = svc.chat_extraction(&[ChatMessage::user("q")]).await.unwrap();
        let b = svc.chat_harmonization(&[ChatMessage::user("q")]).await.unwrap();
        assert_eq!(a, "{\"mentioned_drugs\":[]}");
        assert_eq!(b, "answer");
        assert_eq!(svc.cached_clients().await, 1);

        let reqs = mock.requests().await;
        assert_eq!(reqs[0].body["temperature"], 0.0);
        let t = reqs[1].body["temperature"].as_f64().unwrap();
        assert!((t - 0.2).abs() < 1e-6);
    }

    #[tokio::test]
    async fn health_all_dedups_equivalent_profiles() {
        let mock = MockLlm::start(vec![]).await;
        let svc = LlmServiceProfiles::from_base(&mock.config(LlmProvider::Zhipu), Some(5)).unwrap();

        let statuses = svc.health_all().await;
        assert_eq!(statuses.len(), 1);
        assert!(statuses[0].ok);
    }

    #[tokio::test]
    async fn invalid_profile_surfaces_error_instead_of_panicking() {
        let mock = MockLlm::start(vec![]).await;
        let mut cfg = mock.config(LlmProvider::DeepSeek);
        cfg.api_key = String::new();
        let svc = LlmServiceProfiles::from_base(&cfg, None).unwrap();

        let err = svc.chat_extraction(&[ChatMessage::user("q")]).await.unwrap_err();
        assert!(!err.is_upstream());
        assert!(mock.requests().await.is_empty());
    }
}
