use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use ai_llm_service::service_profiles::LlmServiceProfiles;
use drug_db::{DB_PATH_VAR, DEFAULT_DB_PATH, DrugDb};
use harmonizer::Harmonizer;
use tracing::info;

use crate::error_handler::AppError;

pub const DEFAULT_API_ADDRESS: &str = "0.0.0.0:8000";
pub const DEFAULT_STATIC_DIR: &str = "static";

/// Timeout for `/health` probes against the LLM provider.
const HEALTH_TIMEOUT_SECS: u64 = 10;

/// Listener and file locations resolved from the environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
    /// `API_ADDRESS`, e.g. `0.0.0.0:8000`.
    pub address: String,
    /// `OTC_DB_PATH`.
    pub db_path: PathBuf,
    /// `STATIC_DIR`; holds `index.html` and the `/static` assets.
    pub static_dir: PathBuf,
}

impl ApiConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Blank values fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        Self {
            address: get("API_ADDRESS", DEFAULT_API_ADDRESS),
            db_path: PathBuf::from(get(DB_PATH_VAR, DEFAULT_DB_PATH)),
            static_dir: PathBuf::from(get("STATIC_DIR", DEFAULT_STATIC_DIR)),
        }
    }
}

/// Shared state for all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub harmonizer: Harmonizer,
    pub static_dir: PathBuf,
}

impl AppState {
    pub fn new(harmonizer: Harmonizer, static_dir: impl AsRef<Path>) -> Self {
        Self {
            harmonizer,
            static_dir: static_dir.as_ref().to_path_buf(),
        }
    }

    /// Loads the drug database and LLM profiles named by `cfg`.
    ///
    /// # Errors
    /// [`AppError::DrugDb`] when the database cannot be loaded, and
    /// [`AppError::Llm`] when the LLM environment is incomplete.
    pub fn from_config(cfg: &ApiConfig) -> Result<Self, AppError> {
        let db = DrugDb::load(&cfg.db_path)?;
        let llm = LlmServiceProfiles::from_env(Some(HEALTH_TIMEOUT_SECS))?;
        let (extraction, _) = llm.profiles();
        info!(
            drugs = db.len(),
            provider = %extraction.provider,
            model = %extraction.model,
            "application state ready"
        );
        Ok(Self::new(
            Harmonizer::new(Arc::new(db), Arc::new(llm)),
            &cfg.static_dir,
        ))
    }
}
