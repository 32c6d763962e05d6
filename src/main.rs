use std::error::Error;

use ai_llm_service::telemetry::{self, TARGET_PREFIX};
use api::{ApiConfig, AppState};
use tracing::{Level, info, warn};
use tracing_subscriber::{Layer, filter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // `.env` is optional; real env vars always win.
    let dotenv = dotenvy::dotenv();

    let env_filter = telemetry::env_filter_with_level("info", Level::INFO);
    let app_layer = fmt::layer()
        .with_target(false)
        .with_filter(filter::filter_fn(|meta| !meta.target().starts_with(TARGET_PREFIX)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(app_layer)
        .with(telemetry::layer())
        .try_init()?;

    match dotenv {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => info!("no .env file, using process environment"),
        Err(e) => warn!(error = %e, "ignoring unreadable .env file"),
    }

    let cfg = ApiConfig::from_env();
    let state = AppState::from_config(&cfg)?;
    api::start(&cfg, state).await?;

    Ok(())
}
