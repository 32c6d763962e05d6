//! Minimal openFDA client for the label and NDC endpoints.
//!
//! Lookups are best-effort: HTTP failures, non-200 answers and empty result
//! lists are logged and reported as `None`, so one bad seed never aborts a run.

use std::time::Duration;

use anyhow::{Context, Result};
use drug_db::openfda::RawEntry;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

pub const LABEL_URL: &str = "https://api.fda.gov/drug/label.json";
pub const NDC_URL: &str = "https://api.fda.gov/drug/ndc.json";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Pause after every request when running without an API key budget in mind.
pub const DEFAULT_PAUSE: Duration = Duration::from_millis(500);

pub struct OpenFdaClient {
    http: reqwest::Client,
    label_url: String,
    ndc_url: String,
    api_key: Option<String>,
    pause: Duration,
}

impl OpenFdaClient {
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Self::with_endpoints(LABEL_URL, NDC_URL, api_key, DEFAULT_PAUSE)
    }

    pub fn with_endpoints(
        label_url: &str,
        ndc_url: &str,
        api_key: Option<String>,
        pause: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            label_url: label_url.to_string(),
            ndc_url: ndc_url.to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            pause,
        })
    }

    /// First label whose generic or brand name matches `generic`.
    pub async fn label(&self, generic: &str) -> Option<Value> {
        info!(%generic, "label lookup");
        let search = search_expr("openfda.", generic);
        self.first_result(&self.label_url, &search).await
    }

    /// First NDC product whose generic or brand name matches `generic`.
    pub async fn ndc(&self, generic: &str) -> Option<Value> {
        info!(%generic, "NDC lookup");
        let search = search_expr("", generic);
        self.first_result(&self.ndc_url, &search).await
    }

    /// Fetches label and NDC for every seed, in order, with a progress bar.
    pub async fn fetch_all(&self, generics: &[String]) -> Vec<RawEntry> {
        let pb = ProgressBar::new(generics.len() as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
        );

        let mut entries = Vec::with_capacity(generics.len());
        for (idx, generic) in generics.iter().enumerate() {
            pb.set_message(generic.clone());
            debug!(index = idx + 1, total = generics.len(), %generic, "processing");

            let label_raw = self.label(generic).await;
            tokio::time::sleep(self.pause).await;
            let ndc_raw = self.ndc(generic).await;
            tokio::time::sleep(self.pause).await;

            if label_raw.is_none() {
                warn!(%generic, "no openFDA label found");
            }
            entries.push(RawEntry {
                generic_query: generic.clone(),
                label_raw,
                ndc_raw,
            });
            pb.inc(1);
        }
        pb.finish_with_message("done");
        entries
    }

    #[instrument(skip(self, search))]
    async fn first_result(&self, url: &str, search: &str) -> Option<Value> {
        let mut query: Vec<(&str, &str)> = vec![("search", search), ("limit", "1")];
        if let Some(key) = &self.api_key {
            query.push(("api_key", key.as_str()));
        }

        let res = match self.http.get(url).query(&query).send().await {
            Ok(res) => res,
            Err(e) => {
                warn!(error = %e, "openFDA request failed");
                return None;
            }
        };
        let status = res.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "openFDA request failed");
            return None;
        }
        let body: Value = match res.json().await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "openFDA returned invalid JSON");
                return None;
            }
        };
        body.get("results")
            .and_then(Value::as_array)
            .and_then(|r| r.first())
            .cloned()
    }
}

/// `{prefix}generic_name:"{name}" OR {prefix}brand_name:"{name}"`
pub fn search_expr(prefix: &str, name: &str) -> String {
    let name = name.replace('"', "");
    format!(r#"{prefix}generic_name:"{name}" OR {prefix}brand_name:"{name}""#)
}
