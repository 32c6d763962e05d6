//! Leaflet normalization: free-text drug leaflet → structured JSON object.

use ai_llm_service::service_profiles::LlmServiceProfiles;
use serde_json::Value;
use tracing::{debug, info};

use crate::{error::HarmonizerError, extract::recover_json, prompt::leaflet_messages};

/// Sends a leaflet to the LLM (extraction profile) and returns the recovered object.
///
/// # Errors
/// - [`HarmonizerError::Llm`] if the call fails
/// - [`HarmonizerError::InvalidModelOutput`] if no JSON object can be recovered
pub async fn normalize_leaflet(
    llm: &LlmServiceProfiles,
    leaflet: &str,
) -> Result<Value, HarmonizerError> {
    let content = llm.chat_extraction(&leaflet_messages(leaflet)).await?;
    let preview: String = content.chars().take(500).collect();
    debug!(%preview, "raw leaflet model output");

    match recover_json(&content) {
        Some(v @ Value::Object(_)) => {
            info!(fields = v.as_object().map_or(0, |o| o.len()), "leaflet normalized");
            Ok(v)
        }
        _ => Err(HarmonizerError::InvalidModelOutput(
            "no JSON object found in model output".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use ai_llm_service::{
        LlmProvider,
        test_support::{MockLlm, MockReply},
    };

    use super::*;

    #[tokio::test]
    async fn leaflet_output_is_recovered_or_rejected() {
        let mock = MockLlm::start(vec![
            MockReply::content("```json\n{\"generic_name\": \"cetirizine\", \"aliases\": []}\n```"),
            MockReply::content("[1, 2, 3]"),
        ])
        .await;
        let llm = LlmServiceProfiles::from_base(&mock.config(LlmProvider::Zhipu), Some(5)).unwrap();

        let v = normalize_leaflet(&llm, "Cetirizine HCl 10 mg ...").await.unwrap();
        assert_eq!(v["generic_name"], "cetirizine");

        let err = normalize_leaflet(&llm, "???").await.unwrap_err();
        assert!(matches!(err, HarmonizerError::InvalidModelOutput(_)));

        let reqs = mock.requests().await;
        assert!(reqs[0].message(0).contains("normalizes drug leaflets"));
        assert_eq!(reqs[0].message(1), "Cetirizine HCl 10 mg ...");
    }
}
