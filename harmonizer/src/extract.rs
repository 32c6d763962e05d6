//! Drug-name extraction (LLM call #1) and JSON recovery from model output.

use ai_llm_service::{
    AiLlmError,
    error_handler::{ProviderError, ProviderErrorKind},
    service_profiles::LlmServiceProfiles,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{error::HarmonizerError, prompt::extraction_messages};

/// One drug mention as returned by the extraction call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrugMention {
    /// Text as written by the user (brand, Chinese name, vague phrase...).
    pub raw: String,
    /// Lowercase English INN, or empty when the model could not infer one.
    pub normalized: String,
}

/// Recovers a JSON value from model output.
///
/// The whole text is tried first; otherwise the span from the first `{` to
/// the last `}` (which tolerates code fences and chatter around the object).
pub fn recover_json(text: &str) -> Option<Value> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(v) = serde_json::from_str::<Value>(text) {
        return Some(v);
    }
    let (start, end) = (text.find('{')?, text.rfind('}')?);
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

/// Parses extraction output into mentions.
///
/// Non-object items are skipped, fields are trimmed, and items with both
/// fields empty are dropped.
///
/// # Errors
/// Returns a description of the problem when no usable JSON object is found.
pub fn parse_mentions(content: &str) -> Result<Vec<DrugMention>, String> {
    let value = recover_json(content).ok_or("no JSON object found in model output")?;
    let items = match value.get("mentioned_drugs") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => return Err("`mentioned_drugs` is not a list".to_string()),
    };

    Ok(items
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|obj| {
            let field = |k: &str| match obj.get(k) {
                None | Some(Value::Null) => String::new(),
                Some(Value::String(s)) => s.trim().to_string(),
                Some(other) => other.to_string().trim().to_string(),
            };
            let mention = DrugMention {
                raw: field("raw"),
                normalized: field("normalized"),
            };
            (!mention.raw.is_empty() || !mention.normalized.is_empty()).then_some(mention)
        })
        .collect())
}

/// Runs the extraction call for `question`.
///
/// Unparseable model output and replies without message content yield an
/// empty list (logged at `warn`).
///
/// # Errors
/// Propagates LLM transport/provider failures as [`HarmonizerError::Llm`].
pub async fn extract_drugs(
    llm: &LlmServiceProfiles,
    question: &str,
) -> Result<Vec<DrugMention>, HarmonizerError> {
    let content = match llm.chat_extraction(&extraction_messages(question)).await {
        Ok(content) => content,
        Err(AiLlmError::Provider(ProviderError {
            kind: ProviderErrorKind::EmptyChoices,
            provider,
        })) => {
            warn!(%provider, "extraction reply had no message content; treating as no mentions");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };
    debug!(content_len = content.len(), "extraction output received");

    match parse_mentions(&content) {
        Ok(mentions) => {
            info!(count = mentions.len(), "drug mentions extracted");
            Ok(mentions)
        }
        Err(reason) => {
            warn!(%reason, "could not parse extraction output; treating as no mentions");
            Ok(Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use ai_llm_service::{
        LlmProvider,
        test_support::{MockLlm, MockReply},
    };

    use super::*;

    #[test]
    fn recovers_json_from_fenced_output() {
        let text = "Sure!\n```json\n{\"mentioned_drugs\": []}\n```";
        assert_eq!(
            recover_json(text),
            Some(serde_json::json!({"mentioned_drugs": []}))
        );
        assert_eq!(recover_json("   "), None);
        assert_eq!(recover_json("no braces here"), None);
        assert_eq!(recover_json("{ broken"), None);
        assert_eq!(recover_json("} backwards {"), None);
        assert_eq!(
            recover_json("a {\"x\": {\"y\": 1}} b"),
            Some(serde_json::json!({"x": {"y": 1}}))
        );
    }

    #[test]
    fn mentions_are_cleaned() {
        let content = r#"{"mentioned_drugs": [
            {"raw": " 布洛芬 ", "normalized": " ibuprofen "},
            {"raw": "退烧药", "normalized": ""},
            {"raw": "", "normalized": ""},
            "junk",
            {"normalized": "loratadine"}
        ]}"#;
        let got = parse_mentions(content).unwrap();
        assert_eq!(
            got,
            vec![
                DrugMention { raw: "布洛芬".into(), normalized: "ibuprofen".into() },
                DrugMention { raw: "退烧药".into(), normalized: String::new() },
                DrugMention { raw: String::new(), normalized: "loratadine".into() },
            ]
        );
        assert!(parse_mentions("{}").unwrap().is_empty());
        assert!(parse_mentions(r#"{"mentioned_drugs": "ibuprofen"}"#).is_err());
    }

    #[tokio::test]
    async fn extraction_sends_prompt_and_tolerates_garbage() {
        let mock = MockLlm::start(vec![
            MockReply::content(r#"{"mentioned_drugs":[{"raw":"Advil","normalized":"ibuprofen"}]}"#),
            MockReply::content("I could not find any drugs, sorry."),
        ])
        .await;
        let llm = LlmServiceProfiles::from_base(&mock.config(LlmProvider::OpenAI), Some(5)).unwrap();

        let first = extract_drugs(&llm, "Is Advil ok?").await.unwrap();
        assert_eq!(first[0].normalized, "ibuprofen");

        let second = extract_drugs(&llm, "hello").await.unwrap();
        assert!(second.is_empty());

        let reqs = mock.requests().await;
        assert!(reqs[0].message(0).contains("drug-name extraction assistant"));
        assert!(reqs[0].message(1).starts_with("用户输入：Is Advil ok?"));
        assert_eq!(reqs[0].body["temperature"], 0.0);
    }

    #[tokio::test]
    async fn null_content_means_no_mentions() {
        let mock = MockLlm::start(vec![
            MockReply::raw(r#"{"choices":[{"message":{"content":null}}]}"#),
            MockReply::raw(r#"{"choices":[]}"#),
        ])
        .await;
        let llm = LlmServiceProfiles::from_base(&mock.config(LlmProvider::OpenAI), Some(5)).unwrap();

        assert!(extract_drugs(&llm, "Is Advil ok?").await.unwrap().is_empty());
        assert!(extract_drugs(&llm, "Is Advil ok?").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn upstream_failure_propagates() {
        let mock = MockLlm::start(vec![MockReply::status(500, "boom")]).await;
        let llm = LlmServiceProfiles::from_base(&mock.config(LlmProvider::OpenAI), Some(5)).unwrap();

        let err = extract_drugs(&llm, "Is Advil ok?").await.unwrap_err();
        assert!(err.is_upstream());
    }
}
