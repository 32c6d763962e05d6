//! Health information harmonizer with a single public entry point.
//!
//! Public API: [`Harmonizer::ask`]. It extracts drug mentions from the
//! question (LLM call #1), resolves them against the local [`DrugDb`], and
//! either asks the LLM for a templated markdown answer grounded on the
//! matched records (LLM call #2) or returns a fixed safety guardrail when
//! none of the recognized drugs is in the database.

mod api_types;
mod error;
mod extract;
mod lang;
mod leaflet;
pub mod prompt;

pub use api_types::{Analysis, AskRequest, AskResponse, Source};
pub use error::HarmonizerError;
pub use extract::{DrugMention, extract_drugs, parse_mentions, recover_json};
pub use lang::{GUARDRAIL_SOURCE, Lang};
pub use leaflet::normalize_leaflet;

use std::sync::Arc;

use ai_llm_service::service_profiles::LlmServiceProfiles;
use drug_db::{DrugDb, DrugRecord};
use tracing::{info, instrument};

/// Shared pipeline state: the immutable drug DB and the LLM profiles.
///
/// Cheap to clone; construct once at startup.
#[derive(Clone)]
pub struct Harmonizer {
    db: Arc<DrugDb>,
    llm: Arc<LlmServiceProfiles>,
}

impl Harmonizer {
    pub fn new(db: Arc<DrugDb>, llm: Arc<LlmServiceProfiles>) -> Self {
        Self { db, llm }
    }

    pub fn db(&self) -> &DrugDb {
        &self.db
    }

    pub fn llm(&self) -> &LlmServiceProfiles {
        &self.llm
    }

    /// Answers one question.
    ///
    /// 1. Blank question → prompt for input, no LLM call.
    /// 2. Extract mentions; look each up by its uppercased normalized name.
    /// 3. Any known drug → harmonized answer, plus an "unlisted" note for the rest.
    /// 4. Only unknown drugs → safety guardrail, no second LLM call.
    /// 5. Nothing extracted → "no drug names recognized".
    ///
    /// # Errors
    /// Returns [`HarmonizerError::Llm`] when either LLM call fails.
    #[instrument(skip_all, fields(lang = req.lang().as_str()))]
    pub async fn ask(&self, req: &AskRequest) -> Result<AskResponse, HarmonizerError> {
        let lang = req.lang();
        let q = req.question.trim();

        if q.is_empty() {
            return Ok(AskResponse::message_only(q, lang.empty_question(), lang));
        }

        let mentions = extract_drugs(&self.llm, q).await?;
        let recognized: Vec<String> = mentions
            .iter()
            .filter(|m| !m.normalized.is_empty())
            .map(|m| m.normalized.clone())
            .collect();

        let (known, unknown) = self.partition(&mentions);
        info!(
            mentions = mentions.len(),
            known = known.len(),
            unknown = unknown.len(),
            "mentions resolved against local DB"
        );

        if !known.is_empty() {
            let messages = prompt::harmonize_messages(q, &known, lang);
            let mut answer = self.llm.chat_harmonization(&messages).await?;
            if !unknown.is_empty() {
                answer.push_str(&lang.unlisted_note(&unknown.join(", ")));
            }

            let (db_name, db_note) = lang.local_db_source();
            let (ai_name, ai_note) = lang.harmonization_source();
            return Ok(AskResponse::new(
                q,
                known.iter().map(|d| d.generic_name.clone()).collect(),
                recognized,
                answer,
                lang,
                vec![Source::new(db_name, db_note), Source::new(ai_name, ai_note)],
            ));
        }

        if !unknown.is_empty() {
            let answer = lang.guardrail_answer(&unknown.join(", "));
            return Ok(AskResponse::new(
                q,
                Vec::new(),
                recognized,
                answer,
                lang,
                vec![Source::new(GUARDRAIL_SOURCE, lang.guardrail_note())],
            ));
        }

        Ok(AskResponse::message_only(q, lang.no_drugs_recognized(), lang))
    }

    /// Splits mentions into DB records (unique by generic name) and
    /// display names of unmatched mentions (unique, first-seen order).
    fn partition(&self, mentions: &[DrugMention]) -> (Vec<&DrugRecord>, Vec<String>) {
        let mut known: Vec<&DrugRecord> = Vec::new();
        let mut unknown: Vec<String> = Vec::new();

        for m in mentions {
            let key = m.normalized.trim().to_uppercase();
            match self.db.lookup(&key) {
                Some(rec) => {
                    if !known.iter().any(|k| k.generic_name == rec.generic_name) {
                        known.push(rec);
                    }
                }
                None => {
                    let name = if m.raw.is_empty() { key } else { m.raw.clone() };
                    if !unknown.contains(&name) {
                        unknown.push(name);
                    }
                }
            }
        }
        (known, unknown)
    }
}

#[cfg(test)]
mod tests {
    use ai_llm_service::{
        LlmProvider,
        test_support::{MockLlm, MockReply},
    };

    use super::*;

    fn db() -> Arc<DrugDb> {
        Arc::new(DrugDb::from_records(vec![
            DrugRecord {
                base_name: "IBUPROFEN".into(),
                generic_name: "IBUPROFEN".into(),
                aliases: vec!["ADVIL".into(), "布洛芬".into()],
                category: "NSAID".into(),
                ..Default::default()
            },
            DrugRecord {
                base_name: "ACETAMINOPHEN".into(),
                generic_name: "ACETAMINOPHEN".into(),
                aliases: vec!["TYLENOL".into()],
                ..Default::default()
            },
        ]))
    }

    async fn harmonizer(replies: Vec<MockReply>) -> (Harmonizer, MockLlm) {
        let mock = MockLlm::start(replies).await;
        let llm = LlmServiceProfiles::from_base(&mock.config(LlmProvider::OpenAI), Some(5)).unwrap();
        (Harmonizer::new(db(), Arc::new(llm)), mock)
    }

    fn req(question: &str, lang: Option<Lang>) -> AskRequest {
        AskRequest {
            question: question.into(),
            lang,
        }
    }

    #[tokio::test]
    async fn blank_question_skips_llm() {
        let (h, mock) = harmonizer(vec![]).await;
        let resp = h.ask(&req("   ", None)).await.unwrap();
        assert_eq!(resp.echo, "");
        assert_eq!(resp.answer, "请描述你看到的健康信息。");
        assert!(resp.sources.is_empty());
        assert!(mock.requests().await.is_empty());
    }

    #[tokio::test]
    async fn known_and_unknown_drugs() {
        let extraction = r#"{"mentioned_drugs":[
            {"raw":"Advil","normalized":"ibuprofen"},
            {"raw":"布洛芬","normalized":"ibuprofen"},
            {"raw":"Zyrtec","normalized":"cetirizine"},
            {"raw":"","normalized":"cetirizine"}
        ]}"#;
        let (h, mock) = harmonizer(vec![
            MockReply::content(extraction),
            MockReply::content("### What you are concerned about\n- ..."),
        ])
        .await;

        let resp = h
            .ask(&req("  Can I take Advil with Zyrtec?  ", Some(Lang::En)))
            .await
            .unwrap();

        assert_eq!(resp.echo, "Can I take Advil with Zyrtec?");
        assert_eq!(resp.matched_drugs, vec!["IBUPROFEN"]);
        assert_eq!(
            resp.recognized_drugs,
            vec!["ibuprofen", "ibuprofen", "cetirizine", "cetirizine"]
        );
        assert_eq!(
            resp.answer,
            "### What you are concerned about\n- ...\n\n[Note] Unlisted: Zyrtec, CETIRIZINE"
        );
        assert_eq!(resp.analysis.summary, resp.answer);
        assert_eq!(resp.sources[0].name, "Local DB");
        assert_eq!(resp.sources[1].name, "AI Harmonization");

        let reqs = mock.requests().await;
        assert_eq!(reqs.len(), 2);
        let harmonize = &reqs[1];
        assert!(harmonize.message(0).contains("Health Information Harmonizer"));
        assert!(harmonize.message(1).contains("1. Generic name: IBUPROFEN"));
        assert!(!harmonize.message(1).contains("2. Generic name"));
        assert_eq!(harmonize.message(2), "Can I take Advil with Zyrtec?");
    }

    #[tokio::test]
    async fn only_unknown_drugs_hit_the_guardrail() {
        let (h, mock) = harmonizer(vec![MockReply::content(
            r#"{"mentioned_drugs":[{"raw":"Zyrtec","normalized":"cetirizine"}]}"#,
        )])
        .await;

        let resp = h.ask(&req("Zyrtec 可以吗", None)).await.unwrap();
        assert!(resp.matched_drugs.is_empty());
        assert_eq!(resp.recognized_drugs, vec!["cetirizine"]);
        assert!(resp.answer.starts_with("系统识别到您询问的药物名称：Zyrtec。"));
        assert_eq!(resp.sources.len(), 1);
        assert_eq!(resp.sources[0].name, GUARDRAIL_SOURCE);
        assert_eq!(resp.sources[0].note, "语义识别完成，但未匹配到受控数据源。");
        assert_eq!(mock.requests().await.len(), 1);
    }

    #[tokio::test]
    async fn nothing_extracted() {
        let (h, _mock) = harmonizer(vec![MockReply::content(r#"{"mentioned_drugs":[]}"#)]).await;
        let resp = h.ask(&req("I have a headache", Some(Lang::En))).await.unwrap();
        assert_eq!(resp.answer, "No drug names recognized.");
        assert!(resp.recognized_drugs.is_empty());
        assert!(resp.sources.is_empty());
    }

    #[tokio::test]
    async fn null_extraction_content_is_no_drugs() {
        let (h, mock) = harmonizer(vec![MockReply::raw(
            r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#,
        )])
        .await;
        let resp = h.ask(&req("Advil?", Some(Lang::En))).await.unwrap();
        assert_eq!(resp.answer, "No drug names recognized.");
        assert!(resp.matched_drugs.is_empty());
        assert_eq!(mock.requests().await.len(), 1);
    }

    #[tokio::test]
    async fn alias_normalization_resolves_via_db() {
        let (h, _mock) = harmonizer(vec![
            MockReply::content(r#"{"mentioned_drugs":[{"raw":"泰诺","normalized":"tylenol"}]}"#),
            MockReply::content("答案"),
        ])
        .await;
        let resp = h.ask(&req("泰诺", None)).await.unwrap();
        assert_eq!(resp.matched_drugs, vec!["ACETAMINOPHEN"]);
        assert_eq!(resp.answer, "答案");
        assert_eq!(resp.sources[0].name, "本地数据库");
    }

    #[tokio::test]
    async fn harmonization_failure_is_an_error() {
        let (h, _mock) = harmonizer(vec![
            MockReply::content(r#"{"mentioned_drugs":[{"raw":"Advil","normalized":"ibuprofen"}]}"#),
            MockReply::status(503, "overloaded"),
        ])
        .await;
        let err = h.ask(&req("Advil?", None)).await.unwrap_err();
        assert!(err.is_upstream());
    }
}
