//! Public request/response types re-used by the HTTP layer.

use serde::{Deserialize, Serialize};

use crate::lang::Lang;

/// Body of `POST /ask`.
///
/// # Example
/// ```
/// use harmonizer::{AskRequest, Lang};
/// let req: AskRequest = serde_json::from_str(r#"{"question":"Advil?","lang":null}"#).unwrap();
/// assert_eq!(req.lang(), Lang::Zh);
/// ```
#[derive(Clone, Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(default)]
    pub lang: Option<Lang>,
}

impl AskRequest {
    /// Requested language, `zh` when absent or `null`.
    pub fn lang(&self) -> Lang {
        self.lang.unwrap_or_default()
    }
}

/// Body of a successful `/ask` response.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AskResponse {
    /// Trimmed question.
    pub echo: String,
    /// Generic names of the records the answer was grounded on.
    pub matched_drugs: Vec<String>,
    /// Non-empty normalized names returned by extraction, in order.
    pub recognized_drugs: Vec<String>,
    pub analysis: Analysis,
    /// Same text as `analysis.summary`.
    pub answer: String,
    pub disclaimer: String,
    pub sources: Vec<Source>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Analysis {
    pub summary: String,
}

/// Provenance entry shown under the answer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Source {
    pub name: String,
    pub note: String,
    pub url: Option<String>,
}

impl Source {
    pub fn new(name: &str, note: &str) -> Self {
        Self {
            name: name.to_string(),
            note: note.to_string(),
            url: None,
        }
    }
}

impl AskResponse {
    /// Response carrying a fixed message and no drug information.
    pub fn message_only(echo: &str, message: &str, lang: Lang) -> Self {
        Self::new(echo, Vec::new(), Vec::new(), message.to_string(), lang, Vec::new())
    }

    pub(crate) fn new(
        echo: &str,
        matched_drugs: Vec<String>,
        recognized_drugs: Vec<String>,
        answer: String,
        lang: Lang,
        sources: Vec<Source>,
    ) -> Self {
        Self {
            echo: echo.to_string(),
            matched_drugs,
            recognized_drugs,
            analysis: Analysis {
                summary: answer.clone(),
            },
            answer,
            disclaimer: lang.disclaimer().to_string(),
            sources,
        }
    }
}
