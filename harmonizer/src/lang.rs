//! Response language and every user-facing fixed string.

use serde::{Deserialize, Serialize};

/// Language of the answer. Anything but `zh` / `en` is rejected on decode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    Zh,
    En,
}

impl Lang {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lang::Zh => "zh",
            Lang::En => "en",
        }
    }

    pub fn disclaimer(&self) -> &'static str {
        match self {
            Lang::Zh => "本回答仅整合公开健康信息作一般性参考，不替代医疗诊断或治疗。",
            Lang::En => {
                "This answer harmonizes public health information for general reference only and does not replace professional diagnosis or treatment."
            }
        }
    }

    pub fn empty_question(&self) -> &'static str {
        match self {
            Lang::Zh => "请描述你看到的健康信息。",
            Lang::En => "Please describe the health information.",
        }
    }

    pub fn no_drugs_recognized(&self) -> &'static str {
        match self {
            Lang::Zh => "未识别到药物名称。",
            Lang::En => "No drug names recognized.",
        }
    }

    /// Appended to a harmonized answer when some mentioned drugs are not in the DB.
    pub fn unlisted_note(&self, names: &str) -> String {
        match self {
            Lang::Zh => format!("\n\n【额外提示】未收录：{names}"),
            Lang::En => format!("\n\n[Note] Unlisted: {names}"),
        }
    }

    /// Fixed answer when drugs were recognized but none is in the DB.
    pub fn guardrail_answer(&self, names: &str) -> String {
        match self {
            Lang::Zh => format!(
                "系统识别到您询问的药物名称：{names}。\n\n\
                 **安全提示**：该药物暂未收录于合规数据库中。AI 不会生成用药建议。\n\n\
                 建议咨询医生或药剂师获取专业意见。"
            ),
            Lang::En => format!(
                "System identified: {names}.\n\n\
                 **Safety Notice**: This drug is not in our verified database. AI will NOT generate medical advice."
            ),
        }
    }

    pub fn guardrail_note(&self) -> &'static str {
        match self {
            Lang::Zh => "语义识别完成，但未匹配到受控数据源。",
            Lang::En => "Semantic recognition complete, no controlled source matched.",
        }
    }

    pub fn local_db_source(&self) -> (&'static str, &'static str) {
        match self {
            Lang::Zh => ("本地数据库", "匹配受控来源"),
            Lang::En => ("Local DB", "Matched a controlled source"),
        }
    }

    pub fn harmonization_source(&self) -> (&'static str, &'static str) {
        match self {
            Lang::Zh => ("AI 调和解释", "基于结构化数据生成"),
            Lang::En => ("AI Harmonization", "Generated from structured data"),
        }
    }
}

/// Source name shown for the guardrail answer, in both languages.
pub const GUARDRAIL_SOURCE: &str = "System Safety Guardrail";
