//! Prompt builders for the two LLM calls and for leaflet normalization.

use ai_llm_service::ChatMessage;
use drug_db::DrugRecord;

use crate::lang::Lang;

/// System instructions for drug-name extraction (LLM call #1).
pub const EXTRACT_SYSTEM: &str = r#"
You are a medical drug-name extraction assistant.

Your task is to read a user's message and identify all medication names mentioned,
including brand names, Chinese names, abbreviations, common misspellings,
and vague phrases (such as "painkiller", "cold medicine", "anti-allergy pill").

Your output must normalize each medication to its English INN generic name,
which will be used to look up drug information in a local FDA-based database.

Normalization rules:

1. When the user mentions a brand name or Chinese name, normalize it to the English generic ingredient.
   Examples:
   - "Advil", "Nurofen", "芬必得", "布洛芬缓释胶囊" → "ibuprofen"
   - "Tylenol", "对乙酰氨基酚", "扑热息痛" → "acetaminophen"
   - "开瑞坦", "氯雷他定片" → "loratadine"
   - "耐信", "埃索美拉唑" → "esomeprazole"

2. When multiple ingredients exist in a brand product, choose the main pharmacologically active ingredient.
   If you are completely unsure, set normalized to an empty string "".

3. The normalized field must contain only the INN name, in lowercase.
   Do not include dosage, form, strength, or duration.
   Example: "ibuprofen", not "ibuprofen 200 mg tablets".

4. If a phrase refers to a class of drugs rather than a specific ingredient:
   - If one likely ingredient can be inferred (for example, "退烧药" → acetaminophen or ibuprofen),
     choose the single most likely INN.
   - If you cannot safely infer a specific INN, set normalized to "".

5. The output must be a single JSON object with the structure:
{
  "mentioned_drugs": [
    {
      "raw": "...",
      "normalized": "..."
    },
    ...
  ]
}

6. Do not output anything other than the JSON object.
Do not wrap it in code fences.
"#;

/// Harmonizer instructions, Chinese output (LLM call #2).
pub const HARMONIZE_SYSTEM_ZH: &str = r#"
你是"AI 健康信息调和器"（Health Information Harmonizer）。

你的任务是：
1. 对用户提到的健康信息、症状描述、药物名称、网络说法进行过滤、解释和调和。
2. 识别信息噪声、夸大、不确定性并给出安全对应方式。
3. 在可能情况下结合本地药物资料解释，但不得编造说明书中不存在的内容。
4. 不诊断疾病、不给具体剂量、不提供个体化治疗方案。

输出结构（Markdown）：
### 你在关心什么
- …

### 信息调和与解释
- …

### 潜在风险信号
- …

### 可以考虑的下一步
- …

禁止使用"你可以吃""必须吃""一定不能吃"等用药性结论。
不输出标题为【声明】的段落，外层系统会添加声明。
"#;

/// Harmonizer instructions, English output (LLM call #2).
pub const HARMONIZE_SYSTEM_EN: &str = r#"
You are the "Health Information Harmonizer".

Your tasks:
1. Filter, interpret, and harmonize the health-related information provided by the user.
2. Identify misinformation, exaggeration, uncertainty, or red-flag signals.
3. When the user mentions medicines, integrate ONLY the provided drug-info. Never invent details.
4. Do NOT diagnose disease, give dosages, or provide individualized treatment plans.

Required Markdown structure:
### What you are concerned about
- …

### Information synthesis and explanation
- …

### Potential risk signals
- …

### Possible next steps
- …

Avoid phrases like "you can take", "must take", "definitely cannot take".
Do NOT output a section titled "Disclaimer"; the system will add it externally.
"#;

/// Leaflet-to-record normalization instructions.
pub const LEAFLET_SYSTEM: &str = r#"
You are a helper that normalizes drug leaflets into structured JSON.

Fields:
- generic_name
- aliases
- category
- indications
- contraindications
- cautions
- age_note
- important_warnings

Constraints:
1. Only extract information present in the leaflet.
2. Use [] or "" for missing fields.
3. Output must be valid JSON without code fences or extra text.
"#;

/// User message for the extraction call.
pub fn extraction_user_prompt(question: &str) -> String {
    format!(
        "用户输入：{question}\n\n\
         请按之前说明，输出 JSON 对象，结构为：\n\
         {{\"mentioned_drugs\": [{{\"raw\": \"...\", \"normalized\": \"...\"}}]}}"
    )
}

pub fn extraction_messages(question: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(EXTRACT_SYSTEM),
        ChatMessage::user(extraction_user_prompt(question)),
    ]
}

/// Renders matched records as numbered, localized blocks separated by a blank line.
pub fn build_drug_context(records: &[&DrugRecord], lang: Lang) -> String {
    if records.is_empty() {
        return match lang {
            Lang::En => "No drug information in local database.".to_string(),
            Lang::Zh => "未找到相关药物的本地数据库信息。".to_string(),
        };
    }

    let labels = match lang {
        Lang::Zh => ["通用名", "别名", "类别", "适应证", "禁忌", "慎用", "警示"],
        Lang::En => [
            "Generic name",
            "Aliases",
            "Category",
            "Indications",
            "Contraindications",
            "Cautions",
            "Warnings",
        ],
    };

    records
        .iter()
        .enumerate()
        .map(|(i, d)| {
            let values = [
                d.generic_name.clone(),
                d.aliases.join(", "),
                d.category.clone(),
                d.indications.join(", "),
                d.contraindications.join(", "),
                d.cautions.join(", "),
                d.important_warnings.join(", "),
            ];
            let mut block = format!("{}. {}: {}", i + 1, labels[0], values[0]);
            for (label, value) in labels.iter().zip(values.iter()).skip(1) {
                block.push_str(&format!("\n   {label}: {value}"));
            }
            block.trim().to_string()
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Messages for the harmonized answer: instructions, drug context, then the question.
pub fn harmonize_messages(question: &str, records: &[&DrugRecord], lang: Lang) -> Vec<ChatMessage> {
    let (system, prefix) = match lang {
        Lang::Zh => (
            HARMONIZE_SYSTEM_ZH,
            "下面是系统收录的相关药物资料（如有），请基于这些信息回答：\n\n",
        ),
        Lang::En => (
            HARMONIZE_SYSTEM_EN,
            "Here is the drug information available in the local database:\n\n",
        ),
    };
    vec![
        ChatMessage::system(system),
        ChatMessage::system(format!("{prefix}{}", build_drug_context(records, lang))),
        ChatMessage::user(question),
    ]
}

pub fn leaflet_messages(leaflet: &str) -> Vec<ChatMessage> {
    vec![ChatMessage::system(LEAFLET_SYSTEM), ChatMessage::user(leaflet)]
}
