//! Conversion of raw openFDA label payloads into [`DrugRecord`]s.
//!
//! The raw database is a JSON array of [`RawEntry`] objects as produced by the
//! seed-list fetcher. Only a small subset of the label is used:
//! - `openfda.generic_name` / `brand_name` / `substance_name` / `pharm_class_*`
//! - `indications_and_usage` / `uses`
//! - `contraindications`
//! - `warnings` / `warnings_and_cautions` / `precautions`
//! - `boxed_warning`
//! - `pediatric_use` / `geriatric_use`
//!
//! All names are stored uppercase, matching the lookup in `/ask`.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{DrugDbError, DrugRecord};

/// One fetched seed entry as stored in `otc_db_openfda_raw.json`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RawEntry {
    pub generic_query: String,
    pub label_raw: Option<Value>,
    pub ndc_raw: Option<Value>,
}

const PHARM_CLASS_KEYS: [&str; 4] = [
    "pharm_class_epc",
    "pharm_class_pe",
    "pharm_class_cs",
    "pharm_class_moa",
];

/// Converts a whole raw document (top level must be an array).
///
/// Non-object entries are skipped; entries without a label become stub records.
///
/// # Errors
/// Returns [`DrugDbError::NotAList`] if `raw` is not an array.
pub fn convert_raw_db(raw: &Value) -> Result<Vec<DrugRecord>, DrugDbError> {
    let entries = raw.as_array().ok_or_else(|| DrugDbError::NotAList {
        what: "raw openFDA DB".to_string(),
    })?;
    info!(entries = entries.len(), "converting raw openFDA entries");

    let mut out = Vec::with_capacity(entries.len());
    for (idx, entry) in entries.iter().enumerate() {
        let Some(obj) = entry.as_object() else {
            warn!(index = idx, "skipping non-object entry");
            continue;
        };

        let query = obj
            .get("generic_query")
            .map(value_to_string)
            .unwrap_or_default()
            .trim()
            .to_string();

        match obj.get("label_raw").filter(|l| has_content(l)) {
            Some(label) => {
                debug!(index = idx + 1, total = entries.len(), generic_query = %query, "converting");
                let fallback = if query.is_empty() { "unknown" } else { query.as_str() };
                out.push(record_from_label(label, fallback));
            }
            None => {
                warn!(index = idx, generic_query = %query, "no label_raw; writing stub record");
                out.push(stub_record(&query));
            }
        }
    }
    Ok(out)
}

/// Record for a seed whose label could not be fetched.
pub fn stub_record(query: &str) -> DrugRecord {
    let name = match query.trim() {
        "" => "UNKNOWN".to_string(),
        q => q.to_uppercase(),
    };
    DrugRecord {
        base_name: name.clone(),
        generic_name: name.clone(),
        aliases: vec![name],
        ..Default::default()
    }
}

/// Maps a single openFDA label into a structured record.
pub fn record_from_label(label: &Value, generic_fallback: &str) -> DrugRecord {
    let null = Value::Null;
    let ofd = label.get("openfda").unwrap_or(&null);

    let generic_name = ofd
        .get("generic_name")
        .and_then(first_string)
        .map(|g| g.trim().to_string())
        .filter(|g| !g.is_empty())
        .unwrap_or_else(|| generic_fallback.trim().to_string());

    let mut aliases: Vec<String> = Vec::new();
    if !generic_name.is_empty() {
        aliases.push(generic_name.clone());
    }
    aliases.extend(string_list(ofd.get("brand_name")));
    aliases.extend(string_list(ofd.get("substance_name")));

    let category = PHARM_CLASS_KEYS
        .iter()
        .flat_map(|k| string_list(ofd.get(*k)))
        .next()
        .unwrap_or_default();

    // "Nonsteroidal Anti-inflammatory Drug [EPC]" → "NONSTEROIDAL ANTI-INFLAMMATORY DRUG"
    let class_alias = category
        .split('[')
        .next()
        .unwrap_or_default()
        .trim()
        .to_uppercase();
    if !class_alias.is_empty() && !aliases.iter().any(|a| a.to_uppercase() == class_alias) {
        debug!(alias = %class_alias, "added category alias");
        aliases.push(class_alias);
    }

    let mut seen = HashSet::new();
    let aliases: Vec<String> = aliases
        .iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty() && seen.insert(a.to_lowercase()))
        .map(str::to_uppercase)
        .collect();

    let indications = fields(label, &["indications_and_usage", "uses"]);
    let contraindications = fields(label, &["contraindications"]);
    let warnings = fields(label, &["warnings", "warnings_and_cautions"]);
    let cautions = [warnings.clone(), fields(label, &["precautions"])].concat();
    let age_note = fields(label, &["pediatric_use", "geriatric_use"]).join(" ");

    let boxed = fields(label, &["boxed_warning"]);
    let important_warnings = if boxed.is_empty() { warnings } else { boxed };

    DrugRecord {
        base_name: generic_name.to_uppercase(),
        generic_name: generic_name.to_uppercase(),
        aliases,
        category,
        indications,
        contraindications,
        cautions,
        age_note,
        important_warnings,
    }
}

/// Concatenates the string lists of several label fields.
fn fields(label: &Value, keys: &[&str]) -> Vec<String> {
    keys.iter().flat_map(|k| string_list(label.get(*k))).collect()
}

/// openFDA fields are usually arrays of strings but occasionally scalars.
fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .filter(|v| !v.is_null())
            .map(value_to_string)
            .filter(|s| !s.is_empty())
            .collect(),
        Some(other) => {
            let s = value_to_string(other);
            if s.is_empty() { Vec::new() } else { vec![s] }
        }
    }
}

fn first_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Array(items) => items.first().map(value_to_string),
        other => Some(value_to_string(other)),
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn has_content(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Object(m) => !m.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn ibuprofen_label() -> Value {
        json!({
            "openfda": {
                "generic_name": [" Ibuprofen "],
                "brand_name": ["Advil", "ADVIL", "Motrin IB"],
                "substance_name": ["IBUPROFEN"],
                "pharm_class_epc": ["Nonsteroidal Anti-inflammatory Drug [EPC]"],
                "pharm_class_moa": ["Cyclooxygenase Inhibitors [MoA]"]
            },
            "indications_and_usage": ["temporarily relieves minor aches and pains"],
            "uses": ["reduces fever"],
            "warnings": ["Allergy alert: ibuprofen may cause a severe allergic reaction"],
            "precautions": ["do not exceed recommended dose"],
            "pediatric_use": ["children under 12: ask a doctor"],
            "geriatric_use": "use with care in older adults",
            "contraindications": []
        })
    }

    #[test]
    fn label_fields_are_mapped_and_uppercased() {
        let rec = record_from_label(&ibuprofen_label(), "ibuprofen");
        assert_eq!(rec.generic_name, "IBUPROFEN");
        assert_eq!(rec.base_name, "IBUPROFEN");
        assert_eq!(
            rec.aliases,
            vec![
                "IBUPROFEN",
                "ADVIL",
                "MOTRIN IB",
                "NONSTEROIDAL ANTI-INFLAMMATORY DRUG"
            ]
        );
        assert_eq!(rec.category, "Nonsteroidal Anti-inflammatory Drug [EPC]");
        assert_eq!(rec.indications.len(), 2);
        assert!(rec.contraindications.is_empty());
        assert_eq!(rec.cautions.len(), 2);
        assert_eq!(
            rec.age_note,
            "children under 12: ask a doctor use with care in older adults"
        );
        assert_eq!(rec.important_warnings, rec.cautions[..1].to_vec());
    }

    #[test]
    fn boxed_warning_wins_and_fallback_name_is_used() {
        let label = json!({
            "openfda": {},
            "boxed_warning": ["Liver warning"],
            "warnings": ["general warning"]
        });
        let rec = record_from_label(&label, "acetaminophen");
        assert_eq!(rec.generic_name, "ACETAMINOPHEN");
        assert_eq!(rec.aliases, vec!["ACETAMINOPHEN"]);
        assert_eq!(rec.important_warnings, vec!["Liver warning"]);
        assert_eq!(rec.category, "");
    }

    #[test]
    fn raw_db_conversion_handles_stubs_and_junk() {
        let raw = json!([
            {"generic_query": "ibuprofen", "label_raw": ibuprofen_label(), "ndc_raw": null},
            {"generic_query": " loratadine ", "label_raw": null},
            {"generic_query": "", "label_raw": {}},
            "not an object"
        ]);
        let recs = convert_raw_db(&raw).unwrap();
        assert_eq!(recs.len(), 3);
        assert_eq!(recs[0].generic_name, "IBUPROFEN");
        assert_eq!(recs[1], stub_record("LORATADINE"));
        assert_eq!(recs[1].aliases, vec!["LORATADINE"]);
        assert_eq!(recs[2].generic_name, "UNKNOWN");

        let err = convert_raw_db(&json!({"entries": []})).unwrap_err();
        assert!(matches!(err, DrugDbError::NotAList { .. }));
    }

    #[test]
    fn raw_entry_round_trips_through_serde() {
        let entry: RawEntry =
            serde_json::from_value(json!({"generic_query": "cetirizine"})).unwrap();
        assert!(entry.label_raw.is_none());
        let v = serde_json::to_value(&entry).unwrap();
        assert_eq!(v["ndc_raw"], Value::Null);
    }
}
