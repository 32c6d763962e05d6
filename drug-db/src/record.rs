//! Core data models of the drug database.

use serde::{Deserialize, Deserializer, Serialize};

/// One OTC preparation as stored in `otc_db.json`.
///
/// Every field is optional in the file: missing or `null` strings become `""`
/// and missing or `null` lists become `[]`. Unknown fields are ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrugRecord {
    #[serde(deserialize_with = "null_as_default")]
    pub base_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub generic_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub aliases: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(deserialize_with = "null_as_default")]
    pub indications: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub contraindications: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub cautions: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub age_note: String,
    #[serde(deserialize_with = "null_as_default")]
    pub important_warnings: Vec<String>,
}

impl DrugRecord {
    /// Generic name followed by the non-empty aliases; used for text matching.
    pub fn name_candidates(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.generic_name.as_str())
            .chain(self.aliases.iter().map(String::as_str))
            .filter(|n| !n.is_empty())
    }

    /// Grouping key: `base_name`, falling back to `generic_name`.
    pub fn group_key(&self) -> Option<&str> {
        [self.base_name.as_str(), self.generic_name.as_str()]
            .into_iter()
            .find(|s| !s.is_empty())
    }
}

/// Preparations sharing one base name (e.g. tablets, suspension).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DrugGroup {
    pub base_name: String,
    pub preparations: Vec<DrugRecord>,
}

fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}
