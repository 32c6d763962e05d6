//! Static OTC drug database with flat in-memory indices.
//!
//! The database is a JSON array of [`DrugRecord`]s loaded once at startup and
//! never mutated afterwards. Three indices are built over it:
//! - exact `generic_name` → records
//! - exact `base_name` → records
//! - name variants (`generic_name` + aliases), keyed by [`index_key`]
//!
//! [`openfda`] converts raw openFDA labels into the same record shape.

mod config;
mod errors;
mod normalize;
pub mod openfda;
mod record;

pub use config::{DB_PATH_VAR, DEFAULT_DB_PATH, db_path_from_env};
pub use errors::DrugDbError;
pub use normalize::{index_key, is_chinese};
pub use record::{DrugGroup, DrugRecord};

use std::{
    collections::{BTreeSet, HashMap},
    fs,
    path::Path,
};

use tracing::{debug, info, trace};

use crate::normalize::Haystack;

/// Immutable database plus its lookup indices.
///
/// Indices store positions into `records`, so a record's identity is its position.
#[derive(Debug, Default)]
pub struct DrugDb {
    records: Vec<DrugRecord>,
    by_generic: HashMap<String, Vec<usize>>,
    by_base: HashMap<String, Vec<usize>>,
    by_variant: HashMap<String, Vec<usize>>,
}

impl DrugDb {
    /// Loads and indexes the database file at `path`.
    ///
    /// # Errors
    /// Returns [`DrugDbError::Io`] if the file cannot be read, and
    /// [`DrugDbError::Parse`] / [`DrugDbError::NotAList`] if its content is invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DrugDbError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| DrugDbError::io(path, e))?;
        let db = Self::from_json_str(&text, &path.display().to_string())?;
        info!(
            path = %path.display(),
            records = db.len(),
            bases = db.by_base.len(),
            "OTC database loaded"
        );
        Ok(db)
    }

    /// Parses a JSON document; `what` names the source in error messages.
    ///
    /// # Errors
    /// [`DrugDbError::NotAList`] if the top level is not an array, and
    /// [`DrugDbError::Parse`] for malformed JSON or records.
    pub fn from_json_str(text: &str, what: &str) -> Result<Self, DrugDbError> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| DrugDbError::parse(what, e))?;
        if !value.is_array() {
            return Err(DrugDbError::NotAList {
                what: what.to_string(),
            });
        }
        let records: Vec<DrugRecord> =
            serde_json::from_value(value).map_err(|e| DrugDbError::parse(what, e))?;
        Ok(Self::from_records(records))
    }

    /// Builds the indices over already parsed records.
    pub fn from_records(records: Vec<DrugRecord>) -> Self {
        let mut by_generic: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_base: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_variant: HashMap<String, Vec<usize>> = HashMap::new();

        for (i, rec) in records.iter().enumerate() {
            if !rec.generic_name.is_empty() {
                by_generic.entry(rec.generic_name.clone()).or_default().push(i);
            }
            if !rec.base_name.is_empty() {
                by_base.entry(rec.base_name.clone()).or_default().push(i);
            }

            let keys: BTreeSet<String> = rec
                .name_candidates()
                .map(index_key)
                .filter(|k| !k.is_empty())
                .collect();
            for key in keys {
                by_variant.entry(key).or_default().push(i);
            }
        }

        debug!(
            records = records.len(),
            generic_keys = by_generic.len(),
            variant_keys = by_variant.len(),
            "indices built"
        );

        Self {
            records,
            by_generic,
            by_base,
            by_variant,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[DrugRecord] {
        &self.records
    }

    /// All preparations with exactly this generic name, in file order.
    pub fn find_preps_by_generic_name(&self, name: &str) -> Vec<&DrugRecord> {
        self.resolve(self.by_generic.get(name))
    }

    /// First preparation with exactly this generic name.
    pub fn find_by_generic_name(&self, name: &str) -> Option<&DrugRecord> {
        self.first(self.by_generic.get(name))
    }

    /// All preparations under a base name.
    pub fn find_preps_by_base_name(&self, base_name: &str) -> Vec<&DrugRecord> {
        self.resolve(self.by_base.get(base_name))
    }

    /// All base names, sorted.
    pub fn list_all_bases(&self) -> Vec<String> {
        let mut bases: Vec<String> = self.by_base.keys().cloned().collect();
        bases.sort();
        bases
    }

    /// Resolves a single (normalized) drug name to a record.
    ///
    /// Tries, in order: exact generic name, uppercased generic name, and a
    /// case-insensitive match on any name variant (generic name or alias).
    pub fn lookup(&self, name: &str) -> Option<&DrugRecord> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let hit = self
            .find_by_generic_name(name)
            .or_else(|| self.find_by_generic_name(&name.to_uppercase()))
            .or_else(|| self.first(self.by_variant.get(&index_key(name))));
        trace!(name, found = hit.is_some(), "lookup");
        hit
    }

    /// Records whose generic name or any alias occurs in `text`.
    ///
    /// Each record appears at most once, in database order. Blank text matches nothing.
    pub fn find_drugs_in_text_raw(&self, text: &str) -> Vec<&DrugRecord> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        let hay = Haystack::new(text);
        let matched: Vec<&DrugRecord> = self
            .records
            .iter()
            .filter(|rec| rec.name_candidates().any(|n| hay.mentions(n)))
            .collect();
        debug!(matched = matched.len(), "text matched against name variants");
        matched
    }

    /// [`DrugDb::find_drugs_in_text_raw`] grouped by base name.
    pub fn find_drugs_in_text(&self, text: &str) -> Vec<DrugGroup> {
        group_by_base(self.find_drugs_in_text_raw(text))
    }

    fn resolve(&self, ids: Option<&Vec<usize>>) -> Vec<&DrugRecord> {
        ids.map(|ids| ids.iter().map(|&i| &self.records[i]).collect())
            .unwrap_or_default()
    }

    fn first(&self, ids: Option<&Vec<usize>>) -> Option<&DrugRecord> {
        ids.and_then(|ids| ids.first()).map(|&i| &self.records[i])
    }
}

/// Groups records by `base_name` (falling back to `generic_name`).
///
/// Records with neither are dropped. Groups keep first-seen order.
pub fn group_by_base<'a>(records: impl IntoIterator<Item = &'a DrugRecord>) -> Vec<DrugGroup> {
    let mut groups: Vec<DrugGroup> = Vec::new();
    let mut slot: HashMap<&'a str, usize> = HashMap::new();

    for rec in records {
        let Some(key) = rec.group_key() else {
            continue;
        };
        match slot.get(key) {
            Some(&i) => groups[i].preparations.push(rec.clone()),
            None => {
                slot.insert(key, groups.len());
                groups.push(DrugGroup {
                    base_name: key.to_string(),
                    preparations: vec![rec.clone()],
                });
            }
        }
    }
    groups
}

/// Writes records as a pretty-printed JSON array (non-ASCII kept verbatim).
///
/// # Errors
/// Returns [`DrugDbError::Io`] if the file cannot be written.
pub fn save_records(path: impl AsRef<Path>, records: &[DrugRecord]) -> Result<(), DrugDbError> {
    let path = path.as_ref();
    let text =
        serde_json::to_string_pretty(records).map_err(|e| DrugDbError::parse("records", e))?;
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|e| DrugDbError::io(dir, e))?;
    }
    fs::write(path, text).map_err(|e| DrugDbError::io(path, e))?;
    info!(path = %path.display(), records = records.len(), "structured DB written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn rec(base: &str, generic: &str, aliases: &[&str]) -> DrugRecord {
        DrugRecord {
            base_name: base.into(),
            generic_name: generic.into(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            ..Default::default()
        }
    }

    fn sample() -> DrugDb {
        DrugDb::from_records(vec![
            rec("IBUPROFEN", "IBUPROFEN", &["IBUPROFEN", "ADVIL", "布洛芬"]),
            rec("ACETAMINOPHEN", "ACETAMINOPHEN", &["TYLENOL", "对乙酰氨基酚"]),
            rec("IBUPROFEN", "IBUPROFEN", &["MOTRIN IB"]),
            rec("", "LORATADINE", &["CLARITIN"]),
            rec("", "", &[]),
        ])
    }

    #[test]
    fn generic_and_base_indices() {
        let db = sample();
        assert_eq!(db.find_preps_by_generic_name("IBUPROFEN").len(), 2);
        assert!(db.find_preps_by_generic_name("ibuprofen").is_empty());
        assert_eq!(
            db.find_by_generic_name("IBUPROFEN").map(|r| r.aliases[1].as_str()),
            Some("ADVIL")
        );
        assert_eq!(db.find_preps_by_base_name("IBUPROFEN").len(), 2);
        assert_eq!(db.list_all_bases(), vec!["ACETAMINOPHEN", "IBUPROFEN"]);
    }

    #[test]
    fn lookup_falls_back_to_uppercase_then_alias() {
        let db = sample();
        assert_eq!(db.lookup("ACETAMINOPHEN").unwrap().generic_name, "ACETAMINOPHEN");
        assert_eq!(db.lookup(" acetaminophen ").unwrap().generic_name, "ACETAMINOPHEN");
        assert_eq!(db.lookup("Claritin").unwrap().generic_name, "LORATADINE");
        assert_eq!(db.lookup("布洛芬").unwrap().generic_name, "IBUPROFEN");
        assert!(db.lookup("aspirin").is_none());
        assert!(db.lookup("   ").is_none());
    }

    #[test]
    fn text_matching_is_language_aware_and_deduplicated() {
        let db = sample();
        let hits = db.find_drugs_in_text_raw("吃了布洛芬和 Advil，还有tylenol");
        let names: Vec<_> = hits.iter().map(|r| r.generic_name.as_str()).collect();
        assert_eq!(names, vec!["IBUPROFEN", "ACETAMINOPHEN"]);

        assert!(db.find_drugs_in_text_raw("   ").is_empty());
        assert!(db.find_drugs_in_text_raw("nothing relevant").is_empty());
    }

    #[test]
    fn grouping_uses_base_then_generic_and_keeps_order() {
        let db = sample();
        let groups = group_by_base(db.records());
        let keys: Vec<_> = groups.iter().map(|g| g.base_name.as_str()).collect();
        assert_eq!(keys, vec!["IBUPROFEN", "ACETAMINOPHEN", "LORATADINE"]);
        assert_eq!(groups[0].preparations.len(), 2);

        let grouped = db.find_drugs_in_text("ibuprofen or motrin ib, claritin");
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].preparations.len(), 2);
        assert_eq!(grouped[1].base_name, "LORATADINE");
    }

    #[test]
    fn load_rejects_non_list_and_reports_path() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"{{"generic_name":"IBUPROFEN"}}"#).unwrap();
        let err = DrugDb::load(f.path()).unwrap_err();
        assert!(matches!(err, DrugDbError::NotAList { .. }));
        assert!(err.to_string().ends_with("must be a list"));

        let missing = DrugDb::load("/definitely/not/here.json").unwrap_err();
        assert!(missing.to_string().contains("/definitely/not/here.json"));
    }

    #[test]
    fn save_then_load_keeps_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("otc_db.json");
        let db = sample();
        save_records(&path, db.records()).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("布洛芬"));

        let loaded = DrugDb::load(&path).unwrap();
        assert_eq!(loaded.len(), 5);
        assert_eq!(loaded.lookup("advil").unwrap().base_name, "IBUPROFEN");
    }
}
