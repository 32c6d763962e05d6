use std::path::PathBuf;

/// Default location of the structured database, relative to the working directory.
pub const DEFAULT_DB_PATH: &str = "data/otc_db.json";

/// Env var overriding [`DEFAULT_DB_PATH`].
pub const DB_PATH_VAR: &str = "OTC_DB_PATH";

/// Resolves the database path from `OTC_DB_PATH`, falling back to the default.
pub fn db_path_from_env() -> PathBuf {
    db_path_from(std::env::var(DB_PATH_VAR).ok())
}

pub(crate) fn db_path_from(value: Option<String>) -> PathBuf {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_override_falls_back_to_default() {
        assert_eq!(db_path_from(None), PathBuf::from(DEFAULT_DB_PATH));
        assert_eq!(db_path_from(Some("  ".into())), PathBuf::from(DEFAULT_DB_PATH));
        assert_eq!(
            db_path_from(Some("/srv/otc.json".into())),
            PathBuf::from("/srv/otc.json")
        );
    }
}
