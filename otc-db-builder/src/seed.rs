//! Seed list of generic names to fetch from openFDA.

use std::{collections::HashSet, fs, path::Path};

use anyhow::{Context, Result};

/// One name per line; blank lines and `#` comments are skipped.
/// Duplicates are removed case-insensitively, keeping the first spelling.
pub fn parse_seed_list(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .filter(|l| seen.insert(l.to_lowercase()))
        .map(str::to_string)
        .collect()
}

pub fn read_seed_list(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("seed list not found at {}", path.display()))?;
    Ok(parse_seed_list(&text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comments_blanks_and_duplicates() {
        let text = "# analgesics\nibuprofen\n\n  Acetaminophen \nIBUPROFEN\n#loratadine\nloratadine\n";
        assert_eq!(
            parse_seed_list(text),
            vec!["ibuprofen", "Acetaminophen", "loratadine"]
        );
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = read_seed_list(Path::new("/nonexistent/seeds.txt")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/seeds.txt"));
    }
}
