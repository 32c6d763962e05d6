//! Unified error types for the crate.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error for drug-db operations.
#[derive(Debug, Error)]
pub enum DrugDbError {
    /// Reading or writing a database file failed.
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON or a record has the wrong shape.
    #[error("parse error in {what}: {source}")]
    Parse {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    /// The top level of a database document is not a JSON array.
    #[error("top level of {what} must be a list")]
    NotAList { what: String },
}

impl DrugDbError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(what: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Parse {
            what: what.into(),
            source,
        }
    }
}
