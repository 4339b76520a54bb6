use crate::store::error::StoreError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Failed to open archive database '{0}'")]
    Open(PathBuf, #[source] rusqlite::Error),

    #[error("Failed to query table '{table}' of '{path}'")]
    Query {
        path: PathBuf,
        table: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Table '{table}' of '{path}' has {found} columns but the archive layout has {expected}")]
    SchemaMismatch {
        path: PathBuf,
        table: String,
        expected: usize,
        found: usize,
    },
}
