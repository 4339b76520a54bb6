use crate::store::error::StoreError;
use crate::time_range::TimeWindow;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SelectError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Variable '{0}' is neither a raw nor a daily variable")]
    NotFound(String),

    #[error("No '{variable}' data between {requested}; data is available from {available}")]
    NoDataInRange {
        variable: String,
        requested: TimeWindow,
        available: TimeWindow,
    },
}

impl SelectError {
    /// Per-variable failures the caller may skip; anything else is fatal.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SelectError::NotFound(_) | SelectError::NoDataInRange { .. }
        )
    }
}
