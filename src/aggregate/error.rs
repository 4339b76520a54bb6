use crate::store::error::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Day offset {0} is outside the range [0, 1)")]
    InvalidOffset(f64),

    #[error("Observations are not in time order: row {index} ({timestamp}) is earlier than the row before it ({previous})")]
    UnsortedInput {
        index: usize,
        previous: f64,
        timestamp: f64,
    },

    #[error("Timestamp of row {index} is not a finite number")]
    InvalidTimestamp { index: usize },

    #[error("Rainfall field '{0}' is not part of the raw store")]
    MissingRainfallField(String),
}
