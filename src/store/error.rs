use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("No observations to store")]
    EmptyInput,

    #[error("Field '{field}' has {found} values but the store holds {expected} observations")]
    LengthMismatch {
        field: String,
        expected: usize,
        found: usize,
    },

    #[error("Field '{0}' has no entry in the unit registry")]
    MissingUnit(String),

    #[error("Field '{0}' appears more than once")]
    DuplicateField(String),

    #[error("Required column '{0}' not found in the store")]
    ColumnNotFound(String, #[source] PolarsError),

    #[error("Column '{0}' does not hold 64-bit float values")]
    ColumnType(String, #[source] PolarsError),

    #[error("Failed building the series frame")]
    FrameConstruction(#[source] PolarsError),

    #[error("I/O error writing daily table to '{0}'")]
    ExportIo(std::path::PathBuf, #[source] std::io::Error),

    #[error("Encoding error writing daily table to '{0}'")]
    ExportPolars(std::path::PathBuf, #[source] PolarsError),
}
