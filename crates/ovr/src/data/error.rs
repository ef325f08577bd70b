//! Errors raised by frame operations.

/// Errors that can occur when reading or deriving frame columns.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DataError {
    #[error("missing required column: {0}")]
    MissingColumn(String),

    #[error("column {0} already exists")]
    ColumnExists(String),

    #[error("unsupported column type for {column}: expected {expected}, got {got}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        got: &'static str,
    },

    #[error("row count mismatch for {column}: frame has {expected} rows, column has {got}")]
    LengthMismatch {
        column: String,
        expected: usize,
        got: usize,
    },

    #[error("vector size mismatch in {column}: expected {expected}, got {got}")]
    DimensionMismatch {
        column: String,
        expected: usize,
        got: usize,
    },

    #[error("invalid sparse vector: {0}")]
    InvalidSparseVector(String),

    #[error("cannot aggregate empty column {0}")]
    EmptyAggregate(String),
}
