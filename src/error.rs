//! Error type shared by every stage of the pipeline.

use thiserror::Error;

/// Failures surfaced by ingestion, splitting, classification and evaluation.
#[derive(Debug, Error)]
pub enum KnnError {
    /// Empty or malformed dataset, or an out-of-range parameter.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Two feature vectors of different lengths were compared.
    #[error("Dimension mismatch: expected {expected} features, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// `k` is zero or larger than the training set.
    #[error("Invalid k: {k} (must be between 1 and {available})")]
    InvalidK { k: usize, available: usize },

    #[error("Training set is empty")]
    EmptyTrainingSet,

    /// Accuracy is undefined without test records.
    #[error("Testing set is empty")]
    EmptyTestSet,

    /// A feature field could not be read as a finite number.
    ///
    /// `line` is 1-based as reported by the CSV reader, `column` is 0-based.
    #[error("Feature parse error at line {line}, column {column}: {value:?}")]
    FeatureParse {
        line: u64,
        column: usize,
        value: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, KnnError>;

/// Checks `1 <= k <= available`, reporting an empty pool before a bad `k`.
pub(crate) fn check_k(k: usize, available: usize) -> Result<()> {
    if available == 0 {
        return Err(KnnError::EmptyTrainingSet);
    }
    if k == 0 || k > available {
        return Err(KnnError::InvalidK { k, available });
    }
    Ok(())
}
