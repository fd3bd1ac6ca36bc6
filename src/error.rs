/// Errors raised while encoding, loading, training or predicting
#[derive(Debug, thiserror::Error)]
pub enum TierError {
    /// A categorical value outside the closed set for its field
    #[error("Unknown {field}: {value:?}")]
    Encoding { field: &'static str, value: String },

    #[error("Age must be a finite number, got {0}")]
    NonFiniteAge(f64),

    #[error("Invalid age bounds: min {min} must be below max {max}")]
    InvalidAgeBounds { min: f64, max: f64 },

    /// A vector or table row whose width does not match the network
    #[error("Shape mismatch in {what} row {row}: expected {expected} values, got {got}")]
    Shape {
        what: &'static str,
        row: usize,
        expected: usize,
        got: usize,
    },

    #[error("Dataset has no rows")]
    EmptyDataset,

    #[error("Dataset has {data} feature rows but {target} label rows")]
    RowCountMismatch { data: usize, target: usize },

    #[error("Row {row} of the {table} table is not one-hot")]
    NotOneHot { table: &'static str, row: usize },

    #[error("Row {row} of the {table} table holds a non-finite value")]
    NonFinite { table: &'static str, row: usize },

    #[error("Unknown tier: {0:?}")]
    UnknownTier(String),

    /// Failures coming from the tensor math (NaN/inf values, bad shapes)
    #[error("Numerical error: {0}")]
    Numerical(String),

    #[error("Training cancelled before epoch {epoch}")]
    Cancelled { epoch: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("Malformed JSON table: {0}")]
    Json(#[from] json::Error),
}

impl From<ndarray::ShapeError> for TierError {
    fn from(err: ndarray::ShapeError) -> Self {
        TierError::Numerical(err.to_string())
    }
}
