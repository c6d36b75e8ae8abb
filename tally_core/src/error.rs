use thiserror::Error;

#[derive(Error, Debug)]
pub enum TallyError {
    #[error("Invalid dimension for metric '{metric}': expected {expected} labels, got {actual}")]
    InvalidDimension {
        metric: String,
        expected: usize,
        actual: usize,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, TallyError>;
