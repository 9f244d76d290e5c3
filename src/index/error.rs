use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("Invalid vector: {0}")]
    InvalidVector(String),

    #[error("Index holds no chunks")]
    EmptyIndex,

    #[error("No index found at {0}")]
    NotFound(String),

    #[error("Index at {path} is unreadable: {reason}")]
    Corrupt { path: String, reason: String },

    #[error("Index I/O error: {0}")]
    Io(#[from] std::io::Error),
}
