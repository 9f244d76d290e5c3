use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExternalError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Embedding service error: {0}")]
    EmbeddingService(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
