use thiserror::Error;

use crate::external::ExternalError;
use crate::index::IndexError;

/// Errors surfaced by the caller-facing operations.
#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("Input is empty")]
    EmptyInput,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("No extractable text in document")]
    NoExtractableText,

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    External(#[from] ExternalError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AssistantError {
    /// Errors the caller can recover from by falling back to direct generation.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AssistantError::Index(IndexError::NotFound(_)) | AssistantError::Index(IndexError::EmptyIndex)
        )
    }
}
