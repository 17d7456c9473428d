use thiserror::Error;

use crate::db::DatabaseError;
use crate::models::UnknownAnalysisKind;
use crate::worker::WorkerError;

/// Errors surfaced by the orchestration engine.
#[derive(Error, Debug)]
pub enum OrchestrationError {
    /// Bad analysis kind or page number. Raised before any side effect.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Document not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Worker(#[from] WorkerError),

    #[error("Storage error: {0}")]
    Storage(#[source] DatabaseError),
}

impl From<DatabaseError> for OrchestrationError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(id) => OrchestrationError::NotFound(id),
            other => OrchestrationError::Storage(other),
        }
    }
}

impl From<UnknownAnalysisKind> for OrchestrationError {
    fn from(err: UnknownAnalysisKind) -> Self {
        OrchestrationError::InvalidArgument(err.to_string())
    }
}
