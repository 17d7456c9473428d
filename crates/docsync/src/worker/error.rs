use thiserror::Error;

/// Errors from talking to the analysis worker.
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Failed to create HTTP client: {0}")]
    Client(String),

    #[error("Analysis service is unavailable: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Analysis service returned error: {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode analysis service response: {0}")]
    Decode(String),
}

impl WorkerError {
    /// Transport failures and 5xx responses are worth retrying later.
    pub fn is_retryable(&self) -> bool {
        match self {
            WorkerError::Transport(_) => true,
            WorkerError::Status { status, .. } => *status >= 500,
            WorkerError::Client(_) | WorkerError::Decode(_) => false,
        }
    }
}
