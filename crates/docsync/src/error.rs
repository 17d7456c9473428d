use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocSyncError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Worker error: {0}")]
    Worker(#[from] crate::worker::WorkerError),

    #[error("Analysis error: {0}")]
    Orchestration(#[from] crate::engine::OrchestrationError),

    #[error("Merge error: {0}")]
    Merge(#[from] crate::merge::MergeError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

pub type Result<T> = std::result::Result<T, DocSyncError>;
