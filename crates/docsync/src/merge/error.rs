use std::path::PathBuf;

use thiserror::Error;

/// Failures of a merge invocation.
#[derive(Error, Debug)]
pub enum MergeError {
    /// The merge program or its runtime is missing. No process was spawned.
    #[error("Merge {what} not found at {}", path.display())]
    NotConfigured { what: &'static str, path: PathBuf },

    /// The child outlived the fixed bound and was killed.
    #[error("Merge process timed out after {secs} seconds")]
    TimedOut { secs: u64 },

    /// The child exited 0 without announcing an output file.
    #[error("Merge process reported no output: {0}")]
    Protocol(String),

    /// The announced output file could not be read back.
    #[error("Failed to read merged output {}: {source}", path.display())]
    ReadOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Merge failed: {0}")]
    Failed(String),
}

/// What a consumer of `merge` is allowed to learn about a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeFailureKind {
    NotConfigured,
    TimedOut,
    Failed,
}

impl MergeError {
    pub fn failure_kind(&self) -> MergeFailureKind {
        match self {
            MergeError::NotConfigured { .. } => MergeFailureKind::NotConfigured,
            MergeError::TimedOut { .. } => MergeFailureKind::TimedOut,
            MergeError::Protocol(_) | MergeError::ReadOutput { .. } | MergeError::Failed(_) => {
                MergeFailureKind::Failed
            }
        }
    }
}

/// Failures of the process runner itself, before any protocol is applied.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error while supervising child: {0}")]
    Io(#[from] std::io::Error),

    #[error("Child did not exit within {0:?}")]
    TimedOut(std::time::Duration),
}
