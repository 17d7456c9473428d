//! Client for the external analysis worker.
//!
//! The worker runs analyses asynchronously and exposes per-page results over
//! HTTP. [`AnalysisWorker`] is the seam the engine depends on;
//! [`HttpWorkerClient`] talks to the real service.

pub mod client;
pub mod error;
pub mod types;

use async_trait::async_trait;

pub use client::HttpWorkerClient;
pub use error::WorkerError;
pub use types::{ResultEntry, ResultsResponse, StartRequest};

use crate::models::AnalysisKind;

#[async_trait]
pub trait AnalysisWorker: Send + Sync {
    /// Asks the worker to begin analysing a document. Returns as soon as the
    /// worker has accepted the job.
    async fn request_start(&self, request: &StartRequest) -> Result<(), WorkerError>;

    /// Fetches whatever results the worker has produced so far. An empty
    /// vector means "not ready yet".
    async fn request_results(
        &self,
        document_id: &str,
        kind: AnalysisKind,
    ) -> Result<Vec<ResultEntry>, WorkerError>;

    /// Liveness probe. Never fails; any problem reads as unhealthy.
    async fn health(&self) -> bool;
}
