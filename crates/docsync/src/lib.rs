pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod format;
pub mod merge;
pub mod models;
pub mod service;
pub mod store;
pub mod telemetry;
pub mod worker;

pub use config::{load_config, Config};
pub use db::{Database, DatabaseError};
pub use engine::{OrchestrationError, Orchestrator, PollOutcome};
pub use error::{ConfigError, DocSyncError, Result};
pub use merge::{MergeError, MergeFailureKind, MergeSupervisor};
pub use models::{AnalysisKind, AnalysisResultRecord, AnalysisStatus, Document, StatusReport};
pub use service::{AnalysisService, DocSync};
pub use store::{ResultStore, SqliteResultStore};
pub use worker::{AnalysisWorker, HttpWorkerClient, WorkerError};
