//! Capability surface for front ends.
//!
//! Anything that renders documents or exposes an HTTP API binds to
//! [`AnalysisService`] and never to the engine internals.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::Config;
use crate::db::{self, Database};
use crate::engine::{parse_kind, OrchestrationError, Orchestrator, PollOutcome};
use crate::error::{ConfigError, Result};
use crate::merge::{MergeSupervisor, TokioProcessRunner};
use crate::models::{AnalysisResultRecord, Document, StatusReport};
use crate::store::{ResultStore, SqliteResultStore};
use crate::worker::{AnalysisWorker, HttpWorkerClient};

/// Operations a front end may invoke. Analysis kinds arrive as raw strings
/// and are validated here.
#[async_trait]
pub trait AnalysisService: Send + Sync {
    async fn start(&self, document_id: &str, kind: &str) -> Result<()>;

    async fn poll(&self, document_id: &str, kind: &str) -> Result<PollOutcome>;

    fn status(&self, document_id: &str, kind: &str) -> Result<StatusReport>;

    fn list_results(&self, document_id: &str, kind: &str) -> Result<Vec<AnalysisResultRecord>>;

    async fn merge(&self, document_id: &str, kind: &str) -> Result<Vec<u8>>;

    /// Cheap pre-flight for `merge`. Never errors.
    fn has_results(&self, document_id: &str, kind: &str) -> bool;
}

/// The production composition of engine and merge supervisor.
#[derive(Debug, Clone)]
pub struct DocSync {
    orchestrator: Orchestrator,
    merger: MergeSupervisor,
}

impl DocSync {
    pub fn new(orchestrator: Orchestrator, merger: MergeSupervisor) -> Self {
        Self {
            orchestrator,
            merger,
        }
    }

    /// Opens the SQLite store and wires up the HTTP worker client and the
    /// tokio process runner.
    pub fn from_config(config: &Config) -> Result<Self> {
        let db_path = match &config.database_path {
            Some(path) => path.clone(),
            None => db::default_database_path().ok_or_else(|| ConfigError::Validation {
                message: "Could not determine home directory for the database".to_string(),
            })?,
        };

        let store: Arc<dyn ResultStore> = Arc::new(SqliteResultStore::new(Database::open(&db_path)?));
        let worker: Arc<dyn AnalysisWorker> = Arc::new(HttpWorkerClient::new(&config.worker)?);
        let merger = MergeSupervisor::new(config.merge.clone(), Arc::new(TokioProcessRunner));

        tracing::info!(
            "DocSync initialized with database {} and worker {}",
            db_path.display(),
            config.worker.base_url
        );

        Ok(Self::new(Orchestrator::new(store, worker), merger))
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn merger(&self) -> &MergeSupervisor {
        &self.merger
    }

    /// Registers or updates a document record. Used by the upload path.
    pub fn save_document(&self, document: &Document) -> Result<Document> {
        Ok(self.orchestrator.store().save_document(document)?)
    }

    pub fn find_document(&self, document_id: &str) -> Result<Option<Document>> {
        Ok(self.orchestrator.store().find_document(document_id)?)
    }

    /// Whether the analysis worker answers its health probe.
    pub async fn worker_healthy(&self) -> bool {
        self.orchestrator.worker().health().await
    }
}

#[async_trait]
impl AnalysisService for DocSync {
    async fn start(&self, document_id: &str, kind: &str) -> Result<()> {
        Ok(self.orchestrator.start(document_id, kind).await?)
    }

    async fn poll(&self, document_id: &str, kind: &str) -> Result<PollOutcome> {
        Ok(self.orchestrator.poll(document_id, kind).await?)
    }

    fn status(&self, document_id: &str, kind: &str) -> Result<StatusReport> {
        Ok(self.orchestrator.status(document_id, kind)?)
    }

    fn list_results(&self, document_id: &str, kind: &str) -> Result<Vec<AnalysisResultRecord>> {
        Ok(self.orchestrator.list_results(document_id, kind)?)
    }

    async fn merge(&self, document_id: &str, kind: &str) -> Result<Vec<u8>> {
        let kind = parse_kind(kind)?;
        if self.orchestrator.store().find_document(document_id)?.is_none() {
            return Err(OrchestrationError::NotFound(document_id.to_string()).into());
        }
        Ok(self.merger.merge(document_id, kind).await?)
    }

    fn has_results(&self, document_id: &str, kind: &str) -> bool {
        parse_kind(kind).is_ok_and(|kind| self.merger.has_results(document_id, kind))
    }
}
