//! Per-(document, analysis kind) state machine.
//!
//! ```text
//! NOT_STARTED ──start──▶ IN_PROGRESS ──poll (≥1 entry)──▶ COMPLETED
//!                             │
//!                             └──worker rejects start──▶ FAILED ──start──▶ IN_PROGRESS
//! ```
//!
//! No operation takes a lock across calls. Concurrent `start`/`poll` for the
//! same pair are tolerated because ingestion is idempotent and each kind's
//! status is written as its own row.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::error::OrchestrationError;
use crate::db::DatabaseError;
use crate::models::{
    AnalysisKind, AnalysisResultRecord, AnalysisStatus, StatusReport,
};
use crate::store::ResultStore;
use crate::worker::{AnalysisWorker, StartRequest};

/// What a single `poll` observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The worker returned at least one entry; the pair is now `COMPLETED`.
    Completed {
        /// Entries in the worker response.
        received: usize,
        /// Entries that produced a new record (duplicates and malformed
        /// entries excluded).
        ingested: usize,
    },
    /// The worker has nothing yet. State unchanged.
    NotReady,
    /// The fetch itself failed. Logged, state unchanged, safe to retry.
    WorkerUnavailable,
}

/// Parses a caller-supplied analysis kind.
pub fn parse_kind(kind: &str) -> Result<AnalysisKind, OrchestrationError> {
    Ok(kind.parse::<AnalysisKind>()?)
}

fn validate_page(page: i64) -> Result<u32, OrchestrationError> {
    u32::try_from(page)
        .ok()
        .filter(|p| *p >= 1)
        .ok_or_else(|| OrchestrationError::InvalidArgument(format!("Invalid page number: {}", page)))
}

/// Size of the artifact at `path`, or 0 if it cannot be measured.
fn artifact_size(path: &str) -> u64 {
    match std::fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) => {
            warn!("Could not calculate file size for {}: {}", path, e);
            0
        }
    }
}

#[derive(Clone)]
pub struct Orchestrator {
    store: Arc<dyn ResultStore>,
    worker: Arc<dyn AnalysisWorker>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator").finish_non_exhaustive()
    }
}

impl Orchestrator {
    pub fn new(store: Arc<dyn ResultStore>, worker: Arc<dyn AnalysisWorker>) -> Self {
        Self { store, worker }
    }

    pub fn store(&self) -> &Arc<dyn ResultStore> {
        &self.store
    }

    pub fn worker(&self) -> &Arc<dyn AnalysisWorker> {
        &self.worker
    }

    /// Marks the pair `IN_PROGRESS` and hands the document to the worker.
    ///
    /// The status is written before the outbound call, so a crash mid-call
    /// still leaves a visible marker. Any worker failure flips the status to
    /// `FAILED` and is returned to the caller.
    pub async fn start(&self, document_id: &str, kind: &str) -> Result<(), OrchestrationError> {
        let kind = parse_kind(kind)?;

        let document = self
            .store
            .find_document(document_id)?
            .ok_or_else(|| OrchestrationError::NotFound(document_id.to_string()))?;

        self.store
            .set_status(document_id, kind, AnalysisStatus::InProgress)?;

        let request = StartRequest {
            document_id: document.id.clone(),
            analysis_type: kind,
            file_path: document.file_path.clone(),
            file_name: document.file_name.clone(),
        };

        if let Err(e) = self.worker.request_start(&request).await {
            error!("Failed to start analysis for document {}: {}", document_id, e);
            if let Err(status_err) = self
                .store
                .set_status(document_id, kind, AnalysisStatus::Failed)
            {
                error!(
                    "Could not record FAILED status for document {}: {}",
                    document_id, status_err
                );
            }
            return Err(e.into());
        }

        info!("Analysis started for document {} with type {}", document_id, kind);
        Ok(())
    }

    /// Fetches results from the worker, ingests every well-formed entry and
    /// marks the pair `COMPLETED` when the response carried any entry.
    ///
    /// Worker failures never escape: they are logged and reported as
    /// [`PollOutcome::WorkerUnavailable`] with no state change. Storage
    /// failures during ingestion do propagate.
    pub async fn poll(
        &self,
        document_id: &str,
        kind: &str,
    ) -> Result<PollOutcome, OrchestrationError> {
        let kind = parse_kind(kind)?;

        let entries = match self.worker.request_results(document_id, kind).await {
            Ok(entries) => entries,
            Err(e) => {
                error!(
                    "Failed to fetch results for document {} type {}: {}",
                    document_id, kind, e
                );
                return Ok(PollOutcome::WorkerUnavailable);
            }
        };

        if entries.is_empty() {
            debug!("No results yet for document {} type {}", document_id, kind);
            return Ok(PollOutcome::NotReady);
        }

        info!(
            "Found {} analysis results for document {} type {}",
            entries.len(),
            document_id,
            kind
        );

        let mut ingested = 0;
        for entry in &entries {
            let (Some(page), Some(path)) = (entry.page_number, entry.file_path.as_deref()) else {
                debug!("Skipping incomplete result entry: {:?}", entry);
                continue;
            };
            let page = match validate_page(page) {
                Ok(page) => page,
                Err(e) => {
                    warn!("Skipping result entry for document {}: {}", document_id, e);
                    continue;
                }
            };
            if self.ingest(document_id, kind, page, path)? {
                ingested += 1;
            }
        }

        // TODO: compare against an expected page count once the worker
        // reports one; any non-empty batch counts as complete for now.
        self.store
            .set_status(document_id, kind, AnalysisStatus::Completed)?;

        Ok(PollOutcome::Completed {
            received: entries.len(),
            ingested,
        })
    }

    /// Records one page's artifact. Replaying the same page is a silent
    /// no-op. Returns whether a new record was written.
    pub fn save_result(
        &self,
        document_id: &str,
        kind: &str,
        page: i64,
        path: &str,
    ) -> Result<bool, OrchestrationError> {
        let kind = parse_kind(kind)?;
        let page = validate_page(page)?;
        if path.trim().is_empty() {
            return Err(OrchestrationError::InvalidArgument(
                "Result file path must not be empty".to_string(),
            ));
        }
        self.ingest(document_id, kind, page, path)
    }

    fn ingest(
        &self,
        document_id: &str,
        kind: AnalysisKind,
        page: u32,
        path: &str,
    ) -> Result<bool, OrchestrationError> {
        if self.store.exists_result(document_id, kind, page)? {
            debug!(
                "Analysis result already exists for document {} type {} page {}",
                document_id, kind, page
            );
            return Ok(false);
        }

        let record =
            AnalysisResultRecord::new(document_id, kind, page, path, artifact_size(path));
        let inserted = self.store.insert_result(&record)?;
        if inserted {
            info!(
                "Saved analysis result {} for document {} type {} page {}",
                record.id, document_id, kind, page
            );
        }
        Ok(inserted)
    }

    /// Progress snapshot: stored page count, highest page, completion flag.
    pub fn status(&self, document_id: &str, kind: &str) -> Result<StatusReport, OrchestrationError> {
        let parsed = parse_kind(kind)?;
        Ok(StatusReport {
            processed_pages: self.store.count_results(document_id, parsed)?,
            max_page: self.store.max_page(document_id, parsed)?.unwrap_or(0),
            complete: self.is_complete(document_id, kind),
        })
    }

    /// True iff the pair's recorded status is `COMPLETED`. Any absence
    /// (document, entry, or an unknown kind) reads as false.
    pub fn is_complete(&self, document_id: &str, kind: &str) -> bool {
        let Ok(kind) = kind.parse::<AnalysisKind>() else {
            return false;
        };
        match self.store.find_status(document_id, kind) {
            Ok(entry) => entry.is_some_and(|e| e.status == AnalysisStatus::Completed),
            Err(DatabaseError::NotFound(_)) => false,
            Err(e) => {
                warn!(
                    "Could not read status for document {} type {}: {}",
                    document_id, kind, e
                );
                false
            }
        }
    }

    /// Recorded status, `None` meaning not started.
    pub fn current_status(
        &self,
        document_id: &str,
        kind: &str,
    ) -> Result<Option<AnalysisStatus>, OrchestrationError> {
        let kind = parse_kind(kind)?;
        Ok(self
            .store
            .find_status(document_id, kind)?
            .map(|entry| entry.status))
    }

    /// Stored results whose artifacts still exist, ascending by page.
    pub fn list_results(
        &self,
        document_id: &str,
        kind: &str,
    ) -> Result<Vec<AnalysisResultRecord>, OrchestrationError> {
        let kind = parse_kind(kind)?;
        Ok(self.store.list_results(document_id, kind)?)
    }

    /// The result for one page, if stored and its artifact still exists.
    pub fn find_result(
        &self,
        document_id: &str,
        kind: &str,
        page: i64,
    ) -> Result<Option<AnalysisResultRecord>, OrchestrationError> {
        let page = validate_page(page)?;
        Ok(self
            .list_results(document_id, kind)?
            .into_iter()
            .find(|r| r.page_number == page))
    }

    pub fn find_result_by_id(
        &self,
        id: &str,
    ) -> Result<Option<AnalysisResultRecord>, OrchestrationError> {
        Ok(self.store.find_result(id)?)
    }
}
