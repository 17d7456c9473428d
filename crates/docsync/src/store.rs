//! Typed access to documents, analysis results and per-kind status.
//!
//! [`ResultStore`] is the seam the orchestration engine depends on;
//! [`SqliteResultStore`] is the production implementation over [`Database`].

use std::path::Path;

use crate::db::{document_repo, result_repo, status_repo, Database, DatabaseError};
use crate::models::{AnalysisKind, AnalysisResultRecord, AnalysisStatus, Document, StatusEntry};

/// Repository-style access to the durable record store.
///
/// Every operation that references a document fails with
/// [`DatabaseError::NotFound`] when the document does not exist.
pub trait ResultStore: Send + Sync {
    fn find_document(&self, id: &str) -> Result<Option<Document>, DatabaseError>;

    /// Upserts the document's own columns and returns the stored document.
    /// The caller's `status_map` is not written; statuses change only
    /// through [`ResultStore::set_status`].
    fn save_document(&self, doc: &Document) -> Result<Document, DatabaseError>;

    /// Writes one kind's status entry without touching the others.
    fn set_status(
        &self,
        document_id: &str,
        kind: AnalysisKind,
        status: AnalysisStatus,
    ) -> Result<StatusEntry, DatabaseError>;

    fn find_status(
        &self,
        document_id: &str,
        kind: AnalysisKind,
    ) -> Result<Option<StatusEntry>, DatabaseError>;

    fn exists_result(
        &self,
        document_id: &str,
        kind: AnalysisKind,
        page: u32,
    ) -> Result<bool, DatabaseError>;

    fn count_results(&self, document_id: &str, kind: AnalysisKind) -> Result<u64, DatabaseError>;

    fn max_page(&self, document_id: &str, kind: AnalysisKind)
        -> Result<Option<u32>, DatabaseError>;

    /// Results ascending by page, omitting any whose artifact is gone from
    /// disk. Stale rows are hidden, never deleted.
    fn list_results(
        &self,
        document_id: &str,
        kind: AnalysisKind,
    ) -> Result<Vec<AnalysisResultRecord>, DatabaseError>;

    /// A single result by id, or `None` if absent or its artifact is gone.
    fn find_result(&self, id: &str) -> Result<Option<AnalysisResultRecord>, DatabaseError>;

    /// Inserts unless a record for the same (document, kind, page) already
    /// exists. Returns whether a row was written.
    fn insert_result(&self, record: &AnalysisResultRecord) -> Result<bool, DatabaseError>;

    fn delete_all_results(&self, document_id: &str) -> Result<u64, DatabaseError>;
}

/// [`ResultStore`] backed by SQLite.
#[derive(Debug, Clone)]
pub struct SqliteResultStore {
    db: Database,
}

impl SqliteResultStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Inserts a new document. Part of the upload path, which lives outside
    /// this crate; exposed for the surrounding layers and tests.
    pub fn insert_document(&self, doc: &Document) -> Result<(), DatabaseError> {
        self.db
            .with_transaction(|tx| document_repo::upsert(tx, doc))
    }

    pub fn list_documents(&self) -> Result<Vec<Document>, DatabaseError> {
        self.db.with_conn(document_repo::list_all)
    }

    pub fn find_document_by_name(&self, file_name: &str) -> Result<Option<Document>, DatabaseError> {
        self.db
            .with_conn(|conn| document_repo::find_by_file_name(conn, file_name))
    }

    /// Deletes a document together with its results and status entries.
    pub fn delete_document(&self, id: &str) -> Result<(), DatabaseError> {
        self.db.with_transaction(|tx| {
            document_repo::ensure_exists(tx, id)?;
            let removed = result_repo::delete_for_document(tx, id)?;
            document_repo::delete(tx, id)?;
            log::info!("Deleted document {} and {} analysis result(s)", id, removed);
            Ok(())
        })
    }
}

fn artifact_present(record: &AnalysisResultRecord) -> bool {
    let present = Path::new(&record.result_file_path).exists();
    if !present {
        log::warn!(
            "Analysis result file not found: {}",
            record.result_file_path.display()
        );
    }
    present
}

impl ResultStore for SqliteResultStore {
    fn find_document(&self, id: &str) -> Result<Option<Document>, DatabaseError> {
        self.db.with_conn(|conn| document_repo::find_by_id(conn, id))
    }

    fn save_document(&self, doc: &Document) -> Result<Document, DatabaseError> {
        self.db.with_transaction(|tx| {
            document_repo::upsert(tx, doc)?;
            document_repo::find_by_id(tx, &doc.id)?
                .ok_or_else(|| DatabaseError::NotFound(doc.id.clone()))
        })
    }

    fn set_status(
        &self,
        document_id: &str,
        kind: AnalysisKind,
        status: AnalysisStatus,
    ) -> Result<StatusEntry, DatabaseError> {
        let entry = StatusEntry::now(status);
        self.db.with_conn(|conn| {
            document_repo::ensure_exists(conn, document_id)?;
            status_repo::upsert(conn, document_id, kind, &entry)
        })?;
        log::info!(
            "Updated analysis status for document: {} type: {} status: {}",
            document_id,
            kind,
            status
        );
        Ok(entry)
    }

    fn find_status(
        &self,
        document_id: &str,
        kind: AnalysisKind,
    ) -> Result<Option<StatusEntry>, DatabaseError> {
        self.db.with_conn(|conn| {
            document_repo::ensure_exists(conn, document_id)?;
            status_repo::find(conn, document_id, kind)
        })
    }

    fn exists_result(
        &self,
        document_id: &str,
        kind: AnalysisKind,
        page: u32,
    ) -> Result<bool, DatabaseError> {
        self.db.with_conn(|conn| {
            document_repo::ensure_exists(conn, document_id)?;
            result_repo::exists(conn, document_id, kind, page)
        })
    }

    fn count_results(&self, document_id: &str, kind: AnalysisKind) -> Result<u64, DatabaseError> {
        self.db.with_conn(|conn| {
            document_repo::ensure_exists(conn, document_id)?;
            result_repo::count(conn, document_id, kind)
        })
    }

    fn max_page(
        &self,
        document_id: &str,
        kind: AnalysisKind,
    ) -> Result<Option<u32>, DatabaseError> {
        self.db.with_conn(|conn| {
            document_repo::ensure_exists(conn, document_id)?;
            result_repo::max_page(conn, document_id, kind)
        })
    }

    fn list_results(
        &self,
        document_id: &str,
        kind: AnalysisKind,
    ) -> Result<Vec<AnalysisResultRecord>, DatabaseError> {
        let mut records = self.db.with_conn(|conn| {
            document_repo::ensure_exists(conn, document_id)?;
            result_repo::list(conn, document_id, kind)
        })?;
        // Filesystem checks happen outside the connection lock.
        records.retain(artifact_present);
        Ok(records)
    }

    fn find_result(&self, id: &str) -> Result<Option<AnalysisResultRecord>, DatabaseError> {
        let record = self.db.with_conn(|conn| result_repo::find_by_id(conn, id))?;
        Ok(record.filter(artifact_present))
    }

    fn insert_result(&self, record: &AnalysisResultRecord) -> Result<bool, DatabaseError> {
        self.db.with_conn(|conn| {
            document_repo::ensure_exists(conn, &record.document_id)?;
            if result_repo::exists(
                conn,
                &record.document_id,
                record.analysis_kind,
                record.page_number,
            )? {
                return Ok(false);
            }
            result_repo::insert(conn, record)
        })
    }

    fn delete_all_results(&self, document_id: &str) -> Result<u64, DatabaseError> {
        self.db.with_conn(|conn| {
            document_repo::ensure_exists(conn, document_id)?;
            result_repo::delete_for_document(conn, document_id)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_with_document(id: &str) -> SqliteResultStore {
        let store = SqliteResultStore::new(Database::open_in_memory().unwrap());
        let mut doc = Document::new("scan.pdf", 10, "/uploads/scan.pdf", "application/pdf");
        doc.id = id.to_string();
        store.insert_document(&doc).unwrap();
        store
    }

    #[test]
    fn test_operations_on_unknown_document_fail_not_found() {
        let store = store_with_document("d1");
        assert!(store
            .count_results("missing", AnalysisKind::Docling)
            .unwrap_err()
            .is_not_found());
        assert!(store
            .max_page("missing", AnalysisKind::Docling)
            .unwrap_err()
            .is_not_found());
        assert!(store
            .set_status("missing", AnalysisKind::Docling, AnalysisStatus::InProgress)
            .unwrap_err()
            .is_not_found());
        let record = AnalysisResultRecord::new("missing", AnalysisKind::Docling, 1, "/r/1.png", 0);
        assert!(store.insert_result(&record).unwrap_err().is_not_found());
        assert!(store.find_document("missing").unwrap().is_none());
    }

    #[test]
    fn test_insert_result_is_idempotent() {
        let store = store_with_document("d1");
        let first = AnalysisResultRecord::new("d1", AnalysisKind::Docling, 1, "/r/1.png", 5);
        let second = AnalysisResultRecord::new("d1", AnalysisKind::Docling, 1, "/r/1.png", 5);

        assert!(store.insert_result(&first).unwrap());
        assert!(!store.insert_result(&second).unwrap());
        assert_eq!(store.count_results("d1", AnalysisKind::Docling).unwrap(), 1);
        assert!(store.exists_result("d1", AnalysisKind::Docling, 1).unwrap());
    }

    #[test]
    fn test_list_results_hides_stale_artifacts_without_deleting() {
        let dir = TempDir::new().unwrap();
        let store = store_with_document("d1");

        let kept = dir.path().join("page_1.png");
        let removed = dir.path().join("page_2.png");
        std::fs::write(&kept, b"png").unwrap();
        std::fs::write(&removed, b"png").unwrap();

        for (page, path) in [(1, &kept), (2, &removed)] {
            let record = AnalysisResultRecord::new("d1", AnalysisKind::Docling, page, path, 3);
            store.insert_result(&record).unwrap();
        }
        std::fs::remove_file(&removed).unwrap();

        let listed = store.list_results("d1", AnalysisKind::Docling).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].page_number, 1);
        // The stale row is still stored.
        assert_eq!(store.count_results("d1", AnalysisKind::Docling).unwrap(), 2);
    }

    #[test]
    fn test_set_status_only_touches_one_kind() {
        let store = store_with_document("d1");
        store
            .set_status("d1", AnalysisKind::Docling, AnalysisStatus::InProgress)
            .unwrap();
        store
            .set_status("d1", AnalysisKind::Deepdoctection, AnalysisStatus::Failed)
            .unwrap();
        store
            .set_status("d1", AnalysisKind::Docling, AnalysisStatus::Completed)
            .unwrap();

        let doc = store.find_document("d1").unwrap().unwrap();
        assert_eq!(
            doc.status_of(AnalysisKind::Docling),
            Some(AnalysisStatus::Completed)
        );
        assert_eq!(
            doc.status_of(AnalysisKind::Deepdoctection),
            Some(AnalysisStatus::Failed)
        );
    }

    #[test]
    fn test_stale_save_does_not_revert_status() {
        let store = store_with_document("d1");
        store
            .set_status("d1", AnalysisKind::Docling, AnalysisStatus::InProgress)
            .unwrap();
        let mut stale = store.find_document("d1").unwrap().unwrap();

        store
            .set_status("d1", AnalysisKind::Docling, AnalysisStatus::Completed)
            .unwrap();
        stale.file_name = "renamed.pdf".to_string();
        let saved = store.save_document(&stale).unwrap();

        assert_eq!(saved.file_name, "renamed.pdf");
        assert_eq!(
            saved.status_of(AnalysisKind::Docling),
            Some(AnalysisStatus::Completed)
        );
        assert_eq!(
            store
                .find_status("d1", AnalysisKind::Docling)
                .unwrap()
                .map(|e| e.status),
            Some(AnalysisStatus::Completed)
        );
    }

    #[test]
    fn test_find_document_by_name_prefers_latest_upload() {
        let store = store_with_document("d1");
        let mut newer = Document::new("scan.pdf", 20, "/uploads/scan-2.pdf", "application/pdf");
        newer.id = "d2".to_string();
        newer.upload_date = chrono::Utc::now() + chrono::Duration::seconds(60);
        store.insert_document(&newer).unwrap();

        let found = store.find_document_by_name("scan.pdf").unwrap().unwrap();
        assert_eq!(found.id, "d2");
        assert!(store.find_document_by_name("other.pdf").unwrap().is_none());
        assert_eq!(store.list_documents().unwrap().len(), 2);
    }

    #[test]
    fn test_delete_document_cascades() {
        let store = store_with_document("d1");
        let record = AnalysisResultRecord::new("d1", AnalysisKind::Docling, 1, "/r/1.png", 0);
        store.insert_result(&record).unwrap();
        store
            .set_status("d1", AnalysisKind::Docling, AnalysisStatus::Completed)
            .unwrap();

        store.delete_document("d1").unwrap();

        assert!(store.find_document("d1").unwrap().is_none());
        assert!(store.find_result(&record.id).unwrap().is_none());
        assert!(store.delete_document("d1").unwrap_err().is_not_found());
    }

    #[test]
    fn test_find_result_requires_artifact() {
        let dir = TempDir::new().unwrap();
        let store = store_with_document("d1");
        let path = dir.path().join("page_1.png");
        std::fs::write(&path, b"png").unwrap();

        let record = AnalysisResultRecord::new("d1", AnalysisKind::Docling, 1, &path, 3);
        store.insert_result(&record).unwrap();
        assert!(store.find_result(&record.id).unwrap().is_some());

        std::fs::remove_file(&path).unwrap();
        assert!(store.find_result(&record.id).unwrap().is_none());
    }
}
