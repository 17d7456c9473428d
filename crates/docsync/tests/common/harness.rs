//! Test harness for isolated engine runs.
//!
//! The `TestHarness` struct provides:
//! - A temporary directory holding uploads, artifacts and a fake merge install
//! - An in-memory SQLite store
//! - A `DocSync` facade wired to `FakeWorker` and `FakeRunner`

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use docsync::config::MergeConfig;
use docsync::models::Document;
use docsync::{Database, DocSync, MergeSupervisor, Orchestrator, SqliteResultStore};

use super::fakes::{FakeRunner, FakeWorker};

pub struct TestHarness {
    temp_dir: TempDir,
    pub store: Arc<SqliteResultStore>,
    pub worker: Arc<FakeWorker>,
    pub runner: Arc<FakeRunner>,
    pub service: DocSync,
}

impl TestHarness {
    /// Harness whose merge runner exits 0 without printing anything.
    pub fn new() -> Self {
        Self::with_runner(FakeRunner::exiting(0, ""))
    }

    pub fn with_runner(runner: FakeRunner) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();

        std::fs::create_dir_all(base.join("bin")).expect("Failed to create bin dir");
        std::fs::write(base.join("bin/python"), b"").expect("Failed to write runtime");
        std::fs::write(base.join("bin/merge.py"), b"").expect("Failed to write program");

        let merge_config = MergeConfig {
            runtime: PathBuf::from("bin/python"),
            program: PathBuf::from("bin/merge.py"),
            output_base_dir: PathBuf::from("uploads/analysis"),
            working_dir: Some(base.to_path_buf()),
        };

        let store = Arc::new(SqliteResultStore::new(
            Database::open_in_memory().expect("Failed to open database"),
        ));
        let worker = Arc::new(FakeWorker::new());
        let runner = Arc::new(runner);

        let service = DocSync::new(
            Orchestrator::new(store.clone(), worker.clone()),
            MergeSupervisor::new(merge_config, runner.clone()),
        );

        Self {
            temp_dir,
            store,
            worker,
            runner,
            service,
        }
    }

    pub fn base(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Registers an uploaded PDF under the given id.
    pub fn add_document(&self, id: &str) -> Document {
        let upload = self.base().join("uploads").join(format!("{}.pdf", id));
        std::fs::create_dir_all(upload.parent().unwrap()).unwrap();
        std::fs::write(&upload, b"%PDF-1.4").unwrap();

        let mut doc = Document::new(
            format!("{}.pdf", id),
            8,
            upload.display().to_string(),
            "application/pdf",
        );
        doc.id = id.to_string();
        self.store.insert_document(&doc).unwrap();
        doc
    }

    /// Writes a page artifact the way the worker would and returns its path.
    pub fn write_artifact(&self, document_id: &str, kind: &str, page: u32) -> PathBuf {
        let dir = self
            .base()
            .join("uploads/analysis")
            .join(document_id)
            .join(kind);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(format!("page_{}.png", page));
        std::fs::write(&path, vec![0u8; 64]).unwrap();
        path
    }

    pub fn path_str(path: &Path) -> String {
        path.display().to_string()
    }
}
