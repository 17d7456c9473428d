//! Test doubles for the analysis worker and the merge process runner.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use docsync::merge::{Invocation, ProcessOutput, ProcessRunner, RunError};
use docsync::models::AnalysisKind;
use docsync::worker::{AnalysisWorker, ResultEntry, StartRequest, WorkerError};

/// Scripted analysis worker that counts every outbound call.
#[derive(Default)]
pub struct FakeWorker {
    start_calls: AtomicUsize,
    result_calls: AtomicUsize,
    start_failure: Mutex<Option<u16>>,
    results: Mutex<Vec<ResultEntry>>,
    results_unavailable: Mutex<bool>,
    last_start: Mutex<Option<StartRequest>>,
}

impl FakeWorker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `request_start` fail with the given HTTP status.
    pub fn fail_start_with(&self, status: u16) {
        *self.start_failure.lock().unwrap() = Some(status);
    }

    pub fn set_results(&self, entries: Vec<ResultEntry>) {
        *self.results.lock().unwrap() = entries;
    }

    /// Makes `request_results` fail as if the worker were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        *self.results_unavailable.lock().unwrap() = unavailable;
    }

    pub fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub fn result_calls(&self) -> usize {
        self.result_calls.load(Ordering::SeqCst)
    }

    pub fn last_start(&self) -> Option<StartRequest> {
        self.last_start.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnalysisWorker for FakeWorker {
    async fn request_start(&self, request: &StartRequest) -> Result<(), WorkerError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_start.lock().unwrap() = Some(request.clone());
        match *self.start_failure.lock().unwrap() {
            Some(status) => Err(WorkerError::Status {
                status,
                body: "worker unavailable".to_string(),
            }),
            None => Ok(()),
        }
    }

    async fn request_results(
        &self,
        _document_id: &str,
        _kind: AnalysisKind,
    ) -> Result<Vec<ResultEntry>, WorkerError> {
        self.result_calls.fetch_add(1, Ordering::SeqCst);
        if *self.results_unavailable.lock().unwrap() {
            return Err(WorkerError::Status {
                status: 502,
                body: "bad gateway".to_string(),
            });
        }
        Ok(self.results.lock().unwrap().clone())
    }

    async fn health(&self) -> bool {
        !*self.results_unavailable.lock().unwrap()
    }
}

/// Process runner that answers with a fixed exit code and output.
pub struct FakeRunner {
    exit_code: Option<i32>,
    output: String,
    timed_out: bool,
    runs: AtomicUsize,
}

impl FakeRunner {
    pub fn exiting(exit_code: i32, output: impl Into<String>) -> Self {
        Self {
            exit_code: Some(exit_code),
            output: output.into(),
            timed_out: false,
            runs: AtomicUsize::new(0),
        }
    }

    pub fn hanging() -> Self {
        Self {
            exit_code: None,
            output: String::new(),
            timed_out: true,
            runs: AtomicUsize::new(0),
        }
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProcessRunner for FakeRunner {
    async fn run(&self, _invocation: &Invocation, limit: Duration) -> Result<ProcessOutput, RunError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        if self.timed_out {
            return Err(RunError::TimedOut(limit));
        }
        Ok(ProcessOutput {
            exit_code: self.exit_code,
            combined_output: self.output.clone(),
        })
    }
}
