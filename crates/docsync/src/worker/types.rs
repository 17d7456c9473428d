//! Wire types exchanged with the analysis worker.

use serde::{Deserialize, Serialize};

use crate::models::AnalysisKind;

/// Body of the "start analysis" request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartRequest {
    pub document_id: String,
    pub analysis_type: AnalysisKind,
    pub file_path: String,
    pub file_name: String,
}

/// One page entry as reported by the worker. Either field may be missing;
/// such entries are skipped during ingestion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultEntry {
    #[serde(default)]
    pub page_number: Option<i64>,
    #[serde(default)]
    pub file_path: Option<String>,
}

impl ResultEntry {
    pub fn new(page_number: i64, file_path: impl Into<String>) -> Self {
        Self {
            page_number: Some(page_number),
            file_path: Some(file_path.into()),
        }
    }
}

/// Body of the "fetch results" response. A missing list means no results.
/// The worker's accompanying `count` field is redundant with the list and is
/// not read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultsResponse {
    #[serde(default)]
    pub results: Option<Vec<ResultEntry>>,
}

impl ResultsResponse {
    pub fn into_entries(self) -> Vec<ResultEntry> {
        self.results.unwrap_or_default()
    }
}
