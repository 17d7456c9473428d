//! Core data model shared by the store, the engine and the merge supervisor.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Supported analysis modes. The set is closed: anything else is rejected
/// before any external call is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisKind {
    Deepdoctection,
    Docling,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 2] = [AnalysisKind::Deepdoctection, AnalysisKind::Docling];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisKind::Deepdoctection => "deepdoctection",
            AnalysisKind::Docling => "docling",
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a supported analysis kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAnalysisKind(pub String);

impl fmt::Display for UnknownAnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid analysis type: {}", self.0)
    }
}

impl std::error::Error for UnknownAnalysisKind {}

impl FromStr for AnalysisKind {
    type Err = UnknownAnalysisKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deepdoctection" => Ok(AnalysisKind::Deepdoctection),
            "docling" => Ok(AnalysisKind::Docling),
            other => Err(UnknownAnalysisKind(other.to_string())),
        }
    }
}

/// Lifecycle state of one (document, analysis kind) pair.
///
/// `NOT_STARTED` is never stored: it is the absence of a status entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisStatus {
    InProgress,
    Completed,
    Failed,
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStatus::InProgress => "IN_PROGRESS",
            AnalysisStatus::Completed => "COMPLETED",
            AnalysisStatus::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "IN_PROGRESS" => Some(AnalysisStatus::InProgress),
            "COMPLETED" => Some(AnalysisStatus::Completed),
            "FAILED" => Some(AnalysisStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AnalysisStatus::Completed | AnalysisStatus::Failed)
    }
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One analysis kind's entry in a document's status map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEntry {
    pub status: AnalysisStatus,
    pub last_updated: DateTime<Utc>,
}

impl StatusEntry {
    pub fn now(status: AnalysisStatus) -> Self {
        Self {
            status,
            last_updated: Utc::now(),
        }
    }
}

/// An uploaded document. `status_map` is a read-only view assembled from
/// the per-kind status rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub file_name: String,
    pub file_size: u64,
    pub file_path: String,
    pub mime_type: String,
    pub upload_date: DateTime<Utc>,
    /// Upload lifecycle status, owned by the upload layer (e.g. "UPLOADED").
    pub status: String,
    pub status_map: BTreeMap<AnalysisKind, StatusEntry>,
}

impl Document {
    /// Builds a freshly uploaded document with a random id.
    pub fn new(
        file_name: impl Into<String>,
        file_size: u64,
        file_path: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            file_name: file_name.into(),
            file_size,
            file_path: file_path.into(),
            mime_type: mime_type.into(),
            upload_date: Utc::now(),
            status: "UPLOADED".to_string(),
            status_map: BTreeMap::new(),
        }
    }

    pub fn status_of(&self, kind: AnalysisKind) -> Option<AnalysisStatus> {
        self.status_map.get(&kind).map(|entry| entry.status)
    }
}

/// A single page's result artifact produced by the analysis worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResultRecord {
    pub id: String,
    pub document_id: String,
    pub analysis_kind: AnalysisKind,
    /// 1-based.
    pub page_number: u32,
    pub result_file_path: PathBuf,
    /// Best effort; 0 when the artifact could not be measured.
    pub file_size: u64,
    pub created_at: DateTime<Utc>,
}

impl AnalysisResultRecord {
    pub fn new(
        document_id: impl Into<String>,
        analysis_kind: AnalysisKind,
        page_number: u32,
        result_file_path: impl Into<PathBuf>,
        file_size: u64,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            document_id: document_id.into(),
            analysis_kind,
            page_number,
            result_file_path: result_file_path.into(),
            file_size,
            created_at: Utc::now(),
        }
    }
}

/// Progress snapshot for one (document, analysis kind) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub processed_pages: u64,
    pub max_page: u32,
    pub complete: bool,
}
