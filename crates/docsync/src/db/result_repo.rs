//! Analysis result repository: operations for the `analysis_results` table.

use std::path::PathBuf;

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::document_repo::parse_timestamp;
use super::DatabaseError;
use crate::models::{AnalysisKind, AnalysisResultRecord};

/// A raw analysis result row from the database.
#[derive(Debug, Clone)]
struct ResultRow {
    id: String,
    document_id: String,
    analysis_kind: String,
    page_number: u32,
    result_file_path: String,
    file_size: i64,
    created_at: String,
}

impl ResultRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            document_id: row.get("document_id")?,
            analysis_kind: row.get("analysis_kind")?,
            page_number: row.get("page_number")?,
            result_file_path: row.get("result_file_path")?,
            file_size: row.get("file_size")?,
            created_at: row.get("created_at")?,
        })
    }

    fn into_record(self) -> Result<AnalysisResultRecord, DatabaseError> {
        let analysis_kind =
            self.analysis_kind
                .parse::<AnalysisKind>()
                .map_err(|_| DatabaseError::Corrupt {
                    column: "analysis_kind",
                    value: self.analysis_kind.clone(),
                })?;
        Ok(AnalysisResultRecord {
            created_at: parse_timestamp("created_at", &self.created_at)?,
            id: self.id,
            document_id: self.document_id,
            analysis_kind,
            page_number: self.page_number,
            result_file_path: PathBuf::from(self.result_file_path),
            file_size: u64::try_from(self.file_size).unwrap_or(0),
        })
    }
}

/// Checks whether a result exists for the (document, kind, page) tuple.
pub fn exists(
    conn: &Connection,
    document_id: &str,
    kind: AnalysisKind,
    page_number: u32,
) -> Result<bool, DatabaseError> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM analysis_results
             WHERE document_id = ?1 AND analysis_kind = ?2 AND page_number = ?3",
            params![document_id, kind.as_str(), page_number],
            |r| r.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Inserts a result row. Callers are expected to have checked [`exists`]
/// under the same lock; a duplicate is still ignored rather than rejected.
/// Returns whether a row was written.
pub fn insert(conn: &Connection, record: &AnalysisResultRecord) -> Result<bool, DatabaseError> {
    let count = conn.execute(
        "INSERT OR IGNORE INTO analysis_results
         (id, document_id, analysis_kind, page_number, result_file_path, file_size, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            record.id,
            record.document_id,
            record.analysis_kind.as_str(),
            record.page_number,
            record.result_file_path.to_string_lossy(),
            i64::try_from(record.file_size).unwrap_or(i64::MAX),
            record.created_at.to_rfc3339(),
        ],
    )?;
    Ok(count > 0)
}

/// Counts results for a document and analysis kind.
pub fn count(
    conn: &Connection,
    document_id: &str,
    kind: AnalysisKind,
) -> Result<u64, DatabaseError> {
    let count: u64 = conn.query_row(
        "SELECT COUNT(*) FROM analysis_results WHERE document_id = ?1 AND analysis_kind = ?2",
        params![document_id, kind.as_str()],
        |r| r.get(0),
    )?;
    Ok(count)
}

/// Highest stored page number, or `None` when nothing is stored.
pub fn max_page(
    conn: &Connection,
    document_id: &str,
    kind: AnalysisKind,
) -> Result<Option<u32>, DatabaseError> {
    let max: Option<u32> = conn.query_row(
        "SELECT MAX(page_number) FROM analysis_results WHERE document_id = ?1 AND analysis_kind = ?2",
        params![document_id, kind.as_str()],
        |r| r.get(0),
    )?;
    Ok(max)
}

/// Lists results for a document and analysis kind, ascending by page.
pub fn list(
    conn: &Connection,
    document_id: &str,
    kind: AnalysisKind,
) -> Result<Vec<AnalysisResultRecord>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT * FROM analysis_results
         WHERE document_id = ?1 AND analysis_kind = ?2
         ORDER BY page_number ASC",
    )?;
    let rows = stmt
        .query_map(params![document_id, kind.as_str()], ResultRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(ResultRow::into_record).collect()
}

/// Finds a single result by its ID.
pub fn find_by_id(
    conn: &Connection,
    id: &str,
) -> Result<Option<AnalysisResultRecord>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT * FROM analysis_results WHERE id = ?1",
            params![id],
            ResultRow::from_row,
        )
        .optional()?;
    row.map(ResultRow::into_record).transpose()
}

/// Deletes every result of a document, all kinds. Returns the number of rows
/// deleted.
pub fn delete_for_document(conn: &Connection, document_id: &str) -> Result<u64, DatabaseError> {
    let count = conn.execute(
        "DELETE FROM analysis_results WHERE document_id = ?1",
        params![document_id],
    )?;
    Ok(count as u64)
}
