//! Document repository: CRUD operations for the `documents` table.
//!
//! Functions take a borrowed connection so that callers can compose several
//! of them under a single [`Database::with_conn`](super::Database::with_conn)
//! lock.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{status_repo, DatabaseError};
use crate::models::Document;

/// A raw document row from the database.
#[derive(Debug, Clone)]
struct DocumentRow {
    id: String,
    file_name: String,
    file_size: i64,
    file_path: String,
    mime_type: String,
    upload_date: String,
    status: String,
}

impl DocumentRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            file_name: row.get("file_name")?,
            file_size: row.get("file_size")?,
            file_path: row.get("file_path")?,
            mime_type: row.get("mime_type")?,
            upload_date: row.get("upload_date")?,
            status: row.get("status")?,
        })
    }

    fn into_document(self, conn: &Connection) -> Result<Document, DatabaseError> {
        let status_map = status_repo::load_map(conn, &self.id)?;
        Ok(Document {
            upload_date: parse_timestamp("upload_date", &self.upload_date)?,
            file_size: u64::try_from(self.file_size).unwrap_or(0),
            id: self.id,
            file_name: self.file_name,
            file_path: self.file_path,
            mime_type: self.mime_type,
            status: self.status,
            status_map,
        })
    }
}

pub(crate) fn parse_timestamp(
    column: &'static str,
    value: &str,
) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| DatabaseError::Corrupt {
            column,
            value: value.to_string(),
        })
}

/// Returns true if a document with `id` exists.
pub fn exists(conn: &Connection, id: &str) -> Result<bool, DatabaseError> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM documents WHERE id = ?1", params![id], |r| {
            r.get(0)
        })
        .optional()?;
    Ok(found.is_some())
}

/// Fails with [`DatabaseError::NotFound`] if the document does not exist.
pub fn ensure_exists(conn: &Connection, id: &str) -> Result<(), DatabaseError> {
    if exists(conn, id)? {
        Ok(())
    } else {
        Err(DatabaseError::NotFound(id.to_string()))
    }
}

/// Inserts or updates a document's own columns. `status_map` is ignored:
/// status rows are only ever written through [`status_repo::upsert`].
pub fn upsert(conn: &Connection, doc: &Document) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO documents (id, file_name, file_size, file_path, mime_type, upload_date, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(id) DO UPDATE SET
             file_name = excluded.file_name,
             file_size = excluded.file_size,
             file_path = excluded.file_path,
             mime_type = excluded.mime_type,
             upload_date = excluded.upload_date,
             status = excluded.status",
        params![
            doc.id,
            doc.file_name,
            i64::try_from(doc.file_size).unwrap_or(i64::MAX),
            doc.file_path,
            doc.mime_type,
            doc.upload_date.to_rfc3339(),
            doc.status,
        ],
    )?;
    Ok(())
}

/// Finds a document by its ID, including its status map.
pub fn find_by_id(conn: &Connection, id: &str) -> Result<Option<Document>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT * FROM documents WHERE id = ?1",
            params![id],
            DocumentRow::from_row,
        )
        .optional()?;
    row.map(|r| r.into_document(conn)).transpose()
}

/// Finds the most recently uploaded document with the given file name.
pub fn find_by_file_name(
    conn: &Connection,
    file_name: &str,
) -> Result<Option<Document>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT * FROM documents WHERE file_name = ?1 ORDER BY upload_date DESC LIMIT 1",
            params![file_name],
            DocumentRow::from_row,
        )
        .optional()?;
    row.map(|r| r.into_document(conn)).transpose()
}

/// Lists all documents, newest upload first.
pub fn list_all(conn: &Connection) -> Result<Vec<Document>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT * FROM documents ORDER BY upload_date DESC")?;
    let rows = stmt
        .query_map([], DocumentRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(|r| r.into_document(conn)).collect()
}

/// Deletes a document. Its analysis results and status rows go with it.
/// Returns whether a row was deleted.
pub fn delete(conn: &Connection, id: &str) -> Result<bool, DatabaseError> {
    let count = conn.execute("DELETE FROM documents WHERE id = ?1", params![id])?;
    Ok(count > 0)
}
