//! Analysis status repository: one row per (document, analysis kind).
//!
//! Each kind's entry is addressed individually, so a write for one kind never
//! overwrites another kind's entry on the same document.

use std::collections::BTreeMap;

use rusqlite::{params, Connection, OptionalExtension};

use super::document_repo::parse_timestamp;
use super::DatabaseError;
use crate::models::{AnalysisKind, AnalysisStatus, StatusEntry};

fn decode_entry(status: String, last_updated: String) -> Result<StatusEntry, DatabaseError> {
    let status = AnalysisStatus::parse(&status).ok_or(DatabaseError::Corrupt {
        column: "status",
        value: status,
    })?;
    Ok(StatusEntry {
        status,
        last_updated: parse_timestamp("last_updated", &last_updated)?,
    })
}

/// Writes a single kind's status entry, replacing any previous value.
pub fn upsert(
    conn: &Connection,
    document_id: &str,
    kind: AnalysisKind,
    entry: &StatusEntry,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO analysis_status (document_id, analysis_kind, status, last_updated)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(document_id, analysis_kind) DO UPDATE SET
             status = excluded.status,
             last_updated = excluded.last_updated",
        params![
            document_id,
            kind.as_str(),
            entry.status.as_str(),
            entry.last_updated.to_rfc3339(),
        ],
    )?;
    Ok(())
}

/// Reads a single kind's status entry.
pub fn find(
    conn: &Connection,
    document_id: &str,
    kind: AnalysisKind,
) -> Result<Option<StatusEntry>, DatabaseError> {
    let raw: Option<(String, String)> = conn
        .query_row(
            "SELECT status, last_updated FROM analysis_status
             WHERE document_id = ?1 AND analysis_kind = ?2",
            params![document_id, kind.as_str()],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()?;
    raw.map(|(status, updated)| decode_entry(status, updated))
        .transpose()
}

/// Loads every status entry of a document. Rows for kinds this build does
/// not know are skipped.
pub fn load_map(
    conn: &Connection,
    document_id: &str,
) -> Result<BTreeMap<AnalysisKind, StatusEntry>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT analysis_kind, status, last_updated FROM analysis_status WHERE document_id = ?1",
    )?;
    let rows = stmt
        .query_map(params![document_id], |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut map = BTreeMap::new();
    for (kind, status, updated) in rows {
        match kind.parse::<AnalysisKind>() {
            Ok(kind) => {
                map.insert(kind, decode_entry(status, updated)?);
            }
            Err(_) => log::warn!(
                "Ignoring status row with unknown analysis kind '{}' for document {}",
                kind,
                document_id
            ),
        }
    }
    Ok(map)
}
