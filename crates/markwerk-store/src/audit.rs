// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Audit trail — append-only log of every action taken on a stored result.
//
// Schema:
//   audit_log(
//     id         INTEGER PRIMARY KEY AUTOINCREMENT,
//     result_id  INTEGER NOT NULL,   -- results.id
//     timestamp  TEXT    NOT NULL,   -- RFC 3339
//     action     TEXT    NOT NULL,   -- "evaluated", "marked_reviewed"
//     actor      TEXT    NOT NULL,
//     note       TEXT
//   )

use markwerk_core::error::MarkwerkError;
use rusqlite::{Connection, Row, params};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{db_err, timestamp};

/// Action recorded when the pipeline stores a freshly evaluated sheet.
pub const ACTION_EVALUATED: &str = "evaluated";
/// Action recorded when a person signs off on a result.
pub const ACTION_MARKED_REVIEWED: &str = "marked_reviewed";

pub(crate) const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS audit_log (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    result_id  INTEGER NOT NULL REFERENCES results(id),
    timestamp  TEXT    NOT NULL,
    action     TEXT    NOT NULL,
    actor      TEXT    NOT NULL,
    note       TEXT
);
CREATE INDEX IF NOT EXISTS audit_log_result ON audit_log(result_id);";

/// A single entry in the audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: i64,
    pub result_id: i64,
    pub timestamp: String,
    pub action: String,
    pub actor: String,
    pub note: Option<String>,
}

impl AuditEntry {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            result_id: row.get(1)?,
            timestamp: row.get(2)?,
            action: row.get(3)?,
            actor: row.get(4)?,
            note: row.get(5)?,
        })
    }
}

/// Append one entry. Callers run this inside the transaction that changed
/// the result.
#[instrument(skip(conn, note), fields(%action, %actor))]
pub(crate) fn append(
    conn: &Connection,
    result_id: i64,
    action: &str,
    actor: &str,
    note: Option<&str>,
) -> Result<i64, MarkwerkError> {
    conn.execute(
        "INSERT INTO audit_log (result_id, timestamp, action, actor, note)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![result_id, timestamp(), action, actor, note],
    )
    .map_err(db_err)?;

    debug!(result_id, "audit entry recorded");
    Ok(conn.last_insert_rowid())
}

/// Entries for one result, newest first.
pub(crate) fn entries_for_result(conn: &Connection, result_id: i64) -> Result<Vec<AuditEntry>, MarkwerkError> {
    let mut stmt = conn
        .prepare(
            "SELECT id, result_id, timestamp, action, actor, note
             FROM audit_log
             WHERE result_id = ?1
             ORDER BY timestamp DESC, id DESC",
        )
        .map_err(db_err)?;

    let rows = stmt
        .query_map(params![result_id], AuditEntry::from_row)
        .map_err(db_err)?;

    let mut entries = Vec::new();
    for row in rows {
        entries.push(row.map_err(db_err)?);
    }
    Ok(entries)
}

/// The most recent `limit` entries across all results, newest first.
pub(crate) fn recent_entries(conn: &Connection, limit: u32) -> Result<Vec<AuditEntry>, MarkwerkError> {
    let mut stmt = conn
        .prepare(
            "SELECT id, result_id, timestamp, action, actor, note
             FROM audit_log
             ORDER BY id DESC
             LIMIT ?1",
        )
        .map_err(db_err)?;

    let rows = stmt.query_map(params![limit], AuditEntry::from_row).map_err(db_err)?;

    let mut entries = Vec::new();
    for row in rows {
        entries.push(row.map_err(db_err)?);
    }
    Ok(entries)
}

pub(crate) fn count(conn: &Connection) -> Result<u64, MarkwerkError> {
    conn.query_row("SELECT COUNT(*) FROM audit_log", [], |row| row.get(0))
        .map_err(db_err)
}
