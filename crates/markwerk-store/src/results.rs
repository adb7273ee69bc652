// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Result store — evaluated sheets in SQLite, with the audit trail kept in the
// same database.
//
// Schema:
//   results(
//     id             INTEGER PRIMARY KEY AUTOINCREMENT,
//     student_id     TEXT    NOT NULL,   -- caller's id or a generated UUID
//     sheet_path     TEXT    NOT NULL,
//     sheet_hash     TEXT    NOT NULL,   -- SHA-256 hex digest
//     version        TEXT    NOT NULL,
//     total_score    INTEGER NOT NULL,
//     section_scores TEXT    NOT NULL,   -- JSON object
//     raw_answers    TEXT    NOT NULL,   -- JSON object, "1".."100"
//     overlay_path   TEXT    NOT NULL,
//     reviewed       INTEGER NOT NULL DEFAULT 0,
//     created_at     TEXT    NOT NULL    -- RFC 3339
//   )

use std::collections::BTreeMap;
use std::path::Path;

use markwerk_core::error::MarkwerkError;
use markwerk_core::{AnswerRecord, EvaluationResult, ResultSink, SheetProvenance};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::audit::{self, ACTION_EVALUATED, ACTION_MARKED_REVIEWED, AuditEntry};
use crate::integrity::verify_hash;
use crate::{db_err, timestamp};

pub(crate) const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS results (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    student_id     TEXT    NOT NULL,
    sheet_path     TEXT    NOT NULL,
    sheet_hash     TEXT    NOT NULL,
    version        TEXT    NOT NULL,
    total_score    INTEGER NOT NULL,
    section_scores TEXT    NOT NULL,
    raw_answers    TEXT    NOT NULL,
    overlay_path   TEXT    NOT NULL,
    reviewed       INTEGER NOT NULL DEFAULT 0,
    created_at     TEXT    NOT NULL
);
CREATE INDEX IF NOT EXISTS results_student ON results(student_id);";

const SELECT_COLUMNS: &str = "SELECT id, student_id, sheet_path, sheet_hash, version, total_score,
        section_scores, raw_answers, overlay_path, reviewed, created_at
 FROM results";

/// Reviewer recorded when `mark_reviewed` is given none.
pub const DEFAULT_REVIEWER: &str = "reviewer";

/// A persisted evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredResult {
    pub id: i64,
    pub student_id: String,
    pub sheet_path: String,
    pub sheet_hash: String,
    pub version: String,
    pub total_score: u32,
    pub section_scores: BTreeMap<String, u32>,
    pub answers: AnswerRecord,
    pub overlay_path: String,
    pub reviewed: bool,
    pub created_at: String,
}

/// Columns as SQLite returns them; JSON is decoded outside the row closure
/// so decode failures surface as `Serialization` rather than `Database`.
struct ResultRow {
    id: i64,
    student_id: String,
    sheet_path: String,
    sheet_hash: String,
    version: String,
    total_score: u32,
    section_scores: String,
    raw_answers: String,
    overlay_path: String,
    reviewed: bool,
    created_at: String,
}

impl ResultRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            student_id: row.get(1)?,
            sheet_path: row.get(2)?,
            sheet_hash: row.get(3)?,
            version: row.get(4)?,
            total_score: row.get(5)?,
            section_scores: row.get(6)?,
            raw_answers: row.get(7)?,
            overlay_path: row.get(8)?,
            reviewed: row.get::<_, i32>(9)? != 0,
            created_at: row.get(10)?,
        })
    }

    fn decode(self) -> Result<StoredResult, MarkwerkError> {
        Ok(StoredResult {
            id: self.id,
            student_id: self.student_id,
            sheet_path: self.sheet_path,
            sheet_hash: self.sheet_hash,
            version: self.version,
            total_score: self.total_score,
            section_scores: serde_json::from_str(&self.section_scores)?,
            answers: serde_json::from_str(&self.raw_answers)?,
            overlay_path: self.overlay_path,
            reviewed: self.reviewed,
            created_at: self.created_at,
        })
    }
}

/// SQLite-backed store of evaluated sheets and their audit trail.
///
/// Every write runs in a transaction together with its audit entry.
pub struct ResultStore {
    conn: Connection,
}

impl ResultStore {
    /// Open (or create) the database at `path`. WAL mode is enabled for
    /// concurrent readers.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, MarkwerkError> {
        let conn = Connection::open(path).map_err(db_err)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;").map_err(db_err)?;
        Self::init(conn)
    }

    /// Open an in-memory database (useful for tests).
    pub fn open_in_memory() -> Result<Self, MarkwerkError> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, MarkwerkError> {
        conn.execute_batch(CREATE_TABLE).map_err(db_err)?;
        conn.execute_batch(audit::CREATE_TABLE).map_err(db_err)?;
        debug!("result store opened");
        Ok(Self { conn })
    }

    /// Insert `result` and append an `evaluated` audit entry for `provenance.actor`.
    ///
    /// A result without a student id is stored under a fresh UUID.
    #[instrument(skip_all, fields(version = %result.version, total = result.total))]
    pub fn insert(&mut self, result: &EvaluationResult, provenance: &SheetProvenance) -> Result<i64, MarkwerkError> {
        let student_id = result
            .student_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let section_scores = serde_json::to_string(&result.section_scores)?;
        let raw_answers = serde_json::to_string(&result.answers)?;

        let tx = self.conn.transaction().map_err(db_err)?;
        tx.execute(
            "INSERT INTO results (student_id, sheet_path, sheet_hash, version, total_score,
                                  section_scores, raw_answers, overlay_path, reviewed, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, ?9)",
            params![
                student_id,
                provenance.sheet_path,
                provenance.sheet_hash,
                result.version,
                result.total,
                section_scores,
                raw_answers,
                result.overlay_image_path,
                timestamp(),
            ],
        )
        .map_err(db_err)?;
        let id = tx.last_insert_rowid();
        audit::append(
            &tx,
            id,
            ACTION_EVALUATED,
            &provenance.actor,
            Some("Auto-evaluated by the sheet pipeline"),
        )?;
        tx.commit().map_err(db_err)?;

        info!(id, %student_id, "result stored");
        Ok(id)
    }

    /// Fetch one result by id.
    pub fn get(&self, id: i64) -> Result<StoredResult, MarkwerkError> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = ?1");
        self.conn
            .query_row(&sql, params![id], ResultRow::from_row)
            .optional()
            .map_err(db_err)?
            .ok_or_else(|| MarkwerkError::NotFound(format!("result {id}")))?
            .decode()
    }

    /// The most recently stored result for `student_id`, if any.
    pub fn latest_for_student(&self, student_id: &str) -> Result<Option<StoredResult>, MarkwerkError> {
        let sql = format!("{SELECT_COLUMNS} WHERE student_id = ?1 ORDER BY created_at DESC, id DESC LIMIT 1");
        self.conn
            .query_row(&sql, params![student_id], ResultRow::from_row)
            .optional()
            .map_err(db_err)?
            .map(ResultRow::decode)
            .transpose()
    }

    /// One page of results, newest first.
    pub fn list(&self, skip: u32, limit: u32) -> Result<Vec<StoredResult>, MarkwerkError> {
        let sql = format!("{SELECT_COLUMNS} ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2");
        let mut stmt = self.conn.prepare(&sql).map_err(db_err)?;
        let rows = stmt
            .query_map(params![limit, skip], ResultRow::from_row)
            .map_err(db_err)?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row.map_err(db_err)?.decode()?);
        }
        Ok(results)
    }

    /// Flag a result as reviewed and append a `marked_reviewed` audit entry.
    #[instrument(skip(self, note))]
    pub fn mark_reviewed(
        &mut self,
        id: i64,
        reviewer: Option<&str>,
        note: Option<&str>,
    ) -> Result<StoredResult, MarkwerkError> {
        let tx = self.conn.transaction().map_err(db_err)?;
        let updated = tx
            .execute("UPDATE results SET reviewed = 1 WHERE id = ?1", params![id])
            .map_err(db_err)?;
        if updated == 0 {
            return Err(MarkwerkError::NotFound(format!("result {id}")));
        }
        audit::append(
            &tx,
            id,
            ACTION_MARKED_REVIEWED,
            reviewer.unwrap_or(DEFAULT_REVIEWER),
            note,
        )?;
        tx.commit().map_err(db_err)?;

        info!(id, "result marked reviewed");
        self.get(id)
    }

    /// Audit trail of one result, newest first.
    pub fn audit_entries(&self, result_id: i64) -> Result<Vec<AuditEntry>, MarkwerkError> {
        audit::entries_for_result(&self.conn, result_id)
    }

    /// The most recent `limit` audit entries across all results.
    pub fn recent_audit_entries(&self, limit: u32) -> Result<Vec<AuditEntry>, MarkwerkError> {
        audit::recent_entries(&self.conn, limit)
    }

    /// Check that `sheet` is byte-for-byte the sheet stored with result `id`.
    pub fn verify_sheet(&self, id: i64, sheet: &[u8]) -> Result<(), MarkwerkError> {
        let stored = self.get(id)?;
        verify_hash(sheet, &stored.sheet_hash)
    }

    /// Total number of stored results.
    pub fn count(&self) -> Result<u64, MarkwerkError> {
        self.conn
            .query_row("SELECT COUNT(*) FROM results", [], |row| row.get(0))
            .map_err(db_err)
    }

    /// Total number of audit entries.
    pub fn audit_count(&self) -> Result<u64, MarkwerkError> {
        audit::count(&self.conn)
    }
}

impl ResultSink for ResultStore {
    fn store(&mut self, result: &EvaluationResult, provenance: &SheetProvenance) -> markwerk_core::error::Result<i64> {
        self.insert(result, provenance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrity::hash_bytes;
    use markwerk_core::OptionLetter;

    fn make_store() -> ResultStore {
        ResultStore::open_in_memory().expect("open in-memory result store")
    }

    fn evaluation(student_id: Option<&str>, total: u32) -> EvaluationResult {
        let mut answers = AnswerRecord::new();
        answers.record(1, Some(OptionLetter::C)).unwrap();
        answers.record(2, Some(OptionLetter::A)).unwrap();
        let section_scores = (1..=5)
            .map(|s| (format!("subject_{s}"), if s == 1 { total } else { 0 }))
            .collect();
        EvaluationResult {
            student_id: student_id.map(str::to_owned),
            version: "A".into(),
            total,
            section_scores,
            answers,
            overlay_image_path: "/tmp/sheet_overlay.png".into(),
        }
    }

    fn provenance(bytes: &[u8]) -> SheetProvenance {
        SheetProvenance {
            sheet_path: "/uploads/sheet.jpg".into(),
            sheet_hash: hash_bytes(bytes),
            actor: "system".into(),
        }
    }

    #[test]
    fn stored_result_reads_back() {
        let mut store = make_store();
        let result = evaluation(Some("s-001"), 2);
        let id = store.insert(&result, &provenance(b"sheet")).unwrap();

        let stored = store.get(id).unwrap();
        assert_eq!(stored.student_id, "s-001");
        assert_eq!(stored.version, "A");
        assert_eq!(stored.total_score, 2);
        assert_eq!(stored.section_scores, result.section_scores);
        assert_eq!(stored.answers, result.answers);
        assert_eq!(stored.overlay_path, "/tmp/sheet_overlay.png");
        assert_eq!(stored.sheet_hash, hash_bytes(b"sheet"));
        assert!(!stored.reviewed);
    }

    #[test]
    fn anonymous_result_gets_a_uuid() {
        let mut store = make_store();
        let id = store.insert(&evaluation(None, 0), &provenance(b"x")).unwrap();
        let stored = store.get(id).unwrap();
        assert!(Uuid::parse_str(&stored.student_id).is_ok(), "{}", stored.student_id);
    }

    #[test]
    fn store_appends_evaluated_entry() {
        let mut store = make_store();
        let id = store.store(&evaluation(Some("s-1"), 1), &provenance(b"x")).unwrap();

        let entries = store.audit_entries(id).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, ACTION_EVALUATED);
        assert_eq!(entries[0].actor, "system");
        assert_eq!(entries[0].result_id, id);
    }

    #[test]
    fn missing_result_is_not_found() {
        let store = make_store();
        assert!(matches!(store.get(42), Err(MarkwerkError::NotFound(_))));
    }

    #[test]
    fn latest_for_student_picks_newest() {
        let mut store = make_store();
        store.insert(&evaluation(Some("s-7"), 1), &provenance(b"a")).unwrap();
        store.insert(&evaluation(Some("s-8"), 9), &provenance(b"b")).unwrap();
        let newest = store.insert(&evaluation(Some("s-7"), 2), &provenance(b"c")).unwrap();

        let latest = store.latest_for_student("s-7").unwrap().unwrap();
        assert_eq!(latest.id, newest);
        assert_eq!(latest.total_score, 2);
        assert!(store.latest_for_student("nobody").unwrap().is_none());
    }

    #[test]
    fn list_pages_newest_first() {
        let mut store = make_store();
        let ids: Vec<i64> = (0..5)
            .map(|i| store.insert(&evaluation(Some(&format!("s-{i}")), i), &provenance(b"p")).unwrap())
            .collect();

        let first_page = store.list(0, 2).unwrap();
        assert_eq!(first_page.iter().map(|r| r.id).collect::<Vec<_>>(), vec![ids[4], ids[3]]);
        let last_page = store.list(4, 10).unwrap();
        assert_eq!(last_page.len(), 1);
        assert_eq!(last_page[0].id, ids[0]);
        assert_eq!(store.count().unwrap(), 5);
    }

    #[test]
    fn review_flags_result_and_audits() {
        let mut store = make_store();
        let id = store.insert(&evaluation(Some("s-3"), 1), &provenance(b"x")).unwrap();

        let reviewed = store.mark_reviewed(id, Some("mr-ndlovu"), Some("Q2 double-checked")).unwrap();
        assert!(reviewed.reviewed);

        let entries = store.audit_entries(id).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, ACTION_MARKED_REVIEWED);
        assert_eq!(entries[0].actor, "mr-ndlovu");
        assert_eq!(entries[0].note.as_deref(), Some("Q2 double-checked"));
        assert_eq!(entries[1].action, ACTION_EVALUATED);
    }

    #[test]
    fn review_defaults_reviewer() {
        let mut store = make_store();
        let id = store.insert(&evaluation(None, 0), &provenance(b"x")).unwrap();
        store.mark_reviewed(id, None, None).unwrap();
        assert_eq!(store.audit_entries(id).unwrap()[0].actor, DEFAULT_REVIEWER);
    }

    #[test]
    fn reviewing_missing_result_writes_nothing() {
        let mut store = make_store();
        assert!(matches!(store.mark_reviewed(9, None, None), Err(MarkwerkError::NotFound(_))));
        assert_eq!(store.audit_count().unwrap(), 0);
    }

    #[test]
    fn sheet_verification() {
        let mut store = make_store();
        let id = store.insert(&evaluation(Some("s-5"), 0), &provenance(b"original")).unwrap();

        assert!(store.verify_sheet(id, b"original").is_ok());
        assert!(matches!(
            store.verify_sheet(id, b"tampered"),
            Err(MarkwerkError::IntegrityMismatch { .. })
        ));
    }
}
