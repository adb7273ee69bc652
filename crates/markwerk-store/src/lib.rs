// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// markwerk-store — persistence for evaluated sheets: a SQLite result store,
// its append-only audit trail, and SHA-256 fingerprints of the sheets.

pub mod audit;
pub mod integrity;
pub mod results;

use chrono::{SecondsFormat, Utc};
use markwerk_core::error::MarkwerkError;

pub use audit::AuditEntry;
pub use integrity::{hash_bytes, hash_file, verify_hash};
pub use results::{ResultStore, StoredResult};

/// Convert a `rusqlite::Error` into a `MarkwerkError::Database`.
pub(crate) fn db_err(e: rusqlite::Error) -> MarkwerkError {
    MarkwerkError::Database(e.to_string())
}

/// Current time as fixed-width RFC 3339, so text order is time order.
pub(crate) fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
