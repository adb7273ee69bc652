// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Persistence seam for evaluated sheets.

use crate::error::Result;
use crate::types::EvaluationResult;

/// Where an evaluated sheet came from, recorded alongside its result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetProvenance {
    /// Path of the uploaded sheet as seen by the caller.
    pub sheet_path: String,
    /// SHA-256 hex digest of the sheet bytes.
    pub sheet_hash: String,
    /// Who triggered the evaluation (e.g. `"system"` or an operator name).
    pub actor: String,
}

/// Receives evaluated sheets.
///
/// Implementations store the result and append an audit entry; the pipeline
/// never sees database schemas.
pub trait ResultSink {
    /// Persist `result`, returning the stored record's identifier.
    fn store(&mut self, result: &EvaluationResult, provenance: &SheetProvenance) -> Result<i64>;
}
