// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Markwerk.

use thiserror::Error;

/// Top-level error type for all Markwerk operations.
///
/// Every variant aborts the evaluation of a single sheet only. None of them is
/// retried: the input is static, so a retry would reproduce the failure.
#[derive(Debug, Error)]
pub enum MarkwerkError {
    // -- Sheet extraction --
    #[error("image could not be decoded: {0}")]
    ImageDecode(String),

    #[error("image could not be encoded: {0}")]
    ImageEncode(String),

    #[error("no sheet detected: the edge map contains no contours")]
    NoSheetDetected,

    #[error("question number {0} is outside 1..=100")]
    QuestionOutOfRange(u32),

    // -- Answer keys --
    #[error("unknown answer key version '{0}'")]
    UnknownVersion(String),

    #[error("answer key for version '{version}' must have 100 entries (found {found})")]
    MalformedKey { version: String, found: usize },

    // -- Classifier --
    #[error("mark classifier model error: {0}")]
    ModelError(String),

    // -- Documents --
    #[error("unsupported document: {0}")]
    UnsupportedDocument(String),

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    // -- Configuration --
    #[error("configuration error: {0}")]
    Config(String),

    // -- Storage / persistence --
    #[error("database error: {0}")]
    Database(String),

    #[error("integrity check failed: expected {expected}, got {actual}")]
    IntegrityMismatch { expected: String, actual: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, MarkwerkError>;
