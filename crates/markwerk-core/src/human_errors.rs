// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for markers and exam operators.
//
// Every technical error is mapped to plain English with a clear suggestion.
// The severity drives how a calling layer presents (or reports) the failure.

use crate::error::MarkwerkError;

/// Severity of an error from the operator's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Environmental hiccup (disk, database lock); trying again may work.
    Transient,
    /// The operator must change something (rescan, pick a version, fix config).
    ActionRequired,
    /// The input itself cannot be processed.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary.
    pub message: String,
    /// What the operator should try.
    pub suggestion: String,
    /// Whether repeating the same call could succeed.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `MarkwerkError` into a `HumanError`.
pub fn humanize_error(err: &MarkwerkError) -> HumanError {
    match err {
        MarkwerkError::ImageDecode(_) => HumanError {
            message: "The uploaded file isn't a readable image.".into(),
            suggestion: "Upload the answer sheet as a JPEG or PNG photo or scan.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        MarkwerkError::ImageEncode(_) => HumanError {
            message: "The marked-up copy of the sheet couldn't be saved.".into(),
            suggestion: "Check that the output folder exists and has free space.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        MarkwerkError::NoSheetDetected => HumanError {
            message: "No answer sheet could be found in this picture.".into(),
            suggestion: "Photograph the whole sheet on a plain, contrasting surface with even lighting.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        MarkwerkError::QuestionOutOfRange(q) => HumanError {
            message: "The sheet layout produced an impossible question number.".into(),
            suggestion: format!("Please report this sheet; question {q} is outside 1 to 100."),
            retriable: false,
            severity: Severity::Permanent,
        },

        MarkwerkError::UnknownVersion(version) => HumanError {
            message: format!("There is no answer key for sheet version '{version}'."),
            suggestion: "Check the version printed on the sheet, or add its answer key.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        MarkwerkError::MalformedKey { version, found } => HumanError {
            message: format!("The answer key for version '{version}' is incomplete."),
            suggestion: format!("An answer key needs exactly 100 answers but this one has {found}. Fix the key file."),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        MarkwerkError::ModelError(_) => HumanError {
            message: "The trained mark classifier couldn't be loaded.".into(),
            suggestion: "Check the model file, or switch back to the built-in heuristic classifier.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        MarkwerkError::UnsupportedDocument(detail) => HumanError {
            message: "This type of document isn't supported.".into(),
            suggestion: format!("Upload a photo, a scan, or a scanned PDF. ({detail})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        MarkwerkError::PdfError(_) => HumanError {
            message: "There's a problem with this PDF file.".into(),
            suggestion: "The file may be damaged. Try exporting the scan again.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        MarkwerkError::Config(detail) => HumanError {
            message: "The settings file contains an invalid value.".into(),
            suggestion: format!("Correct the setting and try again. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        MarkwerkError::Database(_) => HumanError {
            message: "The results database had a problem.".into(),
            suggestion: "Try again. The score itself was computed and can be re-run safely.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        MarkwerkError::IntegrityMismatch { .. } => HumanError {
            message: "This file is not the sheet that produced the stored result.".into(),
            suggestion: "Re-evaluate the sheet from the original scan.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        MarkwerkError::NotFound(what) => HumanError {
            message: "Nothing matched that request.".into(),
            suggestion: format!("Check the identifier and try again. ({what})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        MarkwerkError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Check the path.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "There is no permission to read or write that file.".into(),
                    suggestion: "Check the file permissions or choose another location.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, the disk may be full.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        MarkwerkError::Serialization(_) => HumanError {
            message: "A JSON file could not be read.".into(),
            suggestion: "Check the answer key, model, or settings file for syntax errors.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
    }
}
