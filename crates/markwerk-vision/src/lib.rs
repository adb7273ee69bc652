// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// markwerk-vision — Image side of the Markwerk answer-sheet reader.
//
// Locates and rectifies the sheet in a photo or scan, binarizes it, detects
// bubbles, arranges them into 100 five-option questions, decides which option
// was marked, scores against the answer key, and renders a review overlay.
// Scanned PDFs are split into page images with `lopdf`.

pub mod classify;
pub mod detect;
pub mod geometry;
pub mod image;
pub mod overlay;
pub mod pdf;
pub mod pipeline;
pub mod scan;
pub mod source;
pub mod synthetic;

// Re-export the primary structs so callers can use `markwerk_vision::SheetEvaluator` etc.
pub use classify::{HeuristicClassifier, MarkClassifier, OptionDecoder, TrainedClassifier};
pub use crate::image::{FileDecoder, ImageProcessor};
pub use pdf::PdfPageSplitter;
pub use pipeline::{SheetEvaluator, SheetOutcome, SheetRequest};
pub use scan::SheetOutline;
pub use source::{ImageDecoder, PageSplitter, SingleImageSource};
