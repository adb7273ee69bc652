// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Markwerk — Core types, errors, configuration, and scoring shared across all
// crates.

pub mod config;
pub mod error;
pub mod human_errors;
pub mod scoring;
pub mod sink;
pub mod types;

pub use config::{AnswerKeySet, AppConfig, BubbleBounds, ClassifierConfig, PipelineConfig};
pub use error::MarkwerkError;
pub use sink::{ResultSink, SheetProvenance};
pub use types::*;
