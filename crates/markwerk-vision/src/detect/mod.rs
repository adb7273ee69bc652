// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Detection stage — finding bubble candidates in the mark mask and arranging
// them into numbered option groups.

pub mod bubbles;
pub mod grid;

pub use bubbles::{BubbleDetector, BubbleRegion};
pub use grid::{GridAssembler, OptionGroup, QuestionRow};
