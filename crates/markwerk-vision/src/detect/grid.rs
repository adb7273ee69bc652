// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Grid assembly — clusters bubbles into rows and splits rows into numbered
// five-option groups.

use markwerk_core::{OPTIONS_PER_QUESTION, PipelineConfig, QUESTION_COUNT};
use tracing::{debug, instrument};

use crate::detect::bubbles::BubbleRegion;

/// Bubbles sharing a printed line, left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionRow {
    pub bubbles: Vec<BubbleRegion>,
}

/// The A-E bubbles of one question.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionGroup {
    /// 1-based question number.
    pub question: u32,
    pub bubbles: [BubbleRegion; OPTIONS_PER_QUESTION],
}

#[derive(Debug, Clone)]
pub struct GridAssembler {
    row_tolerance: f32,
    max_questions: usize,
}

impl GridAssembler {
    pub fn new(row_tolerance: f32) -> Self {
        Self {
            row_tolerance,
            max_questions: QUESTION_COUNT,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.row_tolerance)
    }

    /// Cluster bubbles into rows.
    ///
    /// Bubbles are visited by center `y`, then `x`. A bubble joins the open
    /// row while its center lies within the tolerance of the row's first
    /// center; otherwise it starts a new row.
    pub fn rows(&self, bubbles: &[BubbleRegion]) -> Vec<QuestionRow> {
        let mut ordered = bubbles.to_vec();
        ordered.sort_by(|a, b| {
            a.center
                .1
                .total_cmp(&b.center.1)
                .then(a.center.0.total_cmp(&b.center.0))
        });

        let mut rows: Vec<QuestionRow> = Vec::new();
        for bubble in ordered {
            match rows.last_mut() {
                Some(row) if (bubble.center.1 - row.bubbles[0].center.1).abs() < self.row_tolerance => {
                    row.bubbles.push(bubble);
                }
                _ => rows.push(QuestionRow { bubbles: vec![bubble] }),
            }
        }

        for row in &mut rows {
            row.bubbles.sort_by(|a, b| a.center.0.total_cmp(&b.center.0));
        }
        rows
    }

    /// Number consecutive runs of five bubbles, row by row.
    ///
    /// A row's trailing partial run is dropped. Assembly stops as soon as the
    /// question limit is reached.
    #[instrument(skip_all, fields(bubbles = bubbles.len()))]
    pub fn assemble(&self, bubbles: &[BubbleRegion]) -> Vec<OptionGroup> {
        let rows = self.rows(bubbles);
        let mut groups = Vec::new();

        'rows: for row in &rows {
            for chunk in row.bubbles.chunks_exact(OPTIONS_PER_QUESTION) {
                if groups.len() == self.max_questions {
                    break 'rows;
                }
                let Ok(options) = <[BubbleRegion; OPTIONS_PER_QUESTION]>::try_from(chunk) else {
                    continue;
                };
                groups.push(OptionGroup {
                    question: groups.len() as u32 + 1,
                    bubbles: options,
                });
            }
        }

        debug!(rows = rows.len(), groups = groups.len(), "Option groups assembled");
        groups
    }
}
