// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fill-ratio threshold classifier.

use image::GrayImage;

use crate::classify::{MarkClassifier, fill_ratio};

/// Filled when more than `threshold` of the interior is ink.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeuristicClassifier {
    threshold: f32,
}

impl HeuristicClassifier {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }
}

impl Default for HeuristicClassifier {
    fn default() -> Self {
        Self::new(0.15)
    }
}

impl MarkClassifier for HeuristicClassifier {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn classify(&self, roi: &GrayImage) -> bool {
        fill_ratio(roi) > self.threshold
    }
}
