// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Mark classification — deciding whether a bubble is filled, and which option
// of a group the student chose.

pub mod heuristic;
pub mod trained;

use image::GrayImage;
use image::imageops::crop_imm;
use markwerk_core::error::MarkwerkError;
use markwerk_core::{ClassifierConfig, OPTIONS_PER_QUESTION, OptionLetter, PipelineConfig};
use tracing::info;

use crate::detect::OptionGroup;
use crate::geometry::BoundingBox;

pub use heuristic::HeuristicClassifier;
pub use trained::{LogisticModel, TrainedClassifier};

/// Decides whether a single bubble interior counts as filled.
///
/// Implementations are shared across worker threads and must not mutate
/// state while classifying.
pub trait MarkClassifier: Send + Sync {
    /// Short strategy name for logs.
    fn name(&self) -> &'static str;

    /// `roi` is a crop of the inverted mark mask, not of the grayscale
    /// photo: ink is 255 and paper is 0. It may be empty.
    fn classify(&self, roi: &GrayImage) -> bool;
}

/// Construct the configured strategy. A trained model that fails to load is
/// an error, not a silent fallback.
pub fn build_classifier(
    config: &ClassifierConfig,
    pipeline: &PipelineConfig,
) -> Result<Box<dyn MarkClassifier>, MarkwerkError> {
    let heuristic = HeuristicClassifier::new(pipeline.fill_threshold);
    let classifier: Box<dyn MarkClassifier> = match config {
        ClassifierConfig::Heuristic => Box::new(heuristic),
        ClassifierConfig::Trained { model_path } => {
            Box::new(TrainedClassifier::load(model_path, heuristic)?)
        }
    };
    info!(classifier = classifier.name(), "Mark classifier ready");
    Ok(classifier)
}

/// Fraction of non-zero pixels in `roi`; zero when it is empty.
pub fn fill_ratio(roi: &GrayImage) -> f32 {
    let area = roi.width() as usize * roi.height() as usize;
    if area == 0 {
        return 0.0;
    }
    let ink = roi.pixels().filter(|p| p.0[0] > 0).count();
    ink as f32 / area as f32
}

/// Crop a bubble's interior from the mask, trimming `inset * min(w, h)`
/// (floored) from every side and clamping to the mask bounds.
pub fn interior_roi(mask: &GrayImage, bbox: &BoundingBox, inset: f32) -> GrayImage {
    let pad = (bbox.width.min(bbox.height) as f32 * inset) as u32;
    let x0 = bbox.x.saturating_add(pad).min(mask.width());
    let y0 = bbox.y.saturating_add(pad).min(mask.height());
    let x1 = (bbox.x + bbox.width).saturating_sub(pad).min(mask.width());
    let y1 = (bbox.y + bbox.height).saturating_sub(pad).min(mask.height());
    if x1 <= x0 || y1 <= y0 {
        return GrayImage::new(0, 0);
    }
    crop_imm(mask, x0, y0, x1 - x0, y1 - y0).to_image()
}

/// Index of the highest fill ratio, the leftmost on ties. `None` only when
/// `fills` is empty.
pub fn strongest_option(fills: &[f32]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, &fill) in fills.iter().enumerate() {
        if best.is_none_or(|b| fill > fills[b]) {
            best = Some(i);
        }
    }
    best
}

/// The strongest option, kept only when `accept` says its bubble is filled.
/// A rejected strongest option means no mark; weaker options are never
/// considered.
pub fn choose_option(fills: &[f32], accept: impl FnOnce(usize) -> bool) -> Option<usize> {
    strongest_option(fills).filter(|&i| accept(i))
}

/// Applies a [`MarkClassifier`] to every bubble of an option group.
pub struct OptionDecoder {
    classifier: Box<dyn MarkClassifier>,
    inset: f32,
}

impl OptionDecoder {
    pub fn new(classifier: Box<dyn MarkClassifier>, inset: f32) -> Self {
        Self { classifier, inset }
    }

    pub fn classifier_name(&self) -> &'static str {
        self.classifier.name()
    }

    /// Measure each bubble (recording its fill ratio) and return the chosen
    /// letter, if any. Only the strongest bubble is shown to the classifier.
    pub fn decode(&self, group: &mut OptionGroup, mask: &GrayImage) -> Option<OptionLetter> {
        let mut fills = [0f32; OPTIONS_PER_QUESTION];
        let rois = group.bubbles.each_mut().map(|bubble| {
            let roi = interior_roi(mask, &bubble.bounding_box, self.inset);
            bubble.fill_ratio = fill_ratio(&roi);
            roi
        });
        for (fill, bubble) in fills.iter_mut().zip(&group.bubbles) {
            *fill = bubble.fill_ratio;
        }

        choose_option(&fills, |i| self.classifier.classify(&rois[i])).and_then(OptionLetter::from_index)
    }
}
