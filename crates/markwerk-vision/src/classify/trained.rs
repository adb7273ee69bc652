// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Trained mark classifier — a standardized logistic model over a 20x20
// resample of the bubble interior.
//
// The model is a JSON document:
//
// ```json
// { "mean": [400 floats], "scale": [400 floats], "weights": [400 floats], "bias": 0.0 }
// ```

use std::path::Path;

use image::GrayImage;
use image::imageops::{FilterType, resize};
use markwerk_core::error::MarkwerkError;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::classify::{HeuristicClassifier, MarkClassifier};

/// Side of the square feature patch.
pub const FEATURE_SIDE: u32 = 20;

/// Number of features per bubble.
pub const FEATURE_LEN: usize = (FEATURE_SIDE * FEATURE_SIDE) as usize;

/// Linear decision function over standardized pixel features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub mean: Vec<f32>,
    pub scale: Vec<f32>,
    pub weights: Vec<f32>,
    pub bias: f32,
}

impl LogisticModel {
    pub fn from_json(json: &str) -> Result<Self, MarkwerkError> {
        let model: Self = serde_json::from_str(json)
            .map_err(|err| MarkwerkError::ModelError(format!("invalid model JSON: {err}")))?;
        model.validate()?;
        Ok(model)
    }

    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MarkwerkError> {
        let json = std::fs::read_to_string(path.as_ref()).map_err(|err| {
            MarkwerkError::ModelError(format!("cannot read {}: {err}", path.as_ref().display()))
        })?;
        let model = Self::from_json(&json)?;
        info!(bias = model.bias, "Mark model loaded");
        Ok(model)
    }

    /// Every vector must hold exactly [`FEATURE_LEN`] finite values.
    pub fn validate(&self) -> Result<(), MarkwerkError> {
        for (name, values) in [("mean", &self.mean), ("scale", &self.scale), ("weights", &self.weights)] {
            if values.len() != FEATURE_LEN {
                return Err(MarkwerkError::ModelError(format!(
                    "{name} has {} entries, expected {FEATURE_LEN}",
                    values.len()
                )));
            }
            if values.iter().any(|v| !v.is_finite()) {
                return Err(MarkwerkError::ModelError(format!("{name} contains non-finite values")));
            }
        }
        if !self.bias.is_finite() {
            return Err(MarkwerkError::ModelError("bias is not finite".into()));
        }
        Ok(())
    }

    /// Signed distance from the decision boundary; positive means filled.
    /// A zero scale entry is treated as one.
    pub fn decision(&self, features: &[f32]) -> f32 {
        let mut z = self.bias;
        for (i, &x) in features.iter().enumerate().take(FEATURE_LEN) {
            let scale = if self.scale[i] == 0.0 { 1.0 } else { self.scale[i] };
            z += self.weights[i] * (x - self.mean[i]) / scale;
        }
        z
    }
}

/// Bilinear resample of `roi` to 20x20, scaled to `[0, 1]`, row-major.
/// An empty ROI yields all zeros.
///
/// `roi` is a mask crop, so ink reads as 1.0 and paper as 0.0. Models must be
/// trained on mask crops, not on grayscale patches where ink is dark.
pub fn roi_features(roi: &GrayImage) -> Vec<f32> {
    if roi.width() == 0 || roi.height() == 0 {
        return vec![0.0; FEATURE_LEN];
    }
    resize(roi, FEATURE_SIDE, FEATURE_SIDE, FilterType::Triangle)
        .pixels()
        .map(|p| p.0[0] as f32 / 255.0)
        .collect()
}

/// Uses the logistic model when one is loaded, else the heuristic.
#[derive(Debug, Clone)]
pub struct TrainedClassifier {
    model: Option<LogisticModel>,
    fallback: HeuristicClassifier,
}

impl TrainedClassifier {
    pub fn new(model: LogisticModel, fallback: HeuristicClassifier) -> Result<Self, MarkwerkError> {
        model.validate()?;
        Ok(Self {
            model: Some(model),
            fallback,
        })
    }

    /// A classifier with no model that defers to the heuristic.
    pub fn untrained(fallback: HeuristicClassifier) -> Self {
        warn!("No mark model available; trained classifier will use the heuristic");
        Self {
            model: None,
            fallback,
        }
    }

    pub fn load(path: impl AsRef<Path>, fallback: HeuristicClassifier) -> Result<Self, MarkwerkError> {
        Self::new(LogisticModel::load(path)?, fallback)
    }

    pub fn is_trained(&self) -> bool {
        self.model.is_some()
    }
}

impl MarkClassifier for TrainedClassifier {
    fn name(&self) -> &'static str {
        if self.is_trained() { "trained" } else { "trained-fallback" }
    }

    fn classify(&self, roi: &GrayImage) -> bool {
        match &self.model {
            Some(model) => model.decision(&roi_features(roi)) > 0.0,
            None => self.fallback.classify(roi),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    /// Mean ink model: filled when the average pixel exceeds 0.3.
    fn mean_ink_model() -> LogisticModel {
        LogisticModel {
            mean: vec![0.0; FEATURE_LEN],
            scale: vec![1.0; FEATURE_LEN],
            weights: vec![1.0 / FEATURE_LEN as f32; FEATURE_LEN],
            bias: -0.3,
        }
    }

    #[test]
    fn features_are_normalized_patch() {
        let roi = GrayImage::from_pixel(33, 27, Luma([255]));
        let features = roi_features(&roi);
        assert_eq!(features.len(), FEATURE_LEN);
        assert!(features.iter().all(|&f| (f - 1.0).abs() < 1e-6));
        assert!(roi_features(&GrayImage::new(0, 0)).iter().all(|&f| f == 0.0));
    }

    #[test]
    fn ink_reads_high_and_paper_low() {
        // Top half inked, as the decoder crops it from the mask.
        let mut roi = GrayImage::new(24, 24);
        for y in 0..12 {
            for x in 0..24 {
                roi.put_pixel(x, y, Luma([255]));
            }
        }
        let features = roi_features(&roi);
        let side = FEATURE_SIDE as usize;
        assert!(features[..side].iter().all(|&f| f > 0.99));
        assert!(features[FEATURE_LEN - side..].iter().all(|&f| f < 0.01));
    }

    #[test]
    fn model_separates_ink_from_blank() {
        let classifier = TrainedClassifier::new(mean_ink_model(), HeuristicClassifier::default()).unwrap();
        assert!(classifier.classify(&GrayImage::from_pixel(24, 24, Luma([255]))));
        assert!(!classifier.classify(&GrayImage::new(24, 24)));
        assert_eq!(classifier.name(), "trained");
    }

    #[test]
    fn zero_scale_is_treated_as_unit() {
        let mut model = mean_ink_model();
        model.scale = vec![0.0; FEATURE_LEN];
        assert!(model.decision(&vec![1.0; FEATURE_LEN]) > 0.0);
    }

    #[test]
    fn wrong_length_is_a_model_error() {
        let mut model = mean_ink_model();
        model.weights.pop();
        let err = TrainedClassifier::new(model, HeuristicClassifier::default()).unwrap_err();
        assert!(matches!(err, MarkwerkError::ModelError(msg) if msg.contains("weights")));
    }

    #[test]
    fn json_round_trip_and_bad_json() {
        let json = serde_json::to_string(&mean_ink_model()).unwrap();
        assert_eq!(LogisticModel::from_json(&json).unwrap(), mean_ink_model());
        assert!(matches!(LogisticModel::from_json("{}"), Err(MarkwerkError::ModelError(_))));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, serde_json::to_string(&mean_ink_model()).unwrap()).unwrap();
        let classifier = TrainedClassifier::load(&path, HeuristicClassifier::default()).unwrap();
        assert!(classifier.is_trained());
    }

    #[test]
    fn untrained_defers_to_heuristic() {
        let classifier = TrainedClassifier::untrained(HeuristicClassifier::new(0.5));
        assert!(!classifier.is_trained());
        assert_eq!(classifier.name(), "trained-fallback");
        assert!(classifier.classify(&GrayImage::from_pixel(10, 10, Luma([255]))));
        assert!(!classifier.classify(&GrayImage::new(10, 10)));
    }
}
