// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Configuration: pipeline tuning parameters, classifier selection, the answer
// key set, and application-level settings.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::{MarkwerkError, Result};
use crate::types::{AnswerKey, QUESTION_COUNT};

/// Size and shape limits a contour's bounding box must satisfy to count as a
/// bubble. Width and height bounds are exclusive, the aspect bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BubbleBounds {
    pub min_side: u32,
    pub max_side: u32,
    pub min_aspect: f32,
    pub max_aspect: f32,
    pub min_area: f64,
}

impl Default for BubbleBounds {
    fn default() -> Self {
        Self {
            min_side: 15,
            max_side: 100,
            min_aspect: 0.7,
            max_aspect: 1.3,
            min_area: 100.0,
        }
    }
}

/// Tuning parameters for the sheet-to-answers pipeline.
///
/// The pixel-valued parameters assume the rectified sheet has been capped to
/// `max_dimension` on its longer side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Canny hysteresis thresholds for sheet-boundary detection.
    pub canny_low: f32,
    pub canny_high: f32,
    /// Side of the square Gaussian kernel applied before edge detection.
    pub edge_blur_kernel: u32,
    /// Polygon approximation tolerance as a fraction of contour perimeter.
    pub polygon_tolerance: f64,
    /// Contours enclosing less than this fraction of the image are never
    /// taken as the sheet outline. `0.0` accepts the largest four-cornered
    /// contour whatever its size, as a plain largest-quad search does.
    pub min_sheet_fraction: f64,
    /// Longer side of the rectified sheet is capped to this many pixels.
    pub max_dimension: u32,
    /// Side of the adaptive threshold's Gaussian window (odd).
    pub threshold_window: u32,
    /// Offset subtracted from the local mean.
    pub threshold_offset: f32,
    /// Mask pixels within this distance of the image edge are cleared, so a
    /// sliver of background left by rectification cannot enclose the bubbles.
    /// `0` keeps the whole mask.
    pub mask_border: u32,
    pub bubble_bounds: BubbleBounds,
    /// Maximum vertical distance (exclusive) between a bubble center and its
    /// row's reference center.
    pub row_tolerance: f32,
    /// Fraction of `min(w, h)` trimmed from each side of a bubble before
    /// measuring its fill.
    pub roi_inset: f32,
    /// A bubble counts as filled only when its fill ratio exceeds this.
    pub fill_threshold: f32,
    /// Overlay marker radius and stroke width in pixels.
    pub overlay_radius: i32,
    pub overlay_thickness: i32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            canny_low: 50.0,
            canny_high: 150.0,
            edge_blur_kernel: 5,
            polygon_tolerance: 0.02,
            min_sheet_fraction: 0.1,
            max_dimension: 2000,
            threshold_window: 25,
            threshold_offset: 10.0,
            mask_border: 5,
            bubble_bounds: BubbleBounds::default(),
            row_tolerance: 25.0,
            roi_inset: 0.1,
            fill_threshold: 0.15,
            overlay_radius: 15,
            overlay_thickness: 2,
        }
    }
}

impl PipelineConfig {
    /// Reject parameter combinations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.threshold_window == 0 || self.threshold_window % 2 == 0 {
            return Err(MarkwerkError::Config(format!(
                "threshold_window must be odd and positive, got {}",
                self.threshold_window
            )));
        }
        if self.edge_blur_kernel == 0 || self.edge_blur_kernel % 2 == 0 {
            return Err(MarkwerkError::Config(format!(
                "edge_blur_kernel must be odd and positive, got {}",
                self.edge_blur_kernel
            )));
        }
        if self.max_dimension == 0 {
            return Err(MarkwerkError::Config("max_dimension must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.min_sheet_fraction) {
            return Err(MarkwerkError::Config(format!(
                "min_sheet_fraction must be in [0, 1], got {}",
                self.min_sheet_fraction
            )));
        }
        if !(0.0..0.5).contains(&self.roi_inset) {
            return Err(MarkwerkError::Config(format!(
                "roi_inset must be in [0, 0.5), got {}",
                self.roi_inset
            )));
        }
        Ok(())
    }
}

/// Which mark classifier strategy to construct.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierConfig {
    /// Fill-ratio threshold; needs no model.
    #[default]
    Heuristic,
    /// Logistic model loaded from a JSON file.
    Trained { model_path: PathBuf },
}

/// All answer keys, by version. Loaded once at startup and shared read-only.
///
/// Entries are not validated on load so that a single bad version cannot stop
/// the others from being served; [`AnswerKeySet::resolve`] validates the one
/// that is requested.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerKeySet {
    keys: BTreeMap<String, Vec<String>>,
}

impl AnswerKeySet {
    pub fn new(keys: BTreeMap<String, Vec<String>>) -> Self {
        Self { keys }
    }

    /// Parse the persisted form: a JSON object of version to letter array.
    pub fn from_json(json: &str) -> Result<Self> {
        let set: Self = serde_json::from_str(json)?;
        debug!(versions = set.keys.len(), "answer keys parsed");
        Ok(set)
    }

    /// Load the persisted form from a file.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let set = Self::from_json(&data)?;
        info!(versions = set.keys.len(), "answer keys loaded");
        Ok(set)
    }

    /// Look up and validate the key for `version`.
    pub fn resolve(&self, version: &str) -> Result<AnswerKey> {
        let entries = self
            .keys
            .get(version)
            .ok_or_else(|| MarkwerkError::UnknownVersion(version.to_owned()))?;
        if entries.len() != QUESTION_COUNT {
            return Err(MarkwerkError::MalformedKey {
                version: version.to_owned(),
                found: entries.len(),
            });
        }
        Ok(AnswerKey {
            version: version.to_owned(),
            correct_options: entries.clone(),
        })
    }

    /// Versions and their raw entry counts, in version order.
    pub fn versions(&self) -> impl Iterator<Item = (&str, usize)> {
        self.keys.iter().map(|(v, e)| (v.as_str(), e.len()))
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Application settings for the command-line front end.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// JSON file holding the answer key set.
    pub answer_keys_path: PathBuf,
    /// SQLite database for results and the audit trail. `None` uses the
    /// default location in the data directory.
    pub database_path: Option<PathBuf>,
    /// Directory for overlay images. `None` writes next to the input.
    pub overlay_dir: Option<PathBuf>,
    /// Whether evaluated sheets are persisted.
    pub store_results: bool,
    pub classifier: ClassifierConfig,
    pub pipeline: PipelineConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            answer_keys_path: PathBuf::from("answer_keys.json"),
            database_path: None,
            overlay_dir: None,
            store_results: true,
            classifier: ClassifierConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load settings from a JSON file; missing fields take their defaults.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&data)?;
        config.pipeline.validate()?;
        Ok(config)
    }
}
