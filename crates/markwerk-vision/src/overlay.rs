// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Review overlay — the rectified sheet with each chosen bubble circled.

use std::path::Path;

use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_circle_mut;
use markwerk_core::PipelineConfig;
use markwerk_core::error::MarkwerkError;
use tracing::{debug, instrument};

use crate::image::ImageProcessor;

const MARK_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

#[derive(Debug, Clone)]
pub struct OverlayRenderer {
    radius: i32,
    thickness: i32,
}

impl OverlayRenderer {
    pub fn new(radius: i32, thickness: i32) -> Self {
        Self {
            radius,
            thickness: thickness.max(1),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.overlay_radius, config.overlay_thickness)
    }

    /// Copy `sheet` and draw a green ring centred on each mark.
    ///
    /// The stroke is `thickness` concentric one-pixel circles straddling
    /// `radius`.
    pub fn render(&self, sheet: &RgbImage, marks: impl IntoIterator<Item = (f32, f32)>) -> RgbImage {
        let mut canvas = sheet.clone();
        let inner = self.radius - self.thickness / 2;
        let mut drawn = 0usize;
        for (cx, cy) in marks {
            let center = (cx as i32, cy as i32);
            for r in inner..inner + self.thickness {
                if r > 0 {
                    draw_hollow_circle_mut(&mut canvas, center, r, MARK_COLOR);
                }
            }
            drawn += 1;
        }
        debug!(marks = drawn, "Overlay rendered");
        canvas
    }

    /// Encode the overlay as PNG at `path`.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn write(&self, overlay: RgbImage, path: impl AsRef<Path>) -> Result<(), MarkwerkError> {
        ImageProcessor::from_dynamic(DynamicImage::ImageRgb8(overlay)).save(path)
    }
}

impl Default for OverlayRenderer {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}
