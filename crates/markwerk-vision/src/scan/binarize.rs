// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Adaptive binarization of the rectified sheet into an inverted mark mask.

use image::{GrayImage, Luma};
use markwerk_core::PipelineConfig;
use tracing::{debug, instrument};

use crate::scan::kernel_sigma;

/// Gaussian-weighted adaptive threshold, inverted so that ink becomes 255.
///
/// For each pixel the threshold is the Gaussian-weighted mean of its
/// `window x window` neighbourhood minus `offset`. A pixel at or below the
/// threshold is foreground. Borders replicate the edge pixel.
///
/// An optional clearance band along the image edge is forced to background.
#[derive(Debug, Clone)]
pub struct Binarizer {
    offset: f32,
    kernel: Vec<f32>,
    border: u32,
}

impl Binarizer {
    pub fn new(window: u32, offset: f32) -> Self {
        Self {
            offset,
            kernel: gaussian_kernel(window),
            border: 0,
        }
    }

    pub fn with_border(mut self, border: u32) -> Self {
        self.border = border;
        self
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.threshold_window, config.threshold_offset).with_border(config.mask_border)
    }

    #[instrument(skip_all, fields(width = gray.width(), height = gray.height()))]
    pub fn binarize(&self, gray: &GrayImage) -> GrayImage {
        let (width, height) = gray.dimensions();
        let mean = self.local_mean(gray);

        let border = self.border;
        let mask = GrayImage::from_fn(width, height, |x, y| {
            if x < border || y < border || x + border >= width || y + border >= height {
                return Luma([0]);
            }
            let value = gray.get_pixel(x, y).0[0] as f32;
            let threshold = mean[(y * width + x) as usize] - self.offset;
            if value <= threshold { Luma([255]) } else { Luma([0]) }
        });

        debug!(
            foreground = mask.pixels().filter(|p| p.0[0] > 0).count(),
            "Mark mask computed"
        );
        mask
    }

    /// Separable Gaussian smoothing: a horizontal pass then a vertical pass.
    fn local_mean(&self, gray: &GrayImage) -> Vec<f32> {
        let (width, height) = gray.dimensions();
        let (w, h) = (width as usize, height as usize);
        let radius = (self.kernel.len() / 2) as isize;

        let mut horizontal = vec![0f32; w * h];
        for y in 0..h {
            for x in 0..w {
                let mut acc = 0.0;
                for (k, weight) in self.kernel.iter().enumerate() {
                    let sx = clamp_index(x as isize + k as isize - radius, w);
                    acc += weight * gray.get_pixel(sx as u32, y as u32).0[0] as f32;
                }
                horizontal[y * w + x] = acc;
            }
        }

        let mut smoothed = vec![0f32; w * h];
        for y in 0..h {
            for x in 0..w {
                let mut acc = 0.0;
                for (k, weight) in self.kernel.iter().enumerate() {
                    let sy = clamp_index(y as isize + k as isize - radius, h);
                    acc += weight * horizontal[sy * w + x];
                }
                smoothed[y * w + x] = acc;
            }
        }
        smoothed
    }
}

fn clamp_index(i: isize, len: usize) -> usize {
    i.clamp(0, len as isize - 1) as usize
}

/// Normalized 1-D Gaussian weights for a window of `size` taps.
pub(crate) fn gaussian_kernel(size: u32) -> Vec<f32> {
    let sigma = kernel_sigma(size);
    let center = (size as f32 - 1.0) / 2.0;
    let weights: Vec<f32> = (0..size)
        .map(|i| {
            let d = i as f32 - center;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let total: f32 = weights.iter().sum();
    weights.into_iter().map(|w| w / total).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    #[test]
    fn kernel_is_normalized_and_symmetric() {
        let kernel = gaussian_kernel(25);
        assert_eq!(kernel.len(), 25);
        let total: f32 = kernel.iter().sum();
        assert!((total - 1.0).abs() < 1e-5);
        assert_eq!(kernel[0], kernel[24]);
        assert!(kernel[12] > kernel[11]);
    }

    #[test]
    fn uniform_page_is_all_background() {
        let gray = GrayImage::from_pixel(60, 40, Luma([200]));
        let mask = Binarizer::new(25, 10.0).binarize(&gray);
        assert!(mask.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn thin_dark_stroke_becomes_foreground() {
        let mut gray = GrayImage::from_pixel(80, 80, Luma([230]));
        draw_filled_rect_mut(&mut gray, Rect::at(38, 10).of_size(3, 60), Luma([40]));
        let mask = Binarizer::new(25, 10.0).binarize(&gray);

        assert_eq!(mask.get_pixel(39, 40).0[0], 255);
        assert_eq!(mask.get_pixel(10, 40).0[0], 0);
        assert_eq!(mask.get_pixel(70, 75).0[0], 0);
    }

    #[test]
    fn large_dark_area_keeps_only_its_rim() {
        let mut gray = GrayImage::from_pixel(200, 200, Luma([230]));
        draw_filled_rect_mut(&mut gray, Rect::at(40, 40).of_size(120, 120), Luma([40]));
        let mask = Binarizer::new(25, 10.0).binarize(&gray);

        // Deep inside a uniform dark region the local mean equals the pixel.
        assert_eq!(mask.get_pixel(100, 100).0[0], 0);
        assert_eq!(mask.get_pixel(41, 100).0[0], 255);
    }

    #[test]
    fn border_band_is_cleared() {
        let mut gray = GrayImage::from_pixel(60, 60, Luma([230]));
        draw_filled_rect_mut(&mut gray, Rect::at(0, 0).of_size(60, 2), Luma([30]));
        draw_filled_rect_mut(&mut gray, Rect::at(28, 20).of_size(3, 20), Luma([30]));

        let plain = Binarizer::new(25, 10.0).binarize(&gray);
        assert_eq!(plain.get_pixel(30, 0).0[0], 255);

        let cleared = Binarizer::new(25, 10.0).with_border(5).binarize(&gray);
        assert!((0..5).all(|y| cleared.get_pixel(30, y).0[0] == 0));
        assert_eq!(cleared.get_pixel(29, 30).0[0], 255);
    }

    #[test]
    fn zero_border_keeps_edge_ink() {
        let mut gray = GrayImage::from_pixel(60, 60, Luma([230]));
        draw_filled_rect_mut(&mut gray, Rect::at(0, 0).of_size(60, 2), Luma([30]));
        let config = PipelineConfig {
            mask_border: 0,
            ..PipelineConfig::default()
        };
        let mask = Binarizer::from_config(&config).binarize(&gray);
        assert_eq!(mask.get_pixel(30, 0).0[0], 255);
    }

    #[test]
    fn mask_matches_input_dimensions() {
        let gray = GrayImage::from_pixel(7, 3, Luma([90]));
        let mask = Binarizer::new(5, 10.0).binarize(&gray);
        assert_eq!(mask.dimensions(), (7, 3));
    }
}
