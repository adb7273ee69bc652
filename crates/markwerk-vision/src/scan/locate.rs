// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Sheet location and perspective rectification.
//
// Finds the answer sheet's outline in a photograph or scan and warps it to an
// upright rectangle so that bubble geometry is measured in sheet coordinates.

use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use imageproc::contours::find_contours;
use imageproc::contrast::equalize_histogram;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::point::Point;
use markwerk_core::PipelineConfig;
use markwerk_core::error::MarkwerkError;
use tracing::{debug, info, instrument, warn};

use crate::geometry::{is_external, shoelace_area};
use crate::image::ImageProcessor;
use crate::scan::kernel_sigma;

/// An `(x, y)` position in image pixels.
pub type Corner = (f32, f32);

/// Four sheet corners in canonical order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quadrilateral {
    pub top_left: Corner,
    pub top_right: Corner,
    pub bottom_right: Corner,
    pub bottom_left: Corner,
}

impl Quadrilateral {
    /// Order four arbitrary corners.
    ///
    /// The top-left corner has the smallest `x + y` and the bottom-right the
    /// largest. The top-right corner has the smallest `y - x` and the
    /// bottom-left the largest. Ties go to the earliest point.
    pub fn from_unordered(points: [Corner; 4]) -> Self {
        let sum = |p: &Corner| p.0 + p.1;
        let diff = |p: &Corner| p.1 - p.0;
        Self {
            top_left: extreme(&points, sum, false),
            top_right: extreme(&points, diff, false),
            bottom_right: extreme(&points, sum, true),
            bottom_left: extreme(&points, diff, true),
        }
    }

    /// `[top_left, top_right, bottom_right, bottom_left]`
    pub fn corners(&self) -> [Corner; 4] {
        [self.top_left, self.top_right, self.bottom_right, self.bottom_left]
    }

    /// Output rectangle size: the longer of each pair of opposing edges,
    /// truncated to whole pixels.
    pub fn target_size(&self) -> (u32, u32) {
        let width = distance(self.bottom_right, self.bottom_left)
            .max(distance(self.top_right, self.top_left));
        let height = distance(self.top_right, self.bottom_right)
            .max(distance(self.top_left, self.bottom_left));
        (width as u32, height as u32)
    }
}

fn extreme(points: &[Corner; 4], key: impl Fn(&Corner) -> f32, largest: bool) -> Corner {
    let mut best = points[0];
    for point in &points[1..] {
        let better = if largest {
            key(point) > key(&best)
        } else {
            key(point) < key(&best)
        };
        if better {
            best = *point;
        }
    }
    best
}

fn distance(a: Corner, b: Corner) -> f32 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

/// How the sheet region was obtained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SheetOutline {
    /// A four-cornered outline was found and the image warped to it.
    Detected(Quadrilateral),
    /// No usable outline; the whole frame is used as-is.
    FullFrame,
}

impl SheetOutline {
    pub fn is_detected(&self) -> bool {
        matches!(self, Self::Detected(_))
    }
}

/// An upright, size-capped colour image of the sheet.
#[derive(Debug, Clone)]
pub struct RectifiedSheet {
    pub image: RgbImage,
    pub outline: SheetOutline,
}

impl RectifiedSheet {
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Locates the sheet outline and corrects perspective.
///
/// ## Pipeline
///
/// 1. Grayscale and histogram equalization
/// 2. Gaussian blur matching a 5x5 kernel
/// 3. Canny edge detection (hysteresis 50/150)
/// 4. Trace external contours and rank them by enclosed area, largest first
/// 5. Simplify each with Douglas-Peucker at 2% of its perimeter; the first
///    with exactly four vertices is the sheet, provided it encloses at least
///    a tenth of the image
/// 6. Order the corners and warp them onto an upright rectangle
/// 7. Cap the longer side of the result
///
/// If no contour simplifies to four vertices the full frame passes through
/// unwarped. An image with no contours at all is rejected.
#[derive(Debug, Clone)]
pub struct DocumentLocator {
    canny_low: f32,
    canny_high: f32,
    blur_sigma: f32,
    polygon_tolerance: f64,
    min_sheet_fraction: f64,
    max_dimension: u32,
}

impl DocumentLocator {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            canny_low: config.canny_low,
            canny_high: config.canny_high,
            blur_sigma: kernel_sigma(config.edge_blur_kernel),
            polygon_tolerance: config.polygon_tolerance,
            min_sheet_fraction: config.min_sheet_fraction,
            max_dimension: config.max_dimension,
        }
    }

    /// Locate, warp, and size-cap the sheet.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn rectify(&self, image: &DynamicImage) -> Result<RectifiedSheet, MarkwerkError> {
        let gray = image.to_luma8();
        let outline = self.locate(&gray)?;
        let color = image.to_rgb8();

        let (outline, upright) = match outline {
            SheetOutline::Detected(quad) => match warp_to_rectangle(&color, &quad) {
                Some(warped) => (SheetOutline::Detected(quad), warped),
                None => {
                    warn!(?quad, "Degenerate sheet outline; using the full frame");
                    (SheetOutline::FullFrame, color)
                }
            },
            SheetOutline::FullFrame => (SheetOutline::FullFrame, color),
        };

        let image = ImageProcessor::from_dynamic(DynamicImage::ImageRgb8(upright))
            .fit_within(self.max_dimension)
            .into_dynamic()
            .into_rgb8();

        debug!(
            width = image.width(),
            height = image.height(),
            detected = outline.is_detected(),
            "Sheet rectified"
        );
        Ok(RectifiedSheet { image, outline })
    }

    /// Find the sheet outline in a grayscale image.
    #[instrument(skip_all, fields(width = gray.width(), height = gray.height()))]
    pub fn locate(&self, gray: &GrayImage) -> Result<SheetOutline, MarkwerkError> {
        // Steps 1-3: normalize contrast, smooth, and find edges.
        let equalized = equalize_histogram(gray);
        let blurred = gaussian_blur_f32(&equalized, self.blur_sigma);
        let edges = canny(&blurred, self.canny_low, self.canny_high);

        // Step 4: external contours, largest enclosed area first. The sort is
        // stable so equal areas keep tracing order.
        let mut candidates: Vec<(f64, Vec<Point<i32>>)> = find_contours::<i32>(&edges)
            .into_iter()
            .filter(is_external)
            .map(|contour| (shoelace_area(&contour.points), contour.points))
            .collect();

        if candidates.is_empty() {
            warn!("No contours found in the image");
            return Err(MarkwerkError::NoSheetDetected);
        }
        candidates.sort_by(|a, b| b.0.total_cmp(&a.0));
        debug!(contours = candidates.len(), "External contours traced");

        // Step 5: the first four-vertex simplification wins. Candidates are
        // sorted, so once one is too small to be the sheet all the rest are.
        let min_area = self.min_sheet_fraction * gray.width() as f64 * gray.height() as f64;
        for (area, points) in &candidates {
            if *area < min_area {
                break;
            }
            if let Some(quad) = self.approximate_quad(points) {
                info!(area, ?quad, "Sheet outline found");
                return Ok(SheetOutline::Detected(quad));
            }
        }

        warn!(
            contours = candidates.len(),
            "No four-cornered outline found; using the full frame"
        );
        Ok(SheetOutline::FullFrame)
    }

    fn approximate_quad(&self, points: &[Point<i32>]) -> Option<Quadrilateral> {
        if points.len() < 4 {
            return None;
        }
        let epsilon = self.polygon_tolerance * arc_length(points, true);
        if epsilon <= 0.0 {
            return None;
        }

        let mut polygon = approximate_polygon_dp(points, epsilon, true);
        if polygon.len() > 1 && polygon.first() == polygon.last() {
            polygon.pop();
        }
        if polygon.len() != 4 {
            return None;
        }

        let corners = [0, 1, 2, 3].map(|i| (polygon[i].x as f32, polygon[i].y as f32));
        Some(Quadrilateral::from_unordered(corners))
    }
}

/// Warp the quadrilateral onto `(0,0)..(W-1,H-1)`. `None` when the target is
/// too small or the corners admit no projective mapping.
fn warp_to_rectangle(image: &RgbImage, quad: &Quadrilateral) -> Option<RgbImage> {
    let (width, height) = quad.target_size();
    if width < 2 || height < 2 {
        return None;
    }

    let right = (width - 1) as f32;
    let bottom = (height - 1) as f32;
    let dest: [Corner; 4] = [(0.0, 0.0), (right, 0.0), (right, bottom), (0.0, bottom)];
    let projection = Projection::from_control_points(quad.corners(), dest)?;

    let mut output = RgbImage::new(width, height);
    warp_into(image, &projection, Interpolation::Bilinear, Rgb([255, 255, 255]), &mut output);
    Some(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_polygon_mut};
    use imageproc::rect::Rect;

    fn locator() -> DocumentLocator {
        DocumentLocator::new(&PipelineConfig::default())
    }

    fn close(a: Corner, b: Corner, tolerance: f32) -> bool {
        (a.0 - b.0).abs() <= tolerance && (a.1 - b.1).abs() <= tolerance
    }

    #[test]
    fn corners_are_ordered_regardless_of_input_order() {
        let quad = Quadrilateral::from_unordered([
            (300.0, 410.0),
            (10.0, 20.0),
            (20.0, 400.0),
            (290.0, 15.0),
        ]);
        assert_eq!(quad.top_left, (10.0, 20.0));
        assert_eq!(quad.top_right, (290.0, 15.0));
        assert_eq!(quad.bottom_right, (300.0, 410.0));
        assert_eq!(quad.bottom_left, (20.0, 400.0));
    }

    #[test]
    fn target_size_takes_longer_edges() {
        let quad = Quadrilateral::from_unordered([(0.0, 0.0), (100.0, 0.0), (110.0, 50.0), (0.0, 50.0)]);
        assert_eq!(quad.target_size(), (110, 51));
    }

    #[test]
    fn uniform_image_has_no_sheet() {
        let gray = GrayImage::from_pixel(200, 300, Luma([200]));
        assert!(matches!(locator().locate(&gray), Err(MarkwerkError::NoSheetDetected)));
    }

    #[test]
    fn rectangular_page_is_detected() {
        let mut gray = GrayImage::from_pixel(400, 500, Luma([30]));
        draw_filled_rect_mut(&mut gray, Rect::at(50, 60).of_size(300, 380), Luma([230]));

        let SheetOutline::Detected(quad) = locator().locate(&gray).unwrap() else {
            panic!("expected a detected outline");
        };
        assert!(close(quad.top_left, (50.0, 60.0), 4.0), "{quad:?}");
        assert!(close(quad.bottom_right, (349.0, 439.0), 4.0), "{quad:?}");

        let (w, h) = quad.target_size();
        assert!((w as i32 - 300).abs() <= 6, "width {w}");
        assert!((h as i32 - 380).abs() <= 6, "height {h}");
    }

    #[test]
    fn skewed_page_corners_are_recovered() {
        let mut gray = GrayImage::from_pixel(500, 600, Luma([25]));
        let page = [
            Point::new(80, 60),
            Point::new(420, 90),
            Point::new(440, 540),
            Point::new(60, 520),
        ];
        draw_polygon_mut(&mut gray, &page, Luma([235]));

        let SheetOutline::Detected(quad) = locator().locate(&gray).unwrap() else {
            panic!("expected a detected outline");
        };
        assert!(close(quad.top_left, (80.0, 60.0), 5.0), "{quad:?}");
        assert!(close(quad.top_right, (420.0, 90.0), 5.0), "{quad:?}");
        assert!(close(quad.bottom_right, (440.0, 540.0), 5.0), "{quad:?}");
        assert!(close(quad.bottom_left, (60.0, 520.0), 5.0), "{quad:?}");
    }

    #[test]
    fn round_shape_falls_back_to_full_frame() {
        let mut gray = GrayImage::from_pixel(300, 300, Luma([20]));
        draw_filled_circle_mut(&mut gray, (150, 150), 100, Luma([240]));
        assert_eq!(locator().locate(&gray).unwrap(), SheetOutline::FullFrame);
    }

    #[test]
    fn small_rectangle_is_not_a_sheet() {
        let mut gray = GrayImage::from_pixel(400, 400, Luma([230]));
        draw_filled_rect_mut(&mut gray, Rect::at(180, 180).of_size(60, 40), Luma([20]));
        assert_eq!(locator().locate(&gray).unwrap(), SheetOutline::FullFrame);
    }

    #[test]
    fn zero_fraction_accepts_a_small_rectangle() {
        let config = PipelineConfig {
            min_sheet_fraction: 0.0,
            ..PipelineConfig::default()
        };
        let mut gray = GrayImage::from_pixel(400, 400, Luma([230]));
        draw_filled_rect_mut(&mut gray, Rect::at(180, 180).of_size(60, 40), Luma([20]));

        let SheetOutline::Detected(quad) = DocumentLocator::new(&config).locate(&gray).unwrap() else {
            panic!("expected a detected outline");
        };
        assert!(close(quad.top_left, (180.0, 180.0), 4.0), "{quad:?}");
        assert!(close(quad.bottom_right, (239.0, 219.0), 4.0), "{quad:?}");
    }

    #[test]
    fn full_frame_passes_through_at_original_size() {
        let mut gray = GrayImage::from_pixel(300, 240, Luma([20]));
        draw_filled_circle_mut(&mut gray, (150, 120), 90, Luma([240]));
        let sheet = locator().rectify(&DynamicImage::ImageLuma8(gray)).unwrap();
        assert_eq!(sheet.outline, SheetOutline::FullFrame);
        assert_eq!(sheet.dimensions(), (300, 240));
    }

    #[test]
    fn rectified_sheet_is_size_capped() {
        let config = PipelineConfig {
            max_dimension: 200,
            ..PipelineConfig::default()
        };
        let mut gray = GrayImage::from_pixel(400, 500, Luma([30]));
        draw_filled_rect_mut(&mut gray, Rect::at(50, 60).of_size(300, 380), Luma([230]));

        let sheet = DocumentLocator::new(&config)
            .rectify(&DynamicImage::ImageLuma8(gray))
            .unwrap();
        assert!(sheet.outline.is_detected());
        let (w, h) = sheet.dimensions();
        assert_eq!(h, 200);
        assert!(w < 200);
    }
}
