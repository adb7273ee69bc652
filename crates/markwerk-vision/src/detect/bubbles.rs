// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bubble detection from external contours of the mark mask.

use image::GrayImage;
use imageproc::contours::find_contours;
use markwerk_core::BubbleBounds;
use tracing::{debug, instrument};

use crate::geometry::{BoundingBox, is_external, shoelace_area};

/// One bubble candidate on the rectified sheet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BubbleRegion {
    pub bounding_box: BoundingBox,
    pub center: (f32, f32),
    /// Filled in by the option decoder; zero until measured.
    pub fill_ratio: f32,
}

impl BubbleRegion {
    pub fn new(bounding_box: BoundingBox) -> Self {
        Self {
            bounding_box,
            center: bounding_box.center(),
            fill_ratio: 0.0,
        }
    }
}

/// Filters external contours by size, aspect ratio, and area.
#[derive(Debug, Clone)]
pub struct BubbleDetector {
    bounds: BubbleBounds,
}

impl BubbleDetector {
    pub fn new(bounds: BubbleBounds) -> Self {
        Self { bounds }
    }

    /// Bubble candidates ordered by bounding-box top, then left.
    #[instrument(skip_all, fields(width = mask.width(), height = mask.height()))]
    pub fn detect(&self, mask: &GrayImage) -> Vec<BubbleRegion> {
        let contours = find_contours::<i32>(mask);
        let external = contours.iter().filter(|c| is_external(c)).count();

        let mut bubbles: Vec<BubbleRegion> = contours
            .iter()
            .filter(|c| is_external(c))
            .filter_map(|c| {
                let bbox = BoundingBox::enclosing(&c.points)?;
                self.accepts(&bbox, shoelace_area(&c.points))
                    .then(|| BubbleRegion::new(bbox))
            })
            .collect();
        bubbles.sort_by_key(|b| (b.bounding_box.y, b.bounding_box.x));

        debug!(external, accepted = bubbles.len(), "Bubble candidates filtered");
        bubbles
    }

    /// Width and height strictly inside the side limits, aspect ratio within
    /// its inclusive range, and enclosed area strictly above the minimum.
    pub fn accepts(&self, bbox: &BoundingBox, area: f64) -> bool {
        let b = &self.bounds;
        let aspect = bbox.aspect_ratio();
        bbox.width > b.min_side
            && bbox.width < b.max_side
            && bbox.height > b.min_side
            && bbox.height < b.max_side
            && (b.min_aspect..=b.max_aspect).contains(&aspect)
            && area > b.min_area
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_circle_mut};
    use imageproc::rect::Rect;

    fn detector() -> BubbleDetector {
        BubbleDetector::new(BubbleBounds::default())
    }

    fn bbox(width: u32, height: u32) -> BoundingBox {
        BoundingBox { x: 0, y: 0, width, height }
    }

    #[test]
    fn side_limits_are_exclusive() {
        let d = detector();
        assert!(!d.accepts(&bbox(15, 15), 500.0));
        assert!(d.accepts(&bbox(16, 16), 200.0));
        assert!(d.accepts(&bbox(99, 99), 5000.0));
        assert!(!d.accepts(&bbox(100, 100), 5000.0));
    }

    #[test]
    fn aspect_limits_are_inclusive() {
        let d = detector();
        assert!(d.accepts(&bbox(28, 40), 500.0));
        assert!(!d.accepts(&bbox(27, 40), 500.0));
        assert!(d.accepts(&bbox(52, 40), 500.0));
        assert!(!d.accepts(&bbox(53, 40), 500.0));
    }

    #[test]
    fn area_must_exceed_minimum() {
        let d = detector();
        assert!(!d.accepts(&bbox(20, 20), 100.0));
        assert!(d.accepts(&bbox(20, 20), 100.5));
    }

    #[test]
    fn finds_rings_and_discs_in_reading_order() {
        let mut mask = GrayImage::new(200, 120);
        draw_hollow_circle_mut(&mut mask, (150, 30), 12, Luma([255]));
        draw_filled_circle_mut(&mut mask, (50, 30), 12, Luma([255]));
        draw_filled_circle_mut(&mut mask, (100, 90), 12, Luma([255]));

        let bubbles = detector().detect(&mask);
        assert_eq!(bubbles.len(), 3);
        assert_eq!(bubbles[0].bounding_box, BoundingBox { x: 38, y: 18, width: 25, height: 25 });
        assert_eq!(bubbles[0].center, (50.5, 30.5));
        assert_eq!(bubbles[1].bounding_box.x, 138);
        assert_eq!(bubbles[2].bounding_box.y, 78);
        assert!(bubbles.iter().all(|b| b.fill_ratio == 0.0));
    }

    #[test]
    fn rejects_lines_specks_and_large_blobs() {
        let mut mask = GrayImage::new(300, 300);
        draw_filled_rect_mut(&mut mask, Rect::at(10, 10).of_size(200, 3), Luma([255]));
        draw_filled_rect_mut(&mut mask, Rect::at(20, 50).of_size(5, 5), Luma([255]));
        draw_filled_rect_mut(&mut mask, Rect::at(100, 100).of_size(150, 150), Luma([255]));
        assert!(detector().detect(&mask).is_empty());
    }

    #[test]
    fn nested_contours_are_ignored() {
        let mut mask = GrayImage::new(140, 140);
        draw_hollow_circle_mut(&mut mask, (70, 70), 55, Luma([255]));
        draw_filled_circle_mut(&mut mask, (70, 70), 12, Luma([255]));
        // Outer ring is 111 px wide (rejected); the inner disc sits inside it.
        assert!(detector().detect(&mask).is_empty());
    }
}
