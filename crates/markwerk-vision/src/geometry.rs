// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Contour geometry shared by sheet location and bubble detection.

use imageproc::contours::{BorderType, Contour};
use imageproc::point::Point;

/// Axis-aligned, pixel-inclusive bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    /// Smallest box containing every point, or `None` for an empty slice or
    /// points with negative coordinates.
    pub fn enclosing(points: &[Point<i32>]) -> Option<Self> {
        let min_x = points.iter().map(|p| p.x).min()?;
        let max_x = points.iter().map(|p| p.x).max()?;
        let min_y = points.iter().map(|p| p.y).min()?;
        let max_y = points.iter().map(|p| p.y).max()?;
        if min_x < 0 || min_y < 0 {
            return None;
        }
        Some(Self {
            x: min_x as u32,
            y: min_y as u32,
            width: (max_x - min_x + 1) as u32,
            height: (max_y - min_y + 1) as u32,
        })
    }

    pub fn center(&self) -> (f32, f32) {
        (
            self.x as f32 + self.width as f32 / 2.0,
            self.y as f32 + self.height as f32 / 2.0,
        )
    }

    /// Width divided by height; zero for a degenerate box.
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            0.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

/// Area enclosed by a closed polygon, via the shoelace formula.
pub fn shoelace_area(points: &[Point<i32>]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut twice_area = 0i64;
    for i in 0..n {
        let j = (i + 1) % n;
        twice_area += points[i].x as i64 * points[j].y as i64;
        twice_area -= points[j].x as i64 * points[i].y as i64;
    }
    twice_area.abs() as f64 / 2.0
}

/// Whether a traced border is an outermost one (not nested inside another
/// component).
pub fn is_external(contour: &Contour<i32>) -> bool {
    contour.border_type == BorderType::Outer && contour.parent.is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(coords: &[(i32, i32)]) -> Vec<Point<i32>> {
        coords.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    #[test]
    fn shoelace_area_rectangle() {
        let square = pts(&[(0, 0), (10, 0), (10, 5), (0, 5)]);
        assert!((shoelace_area(&square) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn shoelace_area_is_orientation_independent() {
        let cw = pts(&[(0, 0), (0, 4), (4, 4), (4, 0)]);
        let ccw = pts(&[(0, 0), (4, 0), (4, 4), (0, 4)]);
        assert_eq!(shoelace_area(&cw), shoelace_area(&ccw));
    }

    #[test]
    fn degenerate_polygons_have_no_area() {
        assert_eq!(shoelace_area(&pts(&[(1, 1), (5, 5)])), 0.0);
    }

    #[test]
    fn bounding_box_is_pixel_inclusive() {
        let bbox = BoundingBox::enclosing(&pts(&[(10, 20), (29, 20), (29, 39), (10, 39)])).unwrap();
        assert_eq!(bbox, BoundingBox { x: 10, y: 20, width: 20, height: 20 });
        assert_eq!(bbox.center(), (20.0, 30.0));
        assert_eq!(bbox.aspect_ratio(), 1.0);
    }

    #[test]
    fn bounding_box_of_nothing() {
        assert!(BoundingBox::enclosing(&[]).is_none());
    }
}
