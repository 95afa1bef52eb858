//! Region detection core types
//!
//! Regions are transient: produced by a detector and consumed by an eraser
//! within a single image pass.

use imageproc::point::Point;
use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================
// Constants
// ============================================================

/// Minimum enclosed area for a contour to count as a bubble (pixels²)
pub const DEFAULT_MIN_AREA: f64 = 500.0;

/// Canny low hysteresis threshold
pub const DEFAULT_CANNY_LOW: f32 = 50.0;

/// Canny high hysteresis threshold
pub const DEFAULT_CANNY_HIGH: f32 = 150.0;

/// Sigma of the 5x5 Gaussian kernel when sigma is derived from kernel size
pub const DEFAULT_BLUR_SIGMA: f32 = 1.1;

/// Douglas-Peucker tolerance as a fraction of the closed contour perimeter
pub const DEFAULT_APPROX_EPSILON_RATIO: f64 = 0.02;

// ============================================================
// Error Types
// ============================================================

/// Detection error types
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("Text recognizer not available: {0}")]
    RecognizerUnavailable(String),

    #[error("Text recognition failed: {0}")]
    RecognitionFailed(String),

    #[error("Malformed recognizer output at line {line}: {reason}")]
    MalformedOutput { line: usize, reason: String },

    #[error("Image encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DetectError>;

// ============================================================
// Regions
// ============================================================

/// Closed polygon outline with its enclosed area
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonRegion {
    /// Outline vertices, first point not repeated at the end
    pub points: Vec<Point<i32>>,
    /// Enclosed area in pixels²
    pub area: f64,
}

impl PolygonRegion {
    pub fn new(points: Vec<Point<i32>>, area: f64) -> Self {
        Self { points, area }
    }

    /// Axis-aligned bounds, or `None` for an empty outline
    pub fn bounding_box(&self) -> Option<RectRegion> {
        let first = self.points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &self.points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(RectRegion {
            x: min_x,
            y: min_y,
            width: (max_x - min_x + 1) as u32,
            height: (max_y - min_y + 1) as u32,
        })
    }
}

/// Axis-aligned rectangle in image pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RectRegion {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl RectRegion {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> f64 {
        self.width as f64 * self.height as f64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Corner vertices in clockwise order
    pub fn corners(&self) -> Vec<Point<i32>> {
        let right = self.x + self.width.saturating_sub(1) as i32;
        let bottom = self.y + self.height.saturating_sub(1) as i32;
        vec![
            Point::new(self.x, self.y),
            Point::new(right, self.y),
            Point::new(right, bottom),
            Point::new(self.x, bottom),
        ]
    }

    /// imageproc rectangle, `None` when zero-sized
    pub fn to_rect(&self) -> Option<Rect> {
        if self.is_empty() {
            return None;
        }
        Some(Rect::at(self.x, self.y).of_size(self.width, self.height))
    }
}

/// A detected area of an image flagged for erasure
#[derive(Debug, Clone, PartialEq)]
pub enum Region {
    Polygon(PolygonRegion),
    Rect(RectRegion),
}

impl Region {
    pub fn area(&self) -> f64 {
        match self {
            Region::Polygon(poly) => poly.area,
            Region::Rect(rect) => rect.area(),
        }
    }

    pub fn bounding_box(&self) -> Option<RectRegion> {
        match self {
            Region::Polygon(poly) => poly.bounding_box(),
            Region::Rect(rect) => (!rect.is_empty()).then_some(*rect),
        }
    }

    /// Outline vertices; rectangles expand to their four corners
    pub fn outline(&self) -> Vec<Point<i32>> {
        match self {
            Region::Polygon(poly) => poly.points.clone(),
            Region::Rect(rect) => rect.corners(),
        }
    }
}

impl From<PolygonRegion> for Region {
    fn from(poly: PolygonRegion) -> Self {
        Region::Polygon(poly)
    }
}

impl From<RectRegion> for Region {
    fn from(rect: RectRegion) -> Self {
        Region::Rect(rect)
    }
}

// ============================================================
// Geometry helpers
// ============================================================

/// Enclosed area of a closed polygon (shoelace formula, unsigned)
pub fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0i64;
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        twice_area += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
    }
    twice_area.abs() as f64 / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polygon_area_square() {
        let square = vec![
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 10),
            Point::new(0, 10),
        ];
        assert_eq!(polygon_area(&square), 100.0);
    }

    #[test]
    fn test_polygon_area_orientation_independent() {
        let cw = vec![Point::new(0, 0), Point::new(0, 4), Point::new(3, 0)];
        let ccw: Vec<_> = cw.iter().rev().copied().collect();
        assert_eq!(polygon_area(&cw), 6.0);
        assert_eq!(polygon_area(&ccw), 6.0);
    }

    #[test]
    fn test_polygon_area_degenerate() {
        assert_eq!(polygon_area(&[]), 0.0);
        assert_eq!(polygon_area(&[Point::new(1, 1), Point::new(5, 5)]), 0.0);
    }

    #[test]
    fn test_polygon_bounding_box() {
        let poly = PolygonRegion::new(
            vec![Point::new(3, 4), Point::new(10, 2), Point::new(7, 9)],
            0.0,
        );
        assert_eq!(poly.bounding_box(), Some(RectRegion::new(3, 2, 8, 8)));
        assert_eq!(PolygonRegion::new(vec![], 0.0).bounding_box(), None);
    }

    #[test]
    fn test_rect_corners_and_empty() {
        let rect = RectRegion::new(2, 3, 4, 5);
        assert_eq!(
            rect.corners(),
            vec![
                Point::new(2, 3),
                Point::new(5, 3),
                Point::new(5, 7),
                Point::new(2, 7)
            ]
        );
        assert!(rect.to_rect().is_some());
        assert!(RectRegion::new(0, 0, 0, 5).to_rect().is_none());
    }

    #[test]
    fn test_region_area_dispatch() {
        let rect: Region = RectRegion::new(0, 0, 4, 5).into();
        assert_eq!(rect.area(), 20.0);
        let poly: Region = PolygonRegion::new(vec![], 42.0).into();
        assert_eq!(poly.area(), 42.0);
    }
}
