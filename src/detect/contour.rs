//! Contour Bubble Detector
//!
//! Finds closed, bubble-scale shapes on a page by geometric segmentation.
//!
//! # Algorithm
//!
//! 1. Convert the page to intensity
//! 2. Gaussian smoothing (5x5-equivalent kernel, sigma 1.1)
//! 3. Canny edge detection (50 / 150)
//! 4. Extract every contour of the edge map, outer and hole borders alike
//! 5. Keep contours enclosing at least `min_area` pixels²
//!
//! Nested contours are not deduplicated, so a bubble with an inner border
//! yields several regions. Filling them all is idempotent.

use image::{GrayImage, RgbImage};
use imageproc::contours::find_contours;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::point::Point;
use tracing::debug;

use super::intensity::to_intensity;
use super::types::{
    polygon_area, PolygonRegion, DEFAULT_APPROX_EPSILON_RATIO, DEFAULT_BLUR_SIGMA,
    DEFAULT_CANNY_HIGH, DEFAULT_CANNY_LOW, DEFAULT_MIN_AREA,
};

// ============================================================
// Options
// ============================================================

/// Options for contour bubble detection
#[derive(Debug, Clone, PartialEq)]
pub struct BubbleDetectorOptions {
    /// Gaussian smoothing sigma
    pub blur_sigma: f32,

    /// Canny low threshold
    pub canny_low: f32,

    /// Canny high threshold
    pub canny_high: f32,

    /// Contours enclosing less than this many pixels² are discarded
    pub min_area: f64,

    /// Polygon approximation tolerance relative to the contour perimeter
    pub approx_epsilon_ratio: f64,

    /// Emit the simplified polygon instead of the raw contour
    pub simplify: bool,
}

impl Default for BubbleDetectorOptions {
    fn default() -> Self {
        Self {
            blur_sigma: DEFAULT_BLUR_SIGMA,
            canny_low: DEFAULT_CANNY_LOW,
            canny_high: DEFAULT_CANNY_HIGH,
            min_area: DEFAULT_MIN_AREA,
            approx_epsilon_ratio: DEFAULT_APPROX_EPSILON_RATIO,
            simplify: false,
        }
    }
}

impl BubbleDetectorOptions {
    /// Create a builder
    pub fn builder() -> BubbleDetectorOptionsBuilder {
        BubbleDetectorOptionsBuilder::default()
    }
}

/// Builder for BubbleDetectorOptions
#[derive(Debug, Default)]
pub struct BubbleDetectorOptionsBuilder {
    options: BubbleDetectorOptions,
}

impl BubbleDetectorOptionsBuilder {
    /// Set smoothing sigma (must stay positive)
    #[must_use]
    pub fn blur_sigma(mut self, sigma: f32) -> Self {
        self.options.blur_sigma = sigma.max(0.1);
        self
    }

    /// Set Canny thresholds; `high` is raised to `low` if smaller
    #[must_use]
    pub fn canny_thresholds(mut self, low: f32, high: f32) -> Self {
        let low = low.max(0.0);
        self.options.canny_low = low;
        self.options.canny_high = high.max(low);
        self
    }

    /// Set minimum contour area
    #[must_use]
    pub fn min_area(mut self, area: f64) -> Self {
        self.options.min_area = area.max(0.0);
        self
    }

    /// Set approximation tolerance ratio
    #[must_use]
    pub fn approx_epsilon_ratio(mut self, ratio: f64) -> Self {
        self.options.approx_epsilon_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    /// Emit simplified polygons
    #[must_use]
    pub fn simplify(mut self, simplify: bool) -> Self {
        self.options.simplify = simplify;
        self
    }

    /// Build the options
    #[must_use]
    pub fn build(self) -> BubbleDetectorOptions {
        self.options
    }
}

// ============================================================
// Detector
// ============================================================

/// Edge-based speech bubble detector
#[derive(Debug, Clone, Default)]
pub struct ContourBubbleDetector {
    options: BubbleDetectorOptions,
}

impl ContourBubbleDetector {
    pub fn new(options: BubbleDetectorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &BubbleDetectorOptions {
        &self.options
    }

    /// Detect bubble-scale closed shapes on an RGB page
    pub fn detect(&self, image: &RgbImage) -> Vec<PolygonRegion> {
        let gray = to_intensity(image);
        let edges = self.edge_map(&gray);
        let contours = find_contours::<i32>(&edges);
        let total = contours.len();

        let mut regions = Vec::new();
        for contour in contours {
            let outline = open_outline(contour.points);
            let area = polygon_area(&outline);
            if area < self.options.min_area {
                continue;
            }

            let points = if self.options.simplify {
                simplify_outline(&outline, self.options.approx_epsilon_ratio).unwrap_or(outline)
            } else {
                outline
            };
            regions.push(PolygonRegion::new(points, area));
        }

        debug!(
            contours = total,
            regions = regions.len(),
            min_area = self.options.min_area,
            "Contour detection complete"
        );
        regions
    }

    /// Smoothed Canny edge map of an intensity image
    pub fn edge_map(&self, gray: &GrayImage) -> GrayImage {
        let blurred = gaussian_blur_f32(gray, self.options.blur_sigma);
        canny(&blurred, self.options.canny_low, self.options.canny_high)
    }
}

/// Drop a trailing copy of the first vertex so the outline is implicitly closed
fn open_outline(mut points: Vec<Point<i32>>) -> Vec<Point<i32>> {
    while points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    points
}

/// Douglas-Peucker simplification with a perimeter-relative tolerance.
///
/// Returns `None` when the outline cannot be simplified into a polygon.
pub fn simplify_outline(points: &[Point<i32>], epsilon_ratio: f64) -> Option<Vec<Point<i32>>> {
    if points.len() < 3 {
        return None;
    }
    let epsilon = epsilon_ratio * arc_length(points, true);
    if epsilon <= 0.0 {
        return None;
    }
    let simplified = open_outline(approximate_polygon_dp(points, epsilon, true));
    (simplified.len() >= 3).then_some(simplified)
}
