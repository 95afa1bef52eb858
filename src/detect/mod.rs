//! Region detection module
//!
//! Two interchangeable strategies for locating text-bearing areas:
//!
//! - **Contour bubbles** ([`contour`]) - edge-based segmentation of closed,
//!   bubble-scale shapes
//! - **OCR boxes** ([`ocr`]) - one rectangle per token reported by a text
//!   recognition engine

pub mod contour;
mod intensity;
pub mod ocr;
mod types;

// Re-export public API
pub use contour::{BubbleDetectorOptions, BubbleDetectorOptionsBuilder, ContourBubbleDetector};
pub use intensity::{luminance, to_intensity};
pub use ocr::{
    parse_tsv, OcrBoxLocator, OcrOptions, OcrToken, TesseractRecognizer, TextRecognizer,
    TokenLevel,
};
pub use types::{
    polygon_area, DetectError, PolygonRegion, RectRegion, Region, Result, DEFAULT_MIN_AREA,
};
