//! Region strategies
//!
//! A strategy pairs a detector with the eraser that suits its regions:
//! contour bubbles are flattened with a mean-color fill, OCR boxes are
//! whited out. The batch loop only sees [`Strategy::process`].

use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

use crate::detect::{
    self, BubbleDetectorOptions, ContourBubbleDetector, OcrBoxLocator, OcrOptions, Region,
    TextRecognizer,
};
use crate::erase::{fill_in_place, whiteout_in_place, FillOptions};

/// Extensions accepted by the contour bubble strategy
pub const BUBBLE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tiff"];

/// Extensions accepted by the OCR box strategy
pub const OCR_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

// ============================================================
// Strategy kind
// ============================================================

/// Which detector/eraser pair to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Contour bubble detection + mean-color fill
    #[default]
    Bubble,
    /// OCR box location + whiteout
    Ocr,
}

impl StrategyKind {
    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::Bubble => "bubble",
            StrategyKind::Ocr => "ocr",
        }
    }

    /// Lower-case file extensions this strategy processes
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            StrategyKind::Bubble => BUBBLE_EXTENSIONS,
            StrategyKind::Ocr => OCR_EXTENSIONS,
        }
    }

    /// Output folder name used when none is given
    pub fn default_output_dir_name(&self) -> &'static str {
        match self {
            StrategyKind::Bubble => "output",
            StrategyKind::Ocr => "output_ocr",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bubble" | "contour" | "comic" => Ok(StrategyKind::Bubble),
            "ocr" | "whiteout" | "manga" => Ok(StrategyKind::Ocr),
            other => Err(format!("unknown strategy: {other} (expected bubble or ocr)")),
        }
    }
}

// ============================================================
// Strategy
// ============================================================

/// Result of one image pass
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pub image: RgbImage,
    /// Regions detected (and erased)
    pub regions: usize,
}

/// A detector paired with its eraser
#[derive(Debug, Clone)]
pub enum Strategy {
    Bubble {
        detector: ContourBubbleDetector,
        fill: FillOptions,
    },
    OcrBox {
        locator: OcrBoxLocator,
    },
}

impl Strategy {
    pub fn bubble(options: BubbleDetectorOptions, fill: FillOptions) -> Self {
        Strategy::Bubble {
            detector: ContourBubbleDetector::new(options),
            fill,
        }
    }

    pub fn ocr_box(recognizer: Arc<dyn TextRecognizer>, options: OcrOptions) -> Self {
        Strategy::OcrBox {
            locator: OcrBoxLocator::new(recognizer, options),
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::Bubble { .. } => StrategyKind::Bubble,
            Strategy::OcrBox { .. } => StrategyKind::Ocr,
        }
    }

    /// Run the detector only
    pub fn detect(&self, image: &RgbImage) -> detect::Result<Vec<Region>> {
        match self {
            Strategy::Bubble { detector, .. } => Ok(detector
                .detect(image)
                .into_iter()
                .map(Region::from)
                .collect()),
            Strategy::OcrBox { locator } => Ok(locator
                .locate(image)?
                .into_iter()
                .map(Region::from)
                .collect()),
        }
    }

    /// Run the eraser matching this strategy over `regions`
    pub fn erase(&self, mut image: RgbImage, regions: &[Region]) -> RgbImage {
        match self {
            Strategy::Bubble { fill, .. } => {
                fill_in_place(&mut image, regions, fill);
            }
            Strategy::OcrBox { .. } => {
                whiteout_in_place(&mut image, regions);
            }
        }
        image
    }

    /// Detect then erase
    pub fn process(&self, image: RgbImage) -> detect::Result<ProcessedImage> {
        let regions = self.detect(&image)?;
        let count = regions.len();
        debug!(strategy = %self.kind(), regions = count, "Regions detected");

        let image = if regions.is_empty() {
            image
        } else {
            self.erase(image, &regions)
        };
        Ok(ProcessedImage {
            image,
            regions: count,
        })
    }
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::bubble(BubbleDetectorOptions::default(), FillOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{DetectError, OcrToken, TokenLevel};
    use image::{GrayImage, Rgb};

    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
    const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
    const GRAY: Rgb<u8> = Rgb([128, 128, 128]);

    /// 200x200 white page with a 50x40 black-outlined rectangle filled gray
    fn bubble_page() -> RgbImage {
        let mut image = RgbImage::from_pixel(200, 200, WHITE);
        for y in 80..120 {
            for x in 75..125 {
                let on_border = x < 77 || x >= 123 || y < 82 || y >= 118;
                image.put_pixel(x, y, if on_border { BLACK } else { GRAY });
            }
        }
        image
    }

    fn core_interior() -> impl Iterator<Item = (u32, u32)> {
        (90..110).flat_map(|y| (85..115).map(move |x| (x, y)))
    }

    #[derive(Debug)]
    struct OneWord;

    impl TextRecognizer for OneWord {
        fn recognize(&self, _image: &GrayImage) -> detect::Result<Vec<OcrToken>> {
            Ok(vec![OcrToken {
                level: TokenLevel::Word,
                left: 10,
                top: 12,
                width: 30,
                height: 9,
                confidence: 40.0,
                text: "BAM".into(),
            }])
        }
    }

    #[derive(Debug)]
    struct Offline;

    impl TextRecognizer for Offline {
        fn recognize(&self, _image: &GrayImage) -> detect::Result<Vec<OcrToken>> {
            Err(DetectError::RecognizerUnavailable("tesseract".into()))
        }
    }

    // STR-001: outlined gray rectangle is detected and flattened
    #[test]
    fn test_bubble_page_end_to_end() {
        let strategy = Strategy::default();
        let page = bubble_page();

        let regions = strategy.detect(&page).unwrap();
        assert!(!regions.is_empty());
        for region in &regions {
            assert!(region.area() >= 500.0);
            let bbox = region.bounding_box().unwrap();
            assert!(bbox.x >= 71 && bbox.y >= 76, "{:?}", bbox);
            assert!(bbox.x + bbox.width as i32 <= 129, "{:?}", bbox);
            assert!(bbox.y + bbox.height as i32 <= 124, "{:?}", bbox);
        }

        let out = strategy.process(page).unwrap();
        assert_eq!(out.regions, regions.len());

        for (x, y, p) in out.image.enumerate_pixels() {
            if x < 70 || x >= 130 || y < 75 || y >= 125 {
                assert_eq!(*p, WHITE, "background ({x}, {y}) changed");
            }
        }

        let fill = *out.image.get_pixel(100, 100);
        assert_eq!(fill.0[0], fill.0[1]);
        assert_eq!(fill.0[1], fill.0[2]);
        assert!((fill.0[0] as i32 - 128).abs() <= 60, "fill {:?}", fill);
        for (x, y) in core_interior() {
            assert_eq!(*out.image.get_pixel(x, y), fill);
        }
    }

    // STR-002: re-detection finds nothing inside the flattened area
    #[test]
    fn test_bubble_redetection_inside_fill() {
        let strategy = Strategy::default();
        let erased = strategy.process(bubble_page()).unwrap().image;
        let again = strategy.detect(&erased).unwrap();

        for region in again {
            let bbox = region.bounding_box().unwrap();
            let inside_core = bbox.x >= 85
                && bbox.y >= 90
                && bbox.x + bbox.width as i32 <= 115
                && bbox.y + bbox.height as i32 <= 110;
            assert!(!inside_core, "new region inside fill: {:?}", bbox);
        }
    }

    // STR-003: zero regions is a byte-for-byte no-op
    #[test]
    fn test_no_regions_noop() {
        let page = RgbImage::from_pixel(64, 64, Rgb([240, 235, 230]));
        let out = Strategy::default().process(page.clone()).unwrap();
        assert_eq!(out.regions, 0);
        assert_eq!(out.image.as_raw(), page.as_raw());
    }

    // STR-004: OCR strategy whites out recognized tokens
    #[test]
    fn test_ocr_strategy_whiteout() {
        let strategy = Strategy::ocr_box(Arc::new(OneWord), OcrOptions::default());
        assert_eq!(strategy.kind(), StrategyKind::Ocr);

        let page = RgbImage::from_pixel(60, 40, BLACK);
        let out = strategy.process(page).unwrap();
        assert_eq!(out.regions, 1);

        for (x, y, p) in out.image.enumerate_pixels() {
            let in_word = (10..40).contains(&x) && (12..21).contains(&y);
            let expected = if in_word { WHITE } else { BLACK };
            assert_eq!(*p, expected);
        }
    }

    #[test]
    fn test_ocr_strategy_propagates_errors() {
        let strategy = Strategy::ocr_box(Arc::new(Offline), OcrOptions::default());
        let result = strategy.process(RgbImage::new(4, 4));
        assert!(matches!(result, Err(DetectError::RecognizerUnavailable(_))));
    }

    #[test]
    fn test_strategy_kind_extensions_asymmetry() {
        assert_eq!(StrategyKind::Bubble.extensions().len(), 5);
        assert!(StrategyKind::Bubble.extensions().contains(&"tiff"));
        assert!(StrategyKind::Bubble.extensions().contains(&"bmp"));
        assert_eq!(StrategyKind::Ocr.extensions(), &["png", "jpg", "jpeg"]);
    }

    #[test]
    fn test_strategy_kind_parse() {
        assert_eq!("bubble".parse::<StrategyKind>().unwrap(), StrategyKind::Bubble);
        assert_eq!("OCR".parse::<StrategyKind>().unwrap(), StrategyKind::Ocr);
        assert_eq!("manga".parse::<StrategyKind>().unwrap(), StrategyKind::Ocr);
        assert!("sponge".parse::<StrategyKind>().is_err());
        assert_eq!(StrategyKind::default(), StrategyKind::Bubble);
        assert_eq!(StrategyKind::Ocr.default_output_dir_name(), "output_ocr");
    }
}
