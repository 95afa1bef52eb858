//! manga-text-eraser - Batch removal of printed text from scanned manga and comic pages
//!
//! Two strategies are provided:
//!
//! - **bubble**: finds closed contours (speech bubbles) on an edge map and
//!   fills them with their own mean color
//! - **ocr**: asks a text recognizer for token boxes and paints them white
//!
//! # Example
//!
//! ```rust,no_run
//! use manga_text_eraser::{erase_fill, ContourBubbleDetector, FillOptions, Region};
//!
//! let page = image::open("page.png").unwrap().to_rgb8();
//! let detector = ContourBubbleDetector::default();
//! let regions: Vec<Region> = detector.detect(&page).into_iter().map(Region::from).collect();
//! let cleaned = erase_fill(page, &regions, &FillOptions::default());
//! cleaned.save("page_clean.png").unwrap();
//! ```

pub mod batch;
pub mod cli;
pub mod config;
pub mod detect;
pub mod erase;
pub mod progress;
pub mod strategy;

pub use batch::{
    BatchError, BatchItem, BatchJob, BatchOptions, BatchResult, BatchRunner, BatchSummary,
    CancelToken, FailureKind, ItemFailure, ItemOutcome, ItemResult,
};
pub use cli::{Cli, Commands, RunArgs};
pub use config::{CliOverrides, Config, ConfigError};
pub use detect::{
    BubbleDetectorOptions, ContourBubbleDetector, DetectError, OcrBoxLocator, OcrOptions,
    OcrToken, PolygonRegion, RectRegion, Region, TesseractRecognizer, TextRecognizer, TokenLevel,
};
pub use erase::{erase_fill, erase_whiteout, FillOptions};
pub use progress::{
    BatchEvent, ChannelSink, NoopSink, OutputMode, ProgressEvent, ProgressSink, ProgressTracker,
};
pub use strategy::{ProcessedImage, Strategy, StrategyKind};

/// Process exit codes
pub mod exit_codes {
    /// Every image processed
    pub const SUCCESS: i32 = 0;
    /// Unexpected error
    pub const GENERAL_ERROR: i32 = 1;
    /// Input folder missing, absent, or not a folder
    pub const INPUT_NOT_FOUND: i32 = 2;
    /// No eligible images in the input folder
    pub const EMPTY_BATCH: i32 = 3;
    /// Batch finished but some images were skipped
    pub const ITEMS_FAILED: i32 = 4;

    /// Exit code of a session that ran several batches: the first
    /// non-zero code wins
    pub fn combine(current: i32, next: i32) -> i32 {
        if current != SUCCESS {
            current
        } else {
            next
        }
    }

}
