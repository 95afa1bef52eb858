//! Batch processing module
//!
//! Runs one strategy over every eligible image of a folder.
//!
//! # Example
//!
//! ```rust,no_run
//! use manga_text_eraser::{BatchOptions, BatchRunner, NoopSink, Strategy};
//! use std::path::Path;
//!
//! let runner = BatchRunner::new(Strategy::default(), BatchOptions::default());
//! let result = runner
//!     .run(Path::new("pages"), Path::new("pages/output"), &NoopSink)
//!     .unwrap();
//! println!("{} processed, {} failed", result.summary.processed, result.summary.failed());
//! ```

mod job;
mod runner;
mod types;

// Re-export public API
pub use job::{collect_images, has_allowed_extension, BatchItem, BatchJob};
pub use runner::{BatchOptions, BatchRunner};
pub use types::{
    BatchError, BatchResult, BatchSummary, CancelToken, FailureKind, ItemFailure, ItemOutcome,
    ItemResult, Result,
};
