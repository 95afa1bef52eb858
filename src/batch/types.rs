//! Batch module core types

use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

use crate::strategy::StrategyKind;

// ============================================================
// Error Types
// ============================================================

/// Errors that prevent a batch from starting
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("No input folder selected")]
    InputAbsent,

    #[error("Input folder not found: {0}")]
    InputNotFound(PathBuf),

    #[error("Input path is not a folder: {0}")]
    NotADirectory(PathBuf),

    #[error("No {strategy} images found in {}", .dir.display())]
    EmptyBatch { dir: PathBuf, strategy: StrategyKind },

    #[error("Cannot create output folder {}: {source}", .path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Worker pool setup failed: {0}")]
    ThreadPool(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BatchError>;

// ============================================================
// Per-item results
// ============================================================

/// Why a single image was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// Image could not be read or decoded
    Decode,
    /// Detection failed (e.g. recognizer unavailable)
    Detection,
    /// Output could not be written
    Write,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::Decode => "decode",
            FailureKind::Detection => "detection",
            FailureKind::Write => "write",
        };
        f.write_str(name)
    }
}

/// A skipped image and the reason
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemFailure {
    pub input: PathBuf,
    pub kind: FailureKind,
    pub message: String,
}

impl ItemFailure {
    pub fn new(input: &Path, kind: FailureKind, error: impl fmt::Display) -> Self {
        Self {
            input: input.to_path_buf(),
            kind,
            message: error.to_string(),
        }
    }
}

impl fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.input.display(), self.kind, self.message)
    }
}

/// Tagged outcome of one image
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    Processed { output: PathBuf, regions: usize },
    Failed(ItemFailure),
    /// Not attempted because the batch was cancelled
    Cancelled,
}

impl ItemOutcome {
    pub fn is_processed(&self) -> bool {
        matches!(self, ItemOutcome::Processed { .. })
    }
}

/// Outcome of one image with its source path
#[derive(Debug, Clone, PartialEq)]
pub struct ItemResult {
    pub input: PathBuf,
    pub outcome: ItemOutcome,
}

// ============================================================
// Batch results
// ============================================================

/// Terminal state of a batch job
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub strategy: StrategyKind,
    pub output_dir: PathBuf,
    pub started_at: DateTime<Local>,
    pub total: usize,
    pub processed: usize,
    pub regions: usize,
    pub cancelled: usize,
    pub failures: Vec<ItemFailure>,
    pub elapsed_secs: f64,
}

impl BatchSummary {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.cancelled == 0
    }
}

/// Summary, per-item outcomes, and the caller's decision to run again
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub summary: BatchSummary,
    pub items: Vec<ItemResult>,
    pub continue_requested: bool,
}

// ============================================================
// Cancellation
// ============================================================

/// Cooperative cancellation flag polled between images
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear the flag so the token can drive another batch
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
