//! Progress tracking and reporting for batch processing.
//!
//! The batch runner reports through a caller-supplied [`ProgressSink`] and
//! never touches presentation state directly.

use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::time::Instant;

use crate::batch::{BatchSummary, ItemOutcome};

/// How much the terminal front end prints while a batch runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum OutputMode {
    /// Nothing but errors (`-q` or `--json`)
    Quiet,
    /// Progress bar and end-of-batch summary
    #[default]
    Normal,
    /// Adds one status line per image (`-v`)
    Verbose,
    /// Adds per-image region counts (`-vv` and beyond)
    VeryVerbose,
}

impl OutputMode {
    /// Map the `-v` count to a mode
    pub fn from_verbosity(level: u8) -> Self {
        match level {
            0 => OutputMode::Normal,
            1 => OutputMode::Verbose,
            _ => OutputMode::VeryVerbose,
        }
    }

    /// Whether output tagged with `required` is printed in this mode
    pub fn should_show(&self, required: OutputMode) -> bool {
        *self != OutputMode::Quiet && required <= *self
    }
}

// ============================================================
// ETA
// ============================================================

/// Remaining time from the running average: `elapsed / completed * total - elapsed`.
///
/// Clamped to zero, and exactly zero once every item is done.
pub fn estimate_remaining(elapsed_secs: f64, completed: usize, total: usize) -> f64 {
    if completed == 0 || completed >= total {
        return 0.0;
    }
    let estimated_total = elapsed_secs / completed as f64 * total as f64;
    (estimated_total - elapsed_secs).max(0.0)
}

/// Progress state of one batch job
#[derive(Debug)]
pub struct ProgressTracker {
    completed: usize,
    total: usize,
    start_time: Instant,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        Self {
            completed: 0,
            total,
            start_time: Instant::now(),
        }
    }

    /// Count one more finished item; returns `(index, elapsed, remaining)`
    pub fn advance(&mut self) -> (usize, f64, f64) {
        self.completed = (self.completed + 1).min(self.total);
        let elapsed = self.elapsed_secs();
        let remaining = estimate_remaining(elapsed, self.completed, self.total);
        (self.completed, elapsed, remaining)
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Get elapsed time in seconds
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }
}

// ============================================================
// Events and sinks
// ============================================================

/// Emitted after each image finishes, successfully or not
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    /// 1-based position in completion order
    pub index: usize,
    pub total: usize,
    pub elapsed_secs: f64,
    pub remaining_secs: f64,
    pub input: PathBuf,
    pub outcome: ItemOutcome,
}

impl ProgressEvent {
    /// Remaining time truncated to whole seconds
    pub fn remaining_whole_secs(&self) -> u64 {
        self.remaining_secs as u64
    }
}

/// Receiver of batch progress
pub trait ProgressSink: Sync {
    /// Called once before the first image
    fn on_batch_start(&self, _total: usize) {}

    /// Called after every attempted image, in strictly increasing index order
    fn on_item_complete(&self, event: &ProgressEvent);

    /// Called once at the end; return `true` to request another batch
    fn on_batch_complete(&self, _summary: &BatchSummary) -> bool {
        false
    }
}

/// Sink that ignores progress and declines another batch
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn on_item_complete(&self, _event: &ProgressEvent) {}
}

/// Messages forwarded by [`ChannelSink`]
#[derive(Debug, Clone)]
pub enum BatchEvent {
    Started { total: usize },
    Item(ProgressEvent),
    Finished(BatchSummary),
}

/// Forwards progress over a channel to another thread
#[derive(Debug)]
pub struct ChannelSink {
    sender: Sender<BatchEvent>,
    continue_after: bool,
}

impl ChannelSink {
    pub fn new(sender: Sender<BatchEvent>) -> Self {
        Self {
            sender,
            continue_after: false,
        }
    }

    /// Answer given when the batch completes
    #[must_use]
    pub fn with_continue(mut self, continue_after: bool) -> Self {
        self.continue_after = continue_after;
        self
    }
}

impl ProgressSink for ChannelSink {
    fn on_batch_start(&self, total: usize) {
        let _ = self.sender.send(BatchEvent::Started { total });
    }

    fn on_item_complete(&self, event: &ProgressEvent) {
        let _ = self.sender.send(BatchEvent::Item(event.clone()));
    }

    fn on_batch_complete(&self, summary: &BatchSummary) -> bool {
        let _ = self.sender.send(BatchEvent::Finished(summary.clone()));
        self.continue_after
    }
}
