//! Batch runner
//!
//! Applies a [`Strategy`] to every image of a [`BatchJob`]. Images are
//! independent and run on a rayon pool; the progress tracker is the only
//! shared mutable state and sits behind a mutex, so index increments and
//! sink notifications are serialized.

use chrono::Local;
use rayon::prelude::*;
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;
use tracing::{debug, info, warn};

use super::job::{BatchItem, BatchJob};
use super::types::{
    BatchError, BatchResult, BatchSummary, CancelToken, FailureKind, ItemFailure, ItemOutcome,
    ItemResult, Result,
};
use crate::progress::{ProgressEvent, ProgressSink, ProgressTracker};
use crate::strategy::Strategy;

/// Runner options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOptions {
    /// Worker threads; `None` or `Some(0)` uses every CPU, `Some(1)` runs
    /// sequentially in enumeration order
    pub threads: Option<usize>,
}

impl BatchOptions {
    pub fn sequential() -> Self {
        Self { threads: Some(1) }
    }

    pub fn effective_threads(&self) -> usize {
        match self.threads {
            Some(n) if n > 0 => n,
            _ => num_cpus::get(),
        }
    }
}

/// Drives detection and erasure over a batch job
#[derive(Debug, Clone)]
pub struct BatchRunner {
    strategy: Strategy,
    options: BatchOptions,
    cancel: CancelToken,
}

impl BatchRunner {
    pub fn new(strategy: Strategy, options: BatchOptions) -> Self {
        Self {
            strategy,
            options,
            cancel: CancelToken::new(),
        }
    }

    /// Share an externally owned cancellation token
    #[must_use]
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    /// Enumerate `input_dir`, create `output_dir`, and process every image
    pub fn run(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        sink: &dyn ProgressSink,
    ) -> Result<BatchResult> {
        let job = BatchJob::from_dir(input_dir, output_dir, self.strategy.kind())?;
        std::fs::create_dir_all(output_dir).map_err(|source| BatchError::OutputDir {
            path: output_dir.to_path_buf(),
            source,
        })?;
        self.run_job(&job, sink)
    }

    /// Process a prepared job. The output folder must already exist.
    pub fn run_job(&self, job: &BatchJob, sink: &dyn ProgressSink) -> Result<BatchResult> {
        let total = job.len();
        let threads = self.options.effective_threads();
        let started_at = Local::now();
        let tracker = Mutex::new(ProgressTracker::new(total));

        info!(
            strategy = %job.strategy(),
            images = total,
            threads,
            output = %job.output_dir().display(),
            "Batch started"
        );
        sink.on_batch_start(total);

        let items: Vec<ItemResult> = if threads == 1 {
            job.items()
                .iter()
                .map(|item| self.run_item(item, &tracker, sink))
                .collect()
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| BatchError::ThreadPool(e.to_string()))?;
            pool.install(|| {
                job.items()
                    .par_iter()
                    .map(|item| self.run_item(item, &tracker, sink))
                    .collect()
            })
        };

        let elapsed_secs = tracker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .elapsed_secs();
        let summary = summarize(job, &items, started_at, elapsed_secs);

        info!(
            processed = summary.processed,
            failed = summary.failed(),
            cancelled = summary.cancelled,
            elapsed_secs,
            "Batch finished"
        );

        let continue_requested = sink.on_batch_complete(&summary);
        Ok(BatchResult {
            summary,
            items,
            continue_requested,
        })
    }

    fn run_item(
        &self,
        item: &BatchItem,
        tracker: &Mutex<ProgressTracker>,
        sink: &dyn ProgressSink,
    ) -> ItemResult {
        if self.cancel.is_cancelled() {
            return ItemResult {
                input: item.input.clone(),
                outcome: ItemOutcome::Cancelled,
            };
        }

        let outcome = match self.process_item(item) {
            Ok(regions) => ItemOutcome::Processed {
                output: item.output.clone(),
                regions,
            },
            Err(failure) => {
                warn!(input = %failure.input.display(), kind = %failure.kind, "{}", failure.message);
                ItemOutcome::Failed(failure)
            }
        };

        {
            let mut tracker = tracker.lock().unwrap_or_else(PoisonError::into_inner);
            let (index, elapsed_secs, remaining_secs) = tracker.advance();
            sink.on_item_complete(&ProgressEvent {
                index,
                total: tracker.total(),
                elapsed_secs,
                remaining_secs,
                input: item.input.clone(),
                outcome: outcome.clone(),
            });
        }

        ItemResult {
            input: item.input.clone(),
            outcome,
        }
    }

    /// Load, detect, erase, write. Returns the number of regions erased.
    fn process_item(&self, item: &BatchItem) -> std::result::Result<usize, ItemFailure> {
        let started = Instant::now();

        let image = image::open(&item.input)
            .map_err(|e| ItemFailure::new(&item.input, FailureKind::Decode, e))?
            .to_rgb8();

        let processed = self
            .strategy
            .process(image)
            .map_err(|e| ItemFailure::new(&item.input, FailureKind::Detection, e))?;

        processed
            .image
            .save(&item.output)
            .map_err(|e| ItemFailure::new(&item.input, FailureKind::Write, e))?;

        debug!(
            input = %item.input.display(),
            regions = processed.regions,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Image processed"
        );
        Ok(processed.regions)
    }
}

fn summarize(
    job: &BatchJob,
    items: &[ItemResult],
    started_at: chrono::DateTime<Local>,
    elapsed_secs: f64,
) -> BatchSummary {
    let mut processed = 0;
    let mut regions = 0;
    let mut cancelled = 0;
    let mut failures = Vec::new();

    for item in items {
        match &item.outcome {
            ItemOutcome::Processed { regions: n, .. } => {
                processed += 1;
                regions += n;
            }
            ItemOutcome::Failed(failure) => failures.push(failure.clone()),
            ItemOutcome::Cancelled => cancelled += 1,
        }
    }

    BatchSummary {
        strategy: job.strategy(),
        output_dir: job.output_dir().to_path_buf(),
        started_at,
        total: job.len(),
        processed,
        regions,
        cancelled,
        failures,
        elapsed_secs,
    }
}
