//! Batch job construction from an input folder

use std::path::{Path, PathBuf};

use super::types::{BatchError, Result};
use crate::strategy::StrategyKind;

/// One source image and where its result goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItem {
    pub input: PathBuf,
    pub output: PathBuf,
}

/// Ordered list of images to process with one strategy
#[derive(Debug, Clone)]
pub struct BatchJob {
    strategy: StrategyKind,
    output_dir: PathBuf,
    items: Vec<BatchItem>,
}

impl BatchJob {
    /// Enumerate eligible images in `input_dir`, mapping each to the same
    /// file name under `output_dir`
    pub fn from_dir(input_dir: &Path, output_dir: &Path, strategy: StrategyKind) -> Result<Self> {
        if input_dir.as_os_str().is_empty() {
            return Err(BatchError::InputAbsent);
        }
        if !input_dir.exists() {
            return Err(BatchError::InputNotFound(input_dir.to_path_buf()));
        }
        if !input_dir.is_dir() {
            return Err(BatchError::NotADirectory(input_dir.to_path_buf()));
        }

        let images = collect_images(input_dir, strategy.extensions())?;
        if images.is_empty() {
            return Err(BatchError::EmptyBatch {
                dir: input_dir.to_path_buf(),
                strategy,
            });
        }

        let items = images
            .into_iter()
            .filter_map(|input| {
                let name = input.file_name()?.to_owned();
                Some(BatchItem {
                    output: output_dir.join(name),
                    input,
                })
            })
            .collect();

        Ok(Self {
            strategy,
            output_dir: output_dir.to_path_buf(),
            items,
        })
    }

    pub fn strategy(&self) -> StrategyKind {
        self.strategy
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn items(&self) -> &[BatchItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Whether the file extension is in the allow-list (case-insensitive)
pub fn has_allowed_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|allowed| ext.eq_ignore_ascii_case(allowed)))
}

/// Collect image files from a folder, sorted by path
pub fn collect_images(dir: &Path, extensions: &[&str]) -> std::io::Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && has_allowed_extension(&path, extensions) {
            images.push(path);
        }
    }
    images.sort();
    Ok(images)
}
