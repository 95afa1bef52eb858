//! Configuration file support
//!
//! Settings come from a TOML file, then command-line overrides are merged on
//! top (CLI takes precedence).
//!
//! Search order:
//! 1. `--config PATH`
//! 2. `./manga-text-eraser.toml`
//! 3. `<config dir>/manga-text-eraser/config.toml`
//! 4. Built-in defaults

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::batch::BatchOptions;
use crate::detect::ocr::{DEFAULT_OCR_LANGUAGE, DEFAULT_PAGE_SEG_MODE, DEFAULT_TESSERACT_CMD};
use crate::detect::{BubbleDetectorOptions, OcrOptions, TesseractRecognizer, TokenLevel};
use crate::erase::FillOptions;
use crate::strategy::{Strategy, StrategyKind};

/// Local config file name
pub const LOCAL_CONFIG_FILE: &str = "manga-text-eraser.toml";

/// Application directory under the user config dir
pub const APP_CONFIG_DIR: &str = "manga-text-eraser";

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

// ============================================================
// Sections
// ============================================================

/// `[detection]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub blur_sigma: f32,
    pub canny_low: f32,
    pub canny_high: f32,
    pub min_area: f64,
    pub approx_epsilon_ratio: f64,
    pub simplify: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        let defaults = BubbleDetectorOptions::default();
        Self {
            blur_sigma: defaults.blur_sigma,
            canny_low: defaults.canny_low,
            canny_high: defaults.canny_high,
            min_area: defaults.min_area,
            approx_epsilon_ratio: defaults.approx_epsilon_ratio,
            simplify: defaults.simplify,
        }
    }
}

/// `[fill]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FillConfig {
    pub sample_from_source: bool,
}

/// `[ocr]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    pub tesseract: PathBuf,
    pub language: String,
    pub page_seg_mode: u8,
    pub min_level: TokenLevel,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract: PathBuf::from(DEFAULT_TESSERACT_CMD),
            language: DEFAULT_OCR_LANGUAGE.to_string(),
            page_seg_mode: DEFAULT_PAGE_SEG_MODE,
            min_level: OcrOptions::default().min_level,
        }
    }
}

/// `[batch]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// 0 = every CPU
    pub threads: usize,
}

// ============================================================
// Config
// ============================================================

/// Full application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub strategy: StrategyKind,
    pub detection: DetectionConfig,
    pub fill: FillConfig,
    pub ocr: OcrConfig,
    pub batch: BatchConfig,
}

/// Values set explicitly on the command line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOverrides {
    pub strategy: Option<StrategyKind>,
    pub min_area: Option<f64>,
    pub simplify: Option<bool>,
    pub sample_from_source: Option<bool>,
    pub tesseract: Option<PathBuf>,
    pub ocr_language: Option<String>,
    pub min_level: Option<TokenLevel>,
    pub threads: Option<usize>,
}

impl Config {
    /// Candidate config locations, most specific first
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join(APP_CONFIG_DIR).join("config.toml"));
        }
        paths
    }

    /// Load from the first existing search path, or defaults
    pub fn load() -> Result<Self> {
        match Self::search_paths().into_iter().find(|p| p.is_file()) {
            Some(path) => Self::load_from_path(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load from an explicit path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Apply command-line overrides (CLI wins)
    pub fn merge_with_cli(&self, cli: &CliOverrides) -> Config {
        let mut merged = self.clone();
        if let Some(strategy) = cli.strategy {
            merged.strategy = strategy;
        }
        if let Some(min_area) = cli.min_area {
            merged.detection.min_area = min_area;
        }
        if let Some(simplify) = cli.simplify {
            merged.detection.simplify = simplify;
        }
        if let Some(sample) = cli.sample_from_source {
            merged.fill.sample_from_source = sample;
        }
        if let Some(tesseract) = &cli.tesseract {
            merged.ocr.tesseract = tesseract.clone();
        }
        if let Some(language) = &cli.ocr_language {
            merged.ocr.language = language.clone();
        }
        if let Some(level) = cli.min_level {
            merged.ocr.min_level = level;
        }
        if let Some(threads) = cli.threads {
            merged.batch.threads = threads;
        }
        merged
    }

    pub fn detector_options(&self) -> BubbleDetectorOptions {
        let d = &self.detection;
        BubbleDetectorOptions::builder()
            .blur_sigma(d.blur_sigma)
            .canny_thresholds(d.canny_low, d.canny_high)
            .min_area(d.min_area)
            .approx_epsilon_ratio(d.approx_epsilon_ratio)
            .simplify(d.simplify)
            .build()
    }

    pub fn fill_options(&self) -> FillOptions {
        FillOptions {
            sample_from_source: self.fill.sample_from_source,
        }
    }

    pub fn recognizer(&self) -> TesseractRecognizer {
        TesseractRecognizer::new(&self.ocr.tesseract)
            .with_language(&self.ocr.language)
            .with_page_seg_mode(self.ocr.page_seg_mode)
    }

    pub fn ocr_options(&self) -> OcrOptions {
        OcrOptions {
            min_level: self.ocr.min_level,
        }
    }

    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            threads: (self.batch.threads > 0).then_some(self.batch.threads),
        }
    }

    /// Strategy selected by this configuration
    pub fn build_strategy(&self) -> Strategy {
        match self.strategy {
            StrategyKind::Bubble => Strategy::bubble(self.detector_options(), self.fill_options()),
            StrategyKind::Ocr => Strategy::ocr_box(Arc::new(self.recognizer()), self.ocr_options()),
        }
    }

    /// Serialize back to TOML
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    // CFG-001: defaults match the detector constants
    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.strategy, StrategyKind::Bubble);
        assert_eq!(config.detection.min_area, 500.0);
        assert_eq!(config.detection.canny_low, 50.0);
        assert_eq!(config.detection.canny_high, 150.0);
        assert_eq!(config.ocr.language, "eng");
        assert_eq!(config.ocr.min_level, TokenLevel::Word);
        assert_eq!(config.batch.threads, 0);
        assert_eq!(config.batch_options().threads, None);
    }

    // CFG-002: partial TOML falls back to defaults
    #[test]
    fn test_config_partial_toml() {
        let config = Config::from_toml_str(
            r#"
strategy = "ocr"

[detection]
min_area = 800.0

[ocr]
language = "jpn"
min_level = "line"

[batch]
threads = 2
"#,
        )
        .unwrap();

        assert_eq!(config.strategy, StrategyKind::Ocr);
        assert_eq!(config.detection.min_area, 800.0);
        assert_eq!(config.detection.canny_high, 150.0);
        assert_eq!(config.ocr.language, "jpn");
        assert_eq!(config.ocr.min_level, TokenLevel::Line);
        assert_eq!(config.ocr.page_seg_mode, 3);
        assert_eq!(config.batch_options().threads, Some(2));
    }

    #[test]
    fn test_config_invalid_toml() {
        assert!(Config::from_toml_str("strategy = \"paint\"").is_err());
        assert!(Config::from_toml_str("[detection]\nmin_area = \"big\"").is_err());
    }

    // CFG-003: CLI overrides win
    #[test]
    fn test_merge_with_cli() {
        let file = Config::from_toml_str("[detection]\nmin_area = 800.0\n[batch]\nthreads = 2").unwrap();
        let overrides = CliOverrides {
            strategy: Some(StrategyKind::Ocr),
            min_area: Some(1200.0),
            sample_from_source: Some(true),
            ocr_language: Some("jpn_vert".into()),
            threads: Some(1),
            ..CliOverrides::default()
        };
        let merged = file.merge_with_cli(&overrides);

        assert_eq!(merged.strategy, StrategyKind::Ocr);
        assert_eq!(merged.detection.min_area, 1200.0);
        assert!(merged.fill.sample_from_source);
        assert_eq!(merged.ocr.language, "jpn_vert");
        assert_eq!(merged.batch.threads, 1);
        assert!(!merged.detection.simplify);
    }

    #[test]
    fn test_merge_empty_overrides_identity() {
        let config = Config::default();
        assert_eq!(config.merge_with_cli(&CliOverrides::default()), config);
    }

    #[test]
    fn test_build_strategy_kind() {
        let mut config = Config::default();
        assert_eq!(config.build_strategy().kind(), StrategyKind::Bubble);
        config.strategy = StrategyKind::Ocr;
        assert_eq!(config.build_strategy().kind(), StrategyKind::Ocr);
    }

    #[test]
    fn test_detector_options_clamped() {
        let mut config = Config::default();
        config.detection.canny_low = 100.0;
        config.detection.canny_high = 10.0;
        let opts = config.detector_options();
        assert_eq!(opts.canny_high, 100.0);
    }

    #[test]
    fn test_load_from_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "[fill]\nsample_from_source = true\n").unwrap();
        let config = Config::load_from_path(&path).unwrap();
        assert!(config.fill_options().sample_from_source);

        let missing = Config::load_from_path(&dir.path().join("nope.toml"));
        assert!(matches!(missing, Err(ConfigError::NotFound(_))));

        fs::write(&path, "[fill\n").unwrap();
        assert!(matches!(
            Config::load_from_path(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_toml_roundtrip_default() {
        let text = Config::default().to_toml();
        assert!(text.contains("[detection]"));
        assert_eq!(Config::from_toml_str(&text).unwrap(), Config::default());
    }

    #[test]
    fn test_search_paths_local_first() {
        let paths = Config::search_paths();
        assert_eq!(paths[0], PathBuf::from(LOCAL_CONFIG_FILE));
    }
}
