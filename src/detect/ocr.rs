//! OCR Box Locator
//!
//! Locates text directly through a text recognition engine and returns one
//! rectangle per recognized token. Tokens are not filtered by confidence and
//! empty or whitespace-only tokens are kept: whiting out a non-text box is
//! harmless on a white page.

use image::{GrayImage, ImageFormat, RgbImage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

use super::intensity::to_intensity;
use super::types::{DetectError, RectRegion, Result};

/// Default Tesseract executable name
pub const DEFAULT_TESSERACT_CMD: &str = "tesseract";

/// Default OCR language
pub const DEFAULT_OCR_LANGUAGE: &str = "eng";

/// Fully automatic page segmentation, no OSD
pub const DEFAULT_PAGE_SEG_MODE: u8 = 3;

// ============================================================
// Tokens
// ============================================================

/// Layout hierarchy level of a recognized token
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenLevel {
    Page = 1,
    Block = 2,
    Paragraph = 3,
    Line = 4,
    Word = 5,
}

impl TokenLevel {
    /// Level from Tesseract's numeric TSV `level` column
    pub fn from_tsv(level: u8) -> Option<Self> {
        match level {
            1 => Some(TokenLevel::Page),
            2 => Some(TokenLevel::Block),
            3 => Some(TokenLevel::Paragraph),
            4 => Some(TokenLevel::Line),
            5 => Some(TokenLevel::Word),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TokenLevel::Page => "page",
            TokenLevel::Block => "block",
            TokenLevel::Paragraph => "paragraph",
            TokenLevel::Line => "line",
            TokenLevel::Word => "word",
        }
    }
}

impl fmt::Display for TokenLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TokenLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "page" => Ok(TokenLevel::Page),
            "block" => Ok(TokenLevel::Block),
            "paragraph" | "par" => Ok(TokenLevel::Paragraph),
            "line" => Ok(TokenLevel::Line),
            "word" => Ok(TokenLevel::Word),
            other => Err(format!("unknown token level: {other}")),
        }
    }
}

/// One recognized token with its layout box
#[derive(Debug, Clone, PartialEq)]
pub struct OcrToken {
    pub level: TokenLevel,
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
    /// Recognizer confidence, `-1` for non-word levels
    pub confidence: f32,
    pub text: String,
}

impl OcrToken {
    pub fn rect(&self) -> RectRegion {
        RectRegion::new(self.left, self.top, self.width, self.height)
    }
}

// ============================================================
// Recognizer seam
// ============================================================

/// Text recognition engine returning per-token layout boxes
pub trait TextRecognizer: Send + Sync + fmt::Debug {
    /// Recognize tokens on an intensity image
    fn recognize(&self, image: &GrayImage) -> Result<Vec<OcrToken>>;

    /// Short engine name for logs
    fn name(&self) -> &str {
        "recognizer"
    }
}

/// Tesseract executable driven through its TSV output
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    command: PathBuf,
    language: String,
    page_seg_mode: u8,
}

impl Default for TesseractRecognizer {
    fn default() -> Self {
        Self::new(DEFAULT_TESSERACT_CMD)
    }
}

impl TesseractRecognizer {
    pub fn new(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            language: DEFAULT_OCR_LANGUAGE.to_string(),
            page_seg_mode: DEFAULT_PAGE_SEG_MODE,
        }
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    #[must_use]
    pub fn with_page_seg_mode(mut self, psm: u8) -> Self {
        self.page_seg_mode = psm;
        self
    }

    pub fn command(&self) -> &Path {
        &self.command
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn page_seg_mode(&self) -> u8 {
        self.page_seg_mode
    }

    /// Whether the executable resolves on this system
    pub fn is_available(&self) -> bool {
        which::which(&self.command).is_ok()
    }

    fn run_on_file(&self, path: &Path) -> Result<String> {
        let output = Command::new(&self.command)
            .arg(path)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .arg("--psm")
            .arg(self.page_seg_mode.to_string())
            .arg("tsv")
            .output()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    DetectError::RecognizerUnavailable(self.command.display().to_string())
                }
                _ => DetectError::IoError(e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DetectError::RecognitionFailed(stderr.trim().to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, image: &GrayImage) -> Result<Vec<OcrToken>> {
        let input = tempfile::Builder::new()
            .prefix("manga-text-eraser-")
            .suffix(".png")
            .tempfile()?;
        image.save_with_format(input.path(), ImageFormat::Png)?;

        let tsv = self.run_on_file(input.path())?;
        parse_tsv(&tsv)
    }

    fn name(&self) -> &str {
        "tesseract"
    }
}

/// Parse Tesseract TSV output into tokens.
///
/// Columns: level, page_num, block_num, par_num, line_num, word_num,
/// left, top, width, height, conf, text. The text column may be absent.
pub fn parse_tsv(tsv: &str) -> Result<Vec<OcrToken>> {
    let mut tokens = Vec::new();

    for (idx, line) in tsv.lines().enumerate() {
        let line_no = idx + 1;
        if line.trim().is_empty() || line.starts_with("level") {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 11 {
            return Err(DetectError::MalformedOutput {
                line: line_no,
                reason: format!("expected at least 11 columns, found {}", fields.len()),
            });
        }

        let int = |col: usize| -> Result<i32> {
            fields[col]
                .trim()
                .parse::<i32>()
                .map_err(|e| DetectError::MalformedOutput {
                    line: line_no,
                    reason: format!("column {col}: {e}"),
                })
        };

        let level_num = int(0)?;
        let level = u8::try_from(level_num)
            .ok()
            .and_then(TokenLevel::from_tsv)
            .ok_or_else(|| DetectError::MalformedOutput {
                line: line_no,
                reason: format!("unknown level {level_num}"),
            })?;

        let confidence = fields[10]
            .trim()
            .parse::<f32>()
            .map_err(|e| DetectError::MalformedOutput {
                line: line_no,
                reason: format!("confidence: {e}"),
            })?;

        tokens.push(OcrToken {
            level,
            left: int(6)?,
            top: int(7)?,
            width: int(8)?.max(0) as u32,
            height: int(9)?.max(0) as u32,
            confidence,
            text: fields.get(11).map(|t| t.to_string()).unwrap_or_default(),
        });
    }

    Ok(tokens)
}

// ============================================================
// Locator
// ============================================================

/// Options for OCR box location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OcrOptions {
    /// Shallowest layout level kept; `Word` keeps word boxes only
    pub min_level: TokenLevel,
}

impl Default for OcrOptions {
    fn default() -> Self {
        Self {
            min_level: TokenLevel::Word,
        }
    }
}

/// Recognition-driven text box locator
#[derive(Debug, Clone)]
pub struct OcrBoxLocator {
    recognizer: Arc<dyn TextRecognizer>,
    options: OcrOptions,
}

impl OcrBoxLocator {
    pub fn new(recognizer: Arc<dyn TextRecognizer>, options: OcrOptions) -> Self {
        Self {
            recognizer,
            options,
        }
    }

    pub fn options(&self) -> &OcrOptions {
        &self.options
    }

    pub fn recognizer(&self) -> &dyn TextRecognizer {
        self.recognizer.as_ref()
    }

    /// Locate one rectangle per recognized token
    pub fn locate(&self, image: &RgbImage) -> Result<Vec<RectRegion>> {
        let gray = to_intensity(image);
        let tokens = self.recognizer.recognize(&gray)?;
        let total = tokens.len();

        let rects: Vec<RectRegion> = tokens
            .iter()
            .filter(|t| t.level >= self.options.min_level)
            .map(OcrToken::rect)
            .filter(|r| !r.is_empty())
            .collect();

        debug!(
            engine = self.recognizer.name(),
            tokens = total,
            boxes = rects.len(),
            "OCR box location complete"
        );
        Ok(rects)
    }
}
