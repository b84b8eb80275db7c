//! pdf-speech configuration management.

use crate::pdf::DEFAULT_OCR_DPI;
use crate::text::chunker::{DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE, MIN_CHUNK_SIZE};
use crate::tts::{Device, ModelKind, DEFAULT_LANGUAGE};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Sample rates the operator may choose for the final audio.
pub const SAMPLE_RATES: &[u32] = &[22050, 44100, 48000];

pub const MIN_WORDS: usize = 10;
pub const MAX_WORDS: usize = 10000;

const DEFAULT_MAX_WORDS: usize = 1000;
const DEFAULT_SAMPLE_RATE: u32 = 22050;

/// Paths to the external programs the pipeline runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolPaths {
    #[serde(default = "default_pdftotext")]
    pub pdftotext: PathBuf,
    #[serde(default = "default_pdftoppm")]
    pub pdftoppm: PathBuf,
    #[serde(default = "default_tesseract")]
    pub tesseract: PathBuf,
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: PathBuf,
    /// Coqui TTS command-line program
    #[serde(default = "default_tts")]
    pub tts: PathBuf,
    /// Page rendering resolution for OCR
    #[serde(default = "default_ocr_dpi")]
    pub ocr_dpi: u32,
}

fn default_pdftotext() -> PathBuf {
    PathBuf::from("pdftotext")
}

fn default_pdftoppm() -> PathBuf {
    PathBuf::from("pdftoppm")
}

fn default_tesseract() -> PathBuf {
    PathBuf::from("tesseract")
}

fn default_ffmpeg() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_tts() -> PathBuf {
    PathBuf::from("tts")
}

fn default_ocr_dpi() -> u32 {
    DEFAULT_OCR_DPI
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            pdftotext: default_pdftotext(),
            pdftoppm: default_pdftoppm(),
            tesseract: default_tesseract(),
            ffmpeg: default_ffmpeg(),
            tts: default_tts(),
            ocr_dpi: default_ocr_dpi(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfSpeechConfig {
    /// Default voice sample for cloning
    #[serde(default)]
    pub voice_ref: Option<PathBuf>,

    /// Device to use (cuda, cpu). None means auto-detect.
    #[serde(default)]
    pub device: Option<Device>,

    /// Standard voice or voice cloning
    #[serde(default = "default_model")]
    pub model: ModelKind,

    /// Maximum words to extract from a PDF (10-10000)
    #[serde(default = "default_max_words")]
    pub max_words: usize,

    /// Sample rate of the final audio (22050, 44100 or 48000)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Maximum characters per synthesized chunk (500-2000)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Language tag for the cloning model
    #[serde(default = "default_language")]
    pub language: String,

    /// Directory receiving the final audio
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default)]
    pub tools: ToolPaths,
}

fn default_model() -> ModelKind {
    ModelKind::Cloning
}

fn default_max_words() -> usize {
    DEFAULT_MAX_WORDS
}

fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl Default for PdfSpeechConfig {
    fn default() -> Self {
        Self {
            voice_ref: None,
            device: None,
            model: default_model(),
            max_words: default_max_words(),
            sample_rate: default_sample_rate(),
            chunk_size: default_chunk_size(),
            language: default_language(),
            output_dir: default_output_dir(),
            tools: ToolPaths::default(),
        }
    }
}

/// Clamp a word limit to the accepted range.
pub fn clamp_max_words(value: usize) -> usize {
    value.clamp(MIN_WORDS, MAX_WORDS)
}

/// Clamp a chunk size to the accepted range.
pub fn clamp_chunk_size(value: usize) -> usize {
    value.clamp(MIN_CHUNK_SIZE, MAX_CHUNK_SIZE)
}

/// Parse a sample rate, accepting only the supported values.
pub fn parse_sample_rate(value: &str) -> std::result::Result<u32, String> {
    let rate: u32 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", value))?;

    if SAMPLE_RATES.contains(&rate) {
        Ok(rate)
    } else {
        Err(format!(
            "unsupported sample rate {} (choose one of 22050, 44100, 48000)",
            rate
        ))
    }
}

impl PdfSpeechConfig {
    /// Get the config file path: ~/.config/cli-programs/pdf-speech.toml
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Home directory not found"))?;
        Ok(home
            .join(".config")
            .join("cli-programs")
            .join("pdf-speech.toml"))
    }

    /// Load config from file, returning default if file doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: PdfSpeechConfig = toml::from_str(&content)?;
        Ok(config.normalized())
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Bring hand-edited values back into their accepted ranges.
    pub fn normalized(mut self) -> Self {
        self.max_words = clamp_max_words(self.max_words);
        self.chunk_size = clamp_chunk_size(self.chunk_size);
        if !SAMPLE_RATES.contains(&self.sample_rate) {
            log::warn!(
                "Ignoring unsupported sample rate {} in config, using {}",
                self.sample_rate,
                DEFAULT_SAMPLE_RATE
            );
            self.sample_rate = DEFAULT_SAMPLE_RATE;
        }
        self
    }
}
