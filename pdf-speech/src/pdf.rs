//! PDF text extraction with OCR fallback for scanned documents.

use crate::error::{PipelineError, Result};
use crate::text::{clean_text, truncate_words, word_count};
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

/// Number of characters shown by a text preview.
pub const PREVIEW_CHARS: usize = 500;

/// Default rendering resolution for OCR.
pub const DEFAULT_OCR_DPI: u32 = 300;

/// Failures inside a PDF backend.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Failed to run {tool}: {source}")]
    Tool {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} failed: {message}")]
    Failed { tool: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Source of per-page text for a PDF.
pub trait PdfBackend {
    /// Selectable text of each page, in page order.
    fn page_texts(&self, pdf_path: &Path) -> std::result::Result<Vec<String>, ExtractError>;

    /// OCR text of each rendered page, in page order.
    fn ocr_pages(&self, pdf_path: &Path) -> std::result::Result<Vec<String>, ExtractError>;
}

/// Join page texts the way they are read aloud: one space between pages.
fn join_pages(pages: &[String]) -> String {
    pages
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extract text from a PDF, falling back to OCR when no text is selectable.
///
/// The result is truncated to `max_words` words when a limit is given and
/// then filtered through [`clean_text`].
pub fn extract_text(
    backend: &dyn PdfBackend,
    pdf_path: &Path,
    max_words: Option<usize>,
) -> Result<String> {
    let extraction_error = |e: ExtractError| PipelineError::Extraction {
        path: pdf_path.to_path_buf(),
        reason: e.to_string(),
    };

    let pages = backend.page_texts(pdf_path).map_err(extraction_error)?;
    let mut text = join_pages(&pages);

    if text.trim().is_empty() {
        log::info!(
            "No selectable text in {}, running OCR on {} page(s)",
            pdf_path.display(),
            pages.len()
        );
        let pages = backend.ocr_pages(pdf_path).map_err(extraction_error)?;
        text = join_pages(&pages);
    }

    let text = match max_words {
        Some(limit) => truncate_words(&text, limit),
        None => text.trim().to_string(),
    };

    let cleaned = clean_text(&text);
    if cleaned.trim().is_empty() {
        return Err(PipelineError::NoText(pdf_path.to_path_buf()));
    }

    log::debug!(
        "Extracted {} words from {}",
        word_count(&cleaned),
        pdf_path.display()
    );
    Ok(cleaned)
}

/// Summary of extracted text for the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextPreview {
    /// Leading characters, with `...` appended when truncated
    pub excerpt: String,
    pub characters: usize,
    pub words: usize,
}

impl TextPreview {
    pub fn from_text(text: &str) -> Self {
        let characters = text.chars().count();
        let excerpt = if characters > PREVIEW_CHARS {
            let head: String = text.chars().take(PREVIEW_CHARS).collect();
            format!("{}...", head)
        } else {
            text.to_string()
        };

        Self {
            excerpt,
            characters,
            words: word_count(text),
        }
    }
}

/// Backend using poppler-utils for text and rendering, and tesseract for OCR.
pub struct PopplerBackend {
    pdftotext: PathBuf,
    pdftoppm: PathBuf,
    tesseract: PathBuf,
    dpi: u32,
}

impl PopplerBackend {
    pub fn new(
        pdftotext: impl Into<PathBuf>,
        pdftoppm: impl Into<PathBuf>,
        tesseract: impl Into<PathBuf>,
    ) -> Self {
        Self {
            pdftotext: pdftotext.into(),
            pdftoppm: pdftoppm.into(),
            tesseract: tesseract.into(),
            dpi: DEFAULT_OCR_DPI,
        }
    }

    /// Set the page rendering resolution used before OCR.
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }
}

/// Run a tool and return its stdout, failing on a non-zero exit.
fn run_tool(program: &Path, cmd: &mut Command) -> std::result::Result<Vec<u8>, ExtractError> {
    let tool = program.display().to_string();
    let output = cmd.output().map_err(|source| ExtractError::Tool {
        tool: tool.clone(),
        source,
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ExtractError::Failed {
            tool,
            message: stderr.trim().to_string(),
        });
    }

    Ok(output.stdout)
}

/// Page number of a `pdftoppm` output file such as `page-07.png`.
fn page_number(path: &Path) -> Option<u32> {
    let stem = path.file_stem()?.to_str()?;
    let (_, digits) = stem.rsplit_once('-')?;
    digits.parse().ok()
}

impl PdfBackend for PopplerBackend {
    fn page_texts(&self, pdf_path: &Path) -> std::result::Result<Vec<String>, ExtractError> {
        let stdout = run_tool(
            &self.pdftotext,
            Command::new(&self.pdftotext)
                .args(["-enc", "UTF-8"])
                .arg(pdf_path)
                .arg("-"),
        )?;

        // pdftotext ends every page with a form feed
        let text = String::from_utf8_lossy(&stdout);
        let mut pages: Vec<String> = text.split('\x0c').map(str::to_string).collect();
        if pages.last().is_some_and(|p| p.trim().is_empty()) {
            pages.pop();
        }
        Ok(pages)
    }

    fn ocr_pages(&self, pdf_path: &Path) -> std::result::Result<Vec<String>, ExtractError> {
        let render_dir = tempfile::Builder::new().prefix("pdf-ocr-").tempdir()?;
        let prefix = render_dir.path().join("page");

        run_tool(
            &self.pdftoppm,
            Command::new(&self.pdftoppm)
                .arg("-r")
                .arg(self.dpi.to_string())
                .arg("-png")
                .arg(pdf_path)
                .arg(&prefix),
        )?;

        let mut images: Vec<(u32, PathBuf)> = std::fs::read_dir(render_dir.path())?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|e| e == "png"))
            .filter_map(|p| page_number(&p).map(|n| (n, p)))
            .collect();
        images.sort_by_key(|(n, _)| *n);

        if images.is_empty() {
            return Err(ExtractError::Failed {
                tool: self.pdftoppm.display().to_string(),
                message: "no pages were rendered".to_string(),
            });
        }

        let mut pages = Vec::with_capacity(images.len());
        for (number, image) in &images {
            let stdout = run_tool(
                &self.tesseract,
                Command::new(&self.tesseract).arg(image).arg("stdout"),
            )?;
            log::debug!("OCR page {}: {} bytes", number, stdout.len());
            pages.push(String::from_utf8_lossy(&stdout).into_owned());
        }

        Ok(pages)
    }
}

/// Check if a command-line tool can be launched.
pub fn is_tool_available(program: &Path, version_flag: &str) -> bool {
    Command::new(program)
        .arg(version_flag)
        .output()
        .is_ok()
}
