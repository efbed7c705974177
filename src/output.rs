//! Result types returned by a successful run.

use serde::{Deserialize, Serialize};

/// The recognised text of one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageText {
    /// 1-indexed page number.
    pub page_num: usize,
    /// Full recognised text; empty when the page had no detectable text.
    pub text: String,
    /// Wall-clock time of the OCR call.
    pub duration_ms: u64,
}

/// A download ready to hand to the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputFile {
    /// `<original-basename>_OCR.<ext>`.
    pub file_name: String,
    pub mime_type: String,
    /// Skipped in JSON summaries; the CLI writes the bytes to disk instead.
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

/// Counters and timings for a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrStats {
    pub total_pages: usize,
    /// Pages for which the service found no text.
    pub empty_pages: usize,
    pub render_duration_ms: u64,
    pub ocr_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Everything a successful run produces.
///
/// `pages`, the segments of `text_document` and the paragraphs of
/// `word_document` always have the same length and order: one per PDF page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrOutput {
    /// Name of the uploaded PDF.
    pub source_name: String,
    pub pages: Vec<PageText>,
    pub text_document: OutputFile,
    pub word_document: OutputFile,
    pub stats: OcrStats,
}

/// Basic facts about a PDF, available without credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub file_name: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub producer: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}

/// A run whose downloads were written to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedOutput {
    pub output: OcrOutput,
    pub text_path: std::path::PathBuf,
    pub word_path: std::path::PathBuf,
}
