//! # arabic-pdf-ocr
//!
//! Extract Arabic text from PDF documents with Google Cloud Vision.
//!
//! Each page is rasterised at 300 DPI, sent to the Vision `images:annotate`
//! endpoint with an Arabic language hint, and the recognised text comes back
//! as two downloads: a UTF-8 text file forced right-to-left, and a Word
//! document with one right-aligned paragraph per page.
//!
//! ## Pipeline Overview
//!
//! ```text
//! credentials JSON + PDF
//!  │
//!  ├─ 0. Check    parse the service-account key, verify the %PDF signature
//!  ├─ 1. Render   rasterise pages via pdfium (spawn_blocking) → PNG
//!  ├─ 2. OCR      one Vision call per page, in order, language hint "ar"
//!  └─ 3. Compose  <name>_OCR.txt (U+202B + page-break separators)
//!                 <name>_OCR.docx (right-aligned paragraphs + page breaks)
//! ```
//!
//! A run is all-or-nothing: the first error aborts it and no partial text
//! is returned.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use arabic_pdf_ocr::{ocr_file, OcrConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let key = std::fs::read_to_string("service-account.json")?;
//!     let output = ocr_file("book.pdf", &key, &OcrConfig::default()).await?;
//!     std::fs::write(&output.text_document.file_name, &output.text_document.bytes)?;
//!     std::fs::write(&output.word_document.file_name, &output.word_document.bytes)?;
//!     eprintln!("{} pages", output.stats.total_pages);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `arabic-ocr` binary (clap + anyhow + indicatif + tracing-subscriber) |
//! | `bundled` | off   | Embeds the pdfium library at build time (`PDFIUM_BUNDLE_LIB` must name it) |
//!
//! ## Runtime requirements
//!
//! Rendering needs the pdfium shared library. It is downloaded once to a
//! per-user cache on first use; set `PDFIUM_LIB_PATH` to use an existing
//! copy instead.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod auth;
pub mod config;
pub mod convert;
pub mod credentials;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{DetectionMode, OcrConfig, OcrConfigBuilder, DEFAULT_VISION_ENDPOINT};
pub use convert::{inspect, ocr_bytes, ocr_file, ocr_file_sync, ocr_to_dir, recognize_pages};
pub use credentials::ServiceAccountKey;
pub use error::{OcrError, REMEDIATION_HINT};
pub use output::{DocumentMetadata, OcrOutput, OcrStats, OutputFile, PageText, SavedOutput};
pub use pipeline::compose::{compose_text, output_file_name, PAGE_SEPARATOR, RTL_EMBEDDING};
pub use pipeline::docx::build_docx;
pub use pipeline::render::PageImage;
pub use pipeline::vision::{TextRecognizer, VisionClient};
pub use progress::{
    progress_fraction, NoopProgressCallback, OcrProgressCallback, PipelineStep, ProgressCallback,
};
