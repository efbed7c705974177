//! Status-callback trait for step and per-page OCR events.
//!
//! Inject an [`Arc<dyn OcrProgressCallback>`] via
//! [`crate::config::OcrConfigBuilder::progress_callback`] to follow a run:
//! which of the three steps is active, how many pages the PDF has once it is
//! rasterised, and the running fraction of pages recognised so far.
//!
//! # Example
//!
//! ```rust
//! use arabic_pdf_ocr::{OcrConfig, OcrProgressCallback, PipelineStep};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl OcrProgressCallback for Printer {
//!     fn on_step(&self, step: PipelineStep) {
//!         eprintln!("{step}");
//!     }
//!     fn on_page_complete(&self, page_num: usize, total_pages: usize, _text_len: usize) {
//!         eprintln!("{page_num}/{total_pages}");
//!     }
//! }
//!
//! let config = OcrConfig::builder()
//!     .progress_callback(Arc::new(Printer))
//!     .build()
//!     .unwrap();
//! ```

use crate::error::OcrError;
use std::fmt;
use std::sync::Arc;

/// The three user-visible steps of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStep {
    /// Rasterising PDF pages.
    Rasterizing,
    /// Sending `total_pages` page images to the OCR service.
    Recognizing { total_pages: usize },
    /// Building the TXT and DOCX downloads.
    Composing,
}

impl PipelineStep {
    /// 1-indexed position of the step.
    pub fn number(&self) -> usize {
        match self {
            PipelineStep::Rasterizing => 1,
            PipelineStep::Recognizing { .. } => 2,
            PipelineStep::Composing => 3,
        }
    }
}

/// Total number of steps in a run.
pub const TOTAL_STEPS: usize = 3;

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Step {}/{}: ", self.number(), TOTAL_STEPS)?;
        match self {
            PipelineStep::Rasterizing => write!(f, "Converting PDF pages to images..."),
            PipelineStep::Recognizing { total_pages } => {
                write!(f, "Sending {total_pages} pages to Google for OCR...")
            }
            PipelineStep::Composing => write!(f, "Preparing your files for download..."),
        }
    }
}

/// Fraction of pages processed, in `0.0..=1.0`. An empty document counts as done.
pub fn progress_fraction(done: usize, total: usize) -> f32 {
    if total == 0 {
        1.0
    } else {
        (done.min(total) as f32) / (total as f32)
    }
}

/// Called by the pipeline as a run progresses.
///
/// Pages are processed strictly one after another, so events arrive in
/// page order. All methods default to no-ops.
pub trait OcrProgressCallback: Send + Sync {
    /// Called when one of the three steps begins.
    fn on_step(&self, step: PipelineStep) {
        let _ = step;
    }

    /// Called once rasterisation finished, with the page count.
    fn on_pages_rendered(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called just before a page image is sent for recognition.
    ///
    /// # Arguments
    /// * `page_num`    — 1-indexed page number
    /// * `total_pages` — total pages in the document
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when a page has been recognised.
    ///
    /// `page_num / total_pages` is the running fraction (see
    /// [`progress_fraction`]); `text_len` is the character count of the
    /// recognised text, zero for a blank page.
    fn on_page_complete(&self, page_num: usize, total_pages: usize, text_len: usize) {
        let _ = (page_num, total_pages, text_len);
    }

    /// Called once both downloads are ready.
    fn on_complete(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called once when the run aborts. No further events follow.
    fn on_failure(&self, error: &OcrError) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl OcrProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::OcrConfig`].
pub type ProgressCallback = Arc<dyn OcrProgressCallback>;
