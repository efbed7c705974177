//! PDF rasterisation: render every page to a PNG via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which keeps thread-local
//! state and is not safe to drive from async contexts. Rendering moves onto
//! Tokio's blocking pool so the runtime's worker threads never stall on a
//! 300 DPI page.
//!
//! The document is opened from memory; nothing is written to disk and the
//! pdfium handle is dropped before the function returns, leaving only the
//! encoded page buffers.

use crate::config::OcrConfig;
use crate::error::OcrError;
use crate::output::DocumentMetadata;
use crate::pipeline::encode;
use pdfium_render::prelude::*;
use tracing::{debug, info};

/// PDF user-space units per inch.
const POINTS_PER_INCH: f32 = 72.0;

/// One rasterised page, PNG-encoded.
#[derive(Debug, Clone)]
pub struct PageImage {
    /// 0-based position in the document.
    pub page_index: usize,
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

/// Bind to the pdfium shared library.
///
/// `PDFIUM_LIB_PATH` wins when set. Otherwise the per-user cache is used,
/// downloading the platform build on first use. Blocks; call it off the
/// async workers.
pub fn bind_pdfium() -> Result<Pdfium, OcrError> {
    pdfium_auto::bind_pdfium_silent().map_err(|e| OcrError::PdfiumBindingFailed(e.to_string()))
}

/// Rasterise all pages of an in-memory PDF, in document order.
pub async fn render_pages(
    pdf_bytes: Vec<u8>,
    name: &str,
    config: &OcrConfig,
) -> Result<Vec<PageImage>, OcrError> {
    let name = name.to_string();
    let dpi = config.dpi;
    let password = config.password.clone();

    tokio::task::spawn_blocking(move || {
        render_pages_blocking(&pdf_bytes, &name, dpi, password.as_deref())
    })
    .await
    .map_err(|e| OcrError::Internal(format!("Render task panicked: {}", e)))?
}

/// Blocking implementation of page rendering.
fn render_pages_blocking(
    pdf_bytes: &[u8],
    name: &str,
    dpi: u32,
    password: Option<&str>,
) -> Result<Vec<PageImage>, OcrError> {
    let pdfium = bind_pdfium()?;
    let document = open_document(&pdfium, pdf_bytes, name, password)?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages, rendering at {} DPI", total_pages, dpi);

    let render_config = PdfRenderConfig::new().scale_page_by_factor(dpi as f32 / POINTS_PER_INCH);

    let mut results = Vec::with_capacity(total_pages);

    for (idx, page) in pages.iter().enumerate() {
        let bitmap = page.render_with_config(&render_config).map_err(|e| {
            OcrError::RasterisationFailed {
                page: idx + 1,
                detail: format!("{:?}", e),
            }
        })?;

        let image = bitmap.as_image();
        let png = encode::encode_png(&image).map_err(|e| OcrError::ImageEncodingFailed {
            page: idx + 1,
            detail: e.to_string(),
        })?;

        debug!(
            "Rendered page {} → {}x{} px",
            idx + 1,
            image.width(),
            image.height()
        );

        results.push(PageImage {
            page_index: idx,
            width: image.width(),
            height: image.height(),
            png,
        });
    }

    Ok(results)
}

fn open_document<'a>(
    pdfium: &'a Pdfium,
    pdf_bytes: &'a [u8],
    name: &str,
    password: Option<&str>,
) -> Result<PdfDocument<'a>, OcrError> {
    pdfium
        .load_pdf_from_byte_slice(pdf_bytes, password)
        .map_err(|e| {
            let err_str = format!("{:?}", e);
            if err_str.contains("Password") || err_str.contains("password") {
                if password.is_some() {
                    OcrError::WrongPassword {
                        name: name.to_string(),
                    }
                } else {
                    OcrError::PasswordRequired {
                        name: name.to_string(),
                    }
                }
            } else {
                OcrError::CorruptPdf {
                    name: name.to_string(),
                    detail: err_str,
                }
            }
        })
}

/// Read document metadata without rendering pages.
pub async fn extract_metadata(
    pdf_bytes: Vec<u8>,
    name: &str,
    password: Option<&str>,
) -> Result<DocumentMetadata, OcrError> {
    let name = name.to_string();
    let pwd = password.map(|s| s.to_string());

    tokio::task::spawn_blocking(move || extract_metadata_blocking(&pdf_bytes, &name, pwd.as_deref()))
        .await
        .map_err(|e| OcrError::Internal(format!("Metadata task panicked: {}", e)))?
}

fn extract_metadata_blocking(
    pdf_bytes: &[u8],
    name: &str,
    password: Option<&str>,
) -> Result<DocumentMetadata, OcrError> {
    let pdfium = bind_pdfium()?;
    let document = open_document(&pdfium, pdf_bytes, name, password)?;

    let metadata = document.metadata();
    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata.get(tag).and_then(|t| {
            let v = t.value().to_string();
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        })
    };

    Ok(DocumentMetadata {
        file_name: name.to_string(),
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        producer: get_meta(PdfDocumentMetadataTagType::Producer),
        page_count: document.pages().len() as usize,
        pdf_version: format!("{:?}", document.version()),
    })
}
