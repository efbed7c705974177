//! Input acquisition: load the user's PDF into memory and validate it.
//!
//! pdfium parses from a byte buffer, so the whole document is read once and
//! handed down the pipeline. The `%PDF-` header is checked here so callers
//! get a meaningful error rather than an opaque pdfium failure, and so a
//! non-PDF upload never reaches the rasteriser.

use crate::error::OcrError;
use std::path::Path;
use tracing::debug;

/// A PDF read into memory together with the name it was uploaded under.
#[derive(Debug)]
pub struct LoadedPdf {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Read a PDF from disk, validating existence, permissions and magic bytes.
pub async fn load_pdf(path: &Path) -> Result<LoadedPdf, OcrError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => OcrError::FileNotFound {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => OcrError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => OcrError::Internal(format!("reading '{}': {e}", path.display())),
    })?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".to_string());

    validate_pdf_bytes(&bytes, &file_name)?;
    debug!("Loaded PDF '{}' ({} bytes)", file_name, bytes.len());

    Ok(LoadedPdf { file_name, bytes })
}

/// How far into the file the `%PDF-` header may start.
const HEADER_SEARCH_LIMIT: usize = 1024;

/// Reject buffers with no `%PDF-` header in their first 1024 bytes.
/// Leading junk such as a BOM or blank lines is allowed.
pub fn validate_pdf_bytes(bytes: &[u8], name: &str) -> Result<(), OcrError> {
    let head = &bytes[..bytes.len().min(HEADER_SEARCH_LIMIT)];
    if !head.windows(5).any(|w| w == b"%PDF-") {
        return Err(OcrError::NotAPdf {
            name: name.to_string(),
            magic: bytes.iter().take(4).copied().collect(),
        });
    }
    Ok(())
}
