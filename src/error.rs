//! Error types for the arabic-pdf-ocr library.
//!
//! A run is all-or-nothing: every failure, whether it comes from the
//! credential blob, the PDF, the remote OCR service or the output writer,
//! aborts the run and surfaces as a single [`OcrError`]. No partial text is
//! ever handed back to the caller.
//!
//! Each variant carries enough context to be shown verbatim to a user, and
//! [`OcrError::hint`] supplies the short remediation line that goes with it.

use std::path::PathBuf;
use thiserror::Error;

/// Remediation line shown after every failure that is not a missing credential.
pub const REMEDIATION_HINT: &str =
    "Please check your API key and make sure the Cloud Vision API is enabled for your project.";

/// Hint shown when the run was started without any credential blob.
pub const MISSING_CREDENTIALS_HINT: &str =
    "Paste your full Google service account JSON key (or pass --credentials <FILE>) to continue.";

/// All fatal errors returned by the arabic-pdf-ocr library.
#[derive(Debug, Error)]
pub enum OcrError {
    // ── Credential errors ─────────────────────────────────────────────────
    /// No credential blob was supplied (empty or whitespace-only).
    #[error("No Google service account credentials were provided.")]
    MissingCredentials,

    /// The credential blob is not valid service-account JSON.
    #[error("Credentials are not valid service account JSON: {source}")]
    MalformedCredentials {
        #[source]
        source: serde_json::Error,
    },

    /// The JSON parsed, but its key material cannot be used for signing.
    #[error("Service account credentials are unusable: {detail}")]
    InvalidCredentials { detail: String },

    // ── Remote service errors ─────────────────────────────────────────────
    /// The token endpoint or the Vision API rejected our identity (401/403).
    #[error("Authentication with Google failed: {detail}")]
    AuthFailed { detail: String },

    /// The project ran out of quota or was rate limited (429).
    #[error("Google Cloud Vision quota exceeded: {detail}")]
    QuotaExceeded { detail: String },

    /// Any other error reported by the Vision API.
    #[error("Cloud Vision API error on page {page} (HTTP {status}): {message}")]
    VisionApi {
        page: usize,
        status: u16,
        message: String,
    },

    /// The Vision API did not answer within the configured timeout.
    #[error("Cloud Vision API call timed out after {secs}s on page {page}")]
    ApiTimeout { page: usize, secs: u64 },

    /// Transport-level failure talking to Google.
    #[error("HTTP request to {url} failed: {detail}")]
    Http { url: String, detail: String },

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'")]
    PermissionDenied { path: PathBuf },

    /// No `%PDF-` header near the start of the bytes.
    #[error("'{name}' is not a PDF file (first bytes: {magic:?})")]
    NotAPdf { name: String, magic: Vec<u8> },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// pdfium could not parse the document.
    #[error("PDF '{name}' is corrupt or unreadable: {detail}")]
    CorruptPdf { name: String, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{name}' is encrypted and requires a password.")]
    PasswordRequired { name: String },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{name}'")]
    WrongPassword { name: String },

    /// pdfium returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// A rendered page could not be PNG-encoded.
    #[error("Image encoding failed for page {page}: {detail}")]
    ImageEncodingFailed { page: usize, detail: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// The DOCX package could not be assembled.
    #[error("Failed to build the Word document: {0}")]
    DocumentWriteFailed(String),

    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Environment / config errors ───────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDF rendering needs the pdfium shared library. It is downloaded to a\n\
per-user cache on first use. If that is not possible:\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n\
  • Set PDFIUM_AUTO_CACHE_DIR to move the download cache.\n\
  • Build with --features bundled to embed the library.\n"
    )]
    PdfiumBindingFailed(String),

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl OcrError {
    /// Short human-readable advice to print after the error message.
    pub fn hint(&self) -> &'static str {
        match self {
            OcrError::MissingCredentials => MISSING_CREDENTIALS_HINT,
            _ => REMEDIATION_HINT,
        }
    }

    /// Whether the error originated from the credential blob or Google's
    /// authentication/quota checks rather than from the PDF.
    pub fn is_credential_error(&self) -> bool {
        matches!(
            self,
            OcrError::MissingCredentials
                | OcrError::MalformedCredentials { .. }
                | OcrError::InvalidCredentials { .. }
                | OcrError::AuthFailed { .. }
                | OcrError::QuotaExceeded { .. }
        )
    }
}
