//! Output composition: page texts → the two downloadable files.

use crate::error::OcrError;
use crate::output::{OutputFile, PageText};
use crate::pipeline::docx;
use std::path::Path;

/// Right-to-Left Embedding (U+202B), forces RTL direction in plain-text viewers.
pub const RTL_EMBEDDING: char = '\u{202B}';

/// Literal marker placed between consecutive pages of the text output.
pub const PAGE_SEPARATOR: &str = "\n\n--- Page Break ---\n\n";

/// Suffix appended to the input's base name for both downloads.
pub const OUTPUT_SUFFIX: &str = "_OCR";

pub const TEXT_MIME: &str = "text/plain; charset=utf-8";
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Join page texts into the plain-text document.
pub fn compose_text<S: AsRef<str>>(pages: &[S]) -> String {
    let mut out = String::new();
    out.push(RTL_EMBEDDING);
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            out.push_str(PAGE_SEPARATOR);
        }
        out.push_str(page.as_ref());
    }
    out
}

/// Base name of the uploaded file, without directory or extension.
pub fn base_name(original: &str) -> String {
    Path::new(original)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "document".to_string())
}

/// `<base>_OCR.<extension>`.
pub fn output_file_name(original: &str, extension: &str) -> String {
    format!("{}{}.{}", base_name(original), OUTPUT_SUFFIX, extension)
}

/// Build both downloads for a finished run.
pub fn compose_outputs(
    original_name: &str,
    pages: &[PageText],
) -> Result<(OutputFile, OutputFile), OcrError> {
    let texts: Vec<&str> = pages.iter().map(|p| p.text.as_str()).collect();

    let text = OutputFile {
        file_name: output_file_name(original_name, "txt"),
        mime_type: TEXT_MIME.to_string(),
        bytes: compose_text(&texts).into_bytes(),
    };

    let document = OutputFile {
        file_name: output_file_name(original_name, "docx"),
        mime_type: DOCX_MIME.to_string(),
        bytes: docx::build_docx(&texts, &base_name(original_name))?,
    };

    Ok((text, document))
}
