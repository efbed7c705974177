//! Pipeline stages for PDF OCR.
//!
//! Each submodule implements exactly one transformation step, so each can be
//! tested on its own and the remote service can be swapped behind
//! [`vision::TextRecognizer`] without touching the other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ encode ──▶ vision ──▶ compose ──▶ docx
//! (bytes)   (pdfium)   (PNG)     (OCR)     (txt)       (zip+xml)
//! ```
//!
//! 1. [`input`]   — read the upload into memory and check the `%PDF` signature
//! 2. [`render`]  — rasterise every page at the configured DPI; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 3. [`encode`]  — RGB PNG encoding and the base64 request payload
//! 4. [`vision`]  — Cloud Vision `images:annotate` with the Arabic hint; the
//!    only stage with network I/O
//! 5. [`compose`] — RTL plain text, output names and MIME types
//! 6. [`docx`]    — right-aligned Word document with page breaks

pub mod compose;
pub mod docx;
pub mod encode;
pub mod input;
pub mod render;
pub mod vision;
