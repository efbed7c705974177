//! Image encoding: rendered page → PNG bytes → base64 request payload.
//!
//! PNG is lossless; JPEG artefacts around thin Arabic strokes and dots
//! measurably hurt recognition, so page images are never lossy-compressed.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode a rendered page as an RGB PNG.
///
/// The alpha channel pdfium produces is dropped; OCR only needs colour.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut buf = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    debug!(
        "Encoded {}x{} page → {} bytes PNG",
        rgb.width(),
        rgb.height(),
        buf.len()
    );
    Ok(buf)
}

/// Standard base64, as the Vision `image.content` field expects.
pub fn to_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}
