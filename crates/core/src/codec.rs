//! Conversion between request bodies and [`DynamicImage`] values.
//!
//! Decoding happens in the HTTP layer before a job is built; PNG encoding
//! happens after a result is delivered. Neither runs on a worker.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat};

use crate::error::CodecError;

/// Content types accepted for uploaded images.
pub const SUPPORTED_CONTENT_TYPES: &[&str] = &["image/png", "image/jpeg"];

/// Content type of every encoded result.
pub const PNG_CONTENT_TYPE: &str = "image/png";

/// Decode an uploaded image, sniffing the format from its magic bytes.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, CodecError> {
    image::load_from_memory(bytes).map_err(CodecError::Decode)
}

/// Encode an image into an in-memory PNG buffer.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(CodecError::Encode)?;
    Ok(buf)
}

/// Whether `content_type` is one of [`SUPPORTED_CONTENT_TYPES`].
///
/// Parameters such as `; charset=...` are ignored.
pub fn is_supported_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    SUPPORTED_CONTENT_TYPES.contains(&mime.as_str())
}
