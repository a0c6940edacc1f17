//! Container sniffing and decoding for the supported input formats.
//!
//! Cropify accepts JPEG, PNG, and WebP sources. Everything is decoded to
//! RGBA8 so the transform engine works on a single pixel layout.

use std::io::Cursor;

use image::{ImageFormat, ImageReader};

use super::{DecodeError, DecodedImage};

/// Sniff the MIME type of an encoded image from its magic bytes.
///
/// Returns `None` for formats Cropify does not accept as input.
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    match image::guess_format(bytes).ok()? {
        ImageFormat::Jpeg => Some("image/jpeg"),
        ImageFormat::Png => Some("image/png"),
        ImageFormat::WebP => Some("image/webp"),
        _ => None,
    }
}

/// Decode an encoded image (JPEG, PNG, or WebP) to an RGBA raster.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if the container is not one of the
/// supported input formats, `DecodeError::CorruptedFile` if the bytes fail
/// to decode, and `DecodeError::EmptyImage` for zero-dimension results -
/// an invalid raster is never silently passed downstream.
pub fn decode_image(bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
    // Reject unsupported containers up front so a BMP or GIF reports as
    // an unsupported format rather than a corrupt file.
    sniff_mime(bytes).ok_or(DecodeError::InvalidFormat)?;

    let cursor = Cursor::new(bytes);
    let reader = ImageReader::new(cursor)
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    let img = reader
        .decode()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    let rgba = img.into_rgba8();
    let decoded = DecodedImage::from_rgba_image(rgba);

    if decoded.is_empty() {
        return Err(DecodeError::EmptyImage);
    }

    Ok(decoded)
}
