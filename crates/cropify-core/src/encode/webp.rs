//! Lossy WebP encoding via libwebp.
//!
//! The `image` crate only writes lossless WebP, so the quality-driven
//! path goes through the `webp` crate instead.

use super::{validate, EncodeError};
use crate::decode::DecodedImage;

/// Encode an RGBA raster to lossy WebP bytes.
///
/// # Arguments
///
/// * `image` - Source raster
/// * `quality` - WebP quality (0-100, where 100 is highest quality)
pub fn encode_webp(image: &DecodedImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
    validate(image)?;

    let encoder = webp::Encoder::from_rgba(&image.pixels, image.width, image.height);
    let memory = encoder
        .encode_simple(false, f32::from(quality.min(100)))
        .map_err(|e| EncodeError::EncodingFailed(format!("libwebp error: {e:?}")))?;

    Ok(memory.to_vec())
}
