//! PNG encoding - the lossless path.
//!
//! PNG ignores the quality setting; the 0-9 level maps onto the `image`
//! crate's discrete compression tiers.

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::ExtendedColorType;
use image::ImageEncoder;
use std::io::Cursor;

use super::{validate, EncodeError};
use crate::decode::DecodedImage;

/// Encode an RGBA raster to PNG bytes.
///
/// `level` is a 0-9 compression-effort hint: 0-2 fast, 3-6 default,
/// 7-9 best. Pixels are preserved exactly at every level.
pub fn encode_png(image: &DecodedImage, level: u8) -> Result<Vec<u8>, EncodeError> {
    validate(image)?;

    let compression = match level {
        0..=2 => CompressionType::Fast,
        3..=6 => CompressionType::Default,
        _ => CompressionType::Best,
    };

    let mut buffer = Cursor::new(Vec::new());
    let encoder = PngEncoder::new_with_quality(&mut buffer, compression, FilterType::Adaptive);
    encoder
        .write_image(&image.pixels, image.width, image.height, ExtendedColorType::Rgba8)
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(buffer.into_inner())
}
