//! JPEG encoding.
//!
//! JPEG has no alpha channel, so transparent pixels (from rounded-corner
//! crops) are flattened over black, matching what a browser canvas does
//! when exporting `image/jpeg`.

use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use image::ImageEncoder;
use std::io::Cursor;

use super::{validate, EncodeError};
use crate::decode::DecodedImage;

/// Encode an RGBA raster to JPEG bytes.
///
/// # Arguments
///
/// * `image` - Source raster
/// * `quality` - JPEG quality (1-100, where 100 is highest quality)
///
/// # Errors
///
/// Returns an error for zero dimensions, a mismatched pixel buffer, or
/// an encoder failure. Never returns an empty blob.
pub fn encode_jpeg(image: &DecodedImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
    validate(image)?;

    let rgb = flatten_to_rgb(image);

    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
    encoder
        .write_image(&rgb, image.width, image.height, ExtendedColorType::Rgb8)
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(buffer.into_inner())
}

/// Flatten RGBA over black into a packed RGB buffer.
fn flatten_to_rgb(image: &DecodedImage) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(image.width as usize * image.height as usize * 3);
    for px in image.pixels.chunks_exact(4) {
        let a = u16::from(px[3]);
        rgb.push((u16::from(px[0]) * a / 255) as u8);
        rgb.push((u16::from(px[1]) * a / 255) as u8);
        rgb.push((u16::from(px[2]) * a / 255) as u8);
    }
    rgb
}
