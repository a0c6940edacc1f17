//! Image encoding pipeline for Cropify.
//!
//! Geometry and encoding are separate concerns: the transform engine
//! always hands its result to [`encode_intermediate`] (lossless PNG), and
//! the final output format is produced by [`convert`], which re-decodes
//! the intermediate before re-encoding. The round trip is deliberate -
//! the intermediate and target may differ in color/alpha handling, and it
//! keeps lossy artifacts from compounding inside the pipeline.

mod jpeg;
mod png;
mod webp;

pub use jpeg::encode_jpeg;
pub use png::encode_png;
pub use webp::encode_webp;

use thiserror::Error;

use crate::decode::{decode_image, DecodedImage};
use crate::{OutputFormat, OutputSpec};

/// Errors that can occur during encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 4), got {actual}")]
    InvalidPixelData { expected: u64, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The underlying encoder failed
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),

    /// Re-decoding the lossless intermediate failed during conversion
    #[error("Format conversion failed: {0}")]
    ConversionFailed(String),
}

/// An encoded output blob plus the container it uses.
#[derive(Debug, Clone)]
pub struct EncodedBlob {
    /// Encoded bytes.
    pub bytes: Vec<u8>,
    /// Container format of `bytes`.
    pub format: OutputFormat,
}

impl EncodedBlob {
    /// Size of the encoded blob in bytes.
    pub fn byte_size(&self) -> usize {
        self.bytes.len()
    }
}

/// JPEG quality used for interactive previews.
const PREVIEW_JPEG_QUALITY: u8 = 80;

/// Encode a raster into the target format described by `spec`.
///
/// Quality is a 0-100 value for the lossy formats; for PNG it is a 0-9
/// compression level and no quality parameter is honored.
pub fn encode(image: &DecodedImage, spec: &OutputSpec) -> Result<EncodedBlob, EncodeError> {
    let quality = spec.effective_quality();
    let bytes = match spec.format {
        OutputFormat::Jpeg => encode_jpeg(image, quality)?,
        OutputFormat::Png => encode_png(image, quality)?,
        OutputFormat::WebP => encode_webp(image, quality)?,
    };
    Ok(EncodedBlob {
        bytes,
        format: spec.format,
    })
}

/// Encode the lossless intermediate between geometry and final encode.
pub fn encode_intermediate(image: &DecodedImage) -> Result<EncodedBlob, EncodeError> {
    // Fast compression: the intermediate lives only for one pipeline pass
    let bytes = encode_png(image, 1)?;
    Ok(EncodedBlob {
        bytes,
        format: OutputFormat::Png,
    })
}

/// Encode a preview raster as moderate-quality JPEG.
pub fn encode_preview(image: &DecodedImage) -> Result<EncodedBlob, EncodeError> {
    let bytes = encode_jpeg(image, PREVIEW_JPEG_QUALITY)?;
    Ok(EncodedBlob {
        bytes,
        format: OutputFormat::Jpeg,
    })
}

/// Convert a lossless intermediate blob into the final output format.
///
/// Re-decodes the intermediate into a fresh raster before re-encoding;
/// format conversion requires the full decode -> encode round trip.
pub fn convert(blob: &EncodedBlob, spec: &OutputSpec) -> Result<EncodedBlob, EncodeError> {
    let raster = decode_image(&blob.bytes).map_err(|e| EncodeError::ConversionFailed(e.to_string()))?;
    encode(&raster, spec)
}

/// Shared dimension/buffer validation for the per-format encoders.
fn validate(image: &DecodedImage) -> Result<(), EncodeError> {
    if image.width == 0 || image.height == 0 {
        return Err(EncodeError::InvalidDimensions {
            width: image.width,
            height: image.height,
        });
    }
    // u64 arithmetic: oversized dimensions must report a mismatch, not
    // overflow on the way to the comparison
    let expected = u64::from(image.width) * u64::from(image.height) * 4;
    if image.pixels.len() as u64 != expected {
        return Err(EncodeError::InvalidPixelData {
            expected,
            actual: image.pixels.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
fn test_raster(width: u32, height: u32) -> DecodedImage {
    let mut pixels = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            pixels.extend_from_slice(&[(x % 256) as u8, (y % 256) as u8, 64, 255]);
        }
    }
    DecodedImage::new(width, height, pixels)
}
