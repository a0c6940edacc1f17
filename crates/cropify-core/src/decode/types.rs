//! Core types for image decoding.

use thiserror::Error;

/// Error types for image decoding operations.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The file format is not recognized or supported.
    #[error("Invalid or unsupported image format")]
    InvalidFormat,

    /// The image file is corrupted or incomplete.
    #[error("Corrupted or incomplete image file: {0}")]
    CorruptedFile(String),

    /// The decoded raster has a zero dimension.
    #[error("Decoded image has zero width or height")]
    EmptyImage,

    /// The file exceeds the ingestion size limit.
    #[error("File size {actual} exceeds limit of {limit} bytes")]
    FileTooLarge { actual: usize, limit: usize },
}

/// Maximum size of a single source file accepted at ingestion (10 MB).
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Maximum number of images in one working set.
pub const MAX_BATCH_SIZE: usize = 50;

/// A decoded image with RGBA pixel data.
///
/// RGBA rather than RGB: rounded-corner crops produce transparent pixels
/// and the PNG/WebP output paths carry the alpha channel through.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// RGBA pixel data in row-major order (4 bytes per pixel).
    /// Length should be width * height * 4.
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    /// Create a new DecodedImage with the given dimensions and pixel data.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            width as usize * height as usize * 4,
            "Pixel buffer size mismatch"
        );
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Create a DecodedImage from an image::RgbaImage.
    pub fn from_rgba_image(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        let pixels = img.into_raw();
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Convert to an image::RgbaImage for further processing.
    pub fn to_rgba_image(&self) -> Option<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
    }

    /// Get the total number of pixels.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Get the size of the pixel buffer in bytes.
    pub fn byte_size(&self) -> usize {
        self.pixels.len()
    }

    /// Check if this is an empty/invalid image.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }
}

/// A validated source image in the working set.
///
/// Owns the original encoded bytes; the scheduler only ever reads them.
/// Tasks refer to records by `id` rather than holding a reference, so a
/// working-set mutation between batches never leaves a dangling pointer.
#[derive(Debug, Clone)]
pub struct ImageRecord {
    /// Caller-assigned unique id.
    pub id: String,
    /// Original filename, used for preserve-name exports.
    pub name: String,
    /// Encoded source bytes, immutable after creation.
    pub bytes: Vec<u8>,
    /// Declared MIME type (sniffed from the container).
    pub mime: String,
    /// Intrinsic pixel width.
    pub width: u32,
    /// Intrinsic pixel height.
    pub height: u32,
}

impl ImageRecord {
    /// Validate and ingest an encoded image file.
    ///
    /// Sniffs the container, enforces the size limit, and decodes once to
    /// capture intrinsic dimensions. Returns an error rather than a record
    /// for unsupported or oversize files, so ingestion failures surface as
    /// error entries instead of panics.
    pub fn from_bytes(
        id: impl Into<String>,
        name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<Self, DecodeError> {
        if bytes.len() > MAX_FILE_SIZE {
            return Err(DecodeError::FileTooLarge {
                actual: bytes.len(),
                limit: MAX_FILE_SIZE,
            });
        }

        let mime = super::sniff_mime(&bytes).ok_or(DecodeError::InvalidFormat)?;
        let decoded = super::decode_image(&bytes)?;

        Ok(Self {
            id: id.into(),
            name: name.into(),
            bytes,
            mime: mime.to_string(),
            width: decoded.width,
            height: decoded.height,
        })
    }

    /// Size of the encoded source in bytes.
    pub fn byte_size(&self) -> usize {
        self.bytes.len()
    }
}
