//! Cropify Core - Batch image cropping library
//!
//! This crate provides the core processing functionality for Cropify,
//! including image decoding, the geometric crop/rotate/flip transform,
//! output encoding, the sequential batch scheduler, and export assembly.

pub mod batch;
pub mod decode;
pub mod encode;
pub mod export;
pub mod transform;

pub use batch::{BatchError, BatchScheduler, BatchSummary, ErrorKind, Task, TaskStatus};
pub use transform::{render_crop, render_preview, rotated_size, TransformError};

/// Shared crop transform applied identically to every image in a batch.
///
/// Coordinates are in source pixel space: `(x, y)` is the top-left corner
/// of the crop rectangle and `width`/`height` its size. The producing UI
/// keeps the rectangle inside the source bounds; the engine still clamps
/// defensively before any raster operation.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CropSpec {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Left edge of the crop rectangle in the source image.
    pub x: u32,
    /// Top edge of the crop rectangle in the source image.
    pub y: u32,
    /// Rotation in degrees, [0, 360), about the crop-rectangle center.
    #[serde(default)]
    pub rotation: f64,
    /// Mirror the result horizontally.
    #[serde(default)]
    pub flip_horizontal: bool,
    /// Mirror the result vertically.
    #[serde(default)]
    pub flip_vertical: bool,
    /// Corner rounding radius in pixels; effective value never exceeds
    /// `min(width, height) / 2`.
    #[serde(default)]
    pub border_radius: f64,
    /// UI hint: keep width/height at a fixed ratio during interactive
    /// edits. Carried with the spec but not read by the engine.
    #[serde(default)]
    pub maintain_aspect_ratio: bool,
}

impl CropSpec {
    /// Create a spec for an axis-aligned crop with no rotation or flips.
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            x,
            y,
            rotation: 0.0,
            flip_horizontal: false,
            flip_vertical: false,
            border_radius: 0.0,
            maintain_aspect_ratio: false,
        }
    }

    /// Effective corner radius after clamping to half the short edge.
    pub fn clamped_radius(&self) -> f64 {
        let half_short = f64::from(self.width.min(self.height)) / 2.0;
        self.border_radius.clamp(0.0, half_short)
    }

    /// True when the spec is a plain rectangular copy (no rotation,
    /// flips, or rounded corners).
    pub fn is_axis_aligned(&self) -> bool {
        self.rotation.abs() < f64::EPSILON
            && !self.flip_horizontal
            && !self.flip_vertical
            && self.border_radius <= 0.0
    }
}

/// Output container formats supported by the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Lossy photographic format, quality 0-100.
    #[default]
    Jpeg,
    /// Lossless format; quality is ignored, compression level is 0-9.
    Png,
    /// Modern efficient format, lossy, quality 0-100.
    WebP,
}

impl OutputFormat {
    /// File extension without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::WebP => "webp",
        }
    }

    /// MIME type for the encoded blob.
    pub fn mime(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::WebP => "image/webp",
        }
    }

    /// True for formats that never honor a quality parameter.
    pub fn is_lossless(self) -> bool {
        matches!(self, OutputFormat::Png)
    }
}

/// Target encoding settings for a batch.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OutputSpec {
    /// Target container format.
    pub format: OutputFormat,
    /// Quality 0-100 for lossy formats; compression level 0-9 for PNG.
    pub quality: u8,
    /// Keep the source filename stem, replacing only the extension.
    #[serde(default)]
    pub maintain_original_name: bool,
    /// Prefix for synthesized filenames.
    #[serde(default)]
    pub filename_prefix: String,
    /// Suffix for synthesized filenames (before the extension).
    #[serde(default)]
    pub filename_suffix: String,
}

impl Default for OutputSpec {
    fn default() -> Self {
        Self {
            format: OutputFormat::Jpeg,
            quality: 85,
            maintain_original_name: false,
            filename_prefix: String::new(),
            filename_suffix: String::new(),
        }
    }
}

impl OutputSpec {
    /// Quality clamped to the valid range for the selected format.
    pub fn effective_quality(&self) -> u8 {
        match self.format {
            OutputFormat::Jpeg | OutputFormat::WebP => self.quality.min(100),
            OutputFormat::Png => self.quality.min(9),
        }
    }
}
