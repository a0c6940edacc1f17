//! The geometric transform engine: crop, rotate, flip, rounded corners.
//!
//! # Transform order
//!
//! The output canvas is fixed at the crop size; content is placed by an
//! affine stack applied about the canvas center:
//! 1. Rotation (degrees, about the crop-rectangle center)
//! 2. Horizontal/vertical flips
//! 3. Rounded-corner clip (defined in untransformed output space)
//!
//! # Coordinate system
//!
//! - Crop coordinates are source pixels, origin at the top-left corner
//! - Rotation is in degrees, positive = clockwise on screen
//! - The output raster is always exactly `spec.width x spec.height`

mod bounds;
mod crop;

pub use bounds::rotated_size;
pub use crop::{render_crop, render_preview, TransformError, PREVIEW_MAX_EDGE};
