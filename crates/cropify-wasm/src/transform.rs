//! WASM bindings for interactive preview rendering.
//!
//! The preview panel re-renders on every slider change, so this path
//! decodes, renders at the bounded preview scale, and encodes a small
//! JPEG in one call.

use cropify_core::decode::decode_image;
use cropify_core::encode::encode_preview;
use cropify_core::{render_preview, CropSpec};
use wasm_bindgen::prelude::*;

/// Render a moderate-quality JPEG preview of the crop.
///
/// # Arguments
///
/// * `bytes` - Encoded source image (JPEG, PNG, or WebP)
/// * `crop` - A `CropSpec` object from JS
///
/// # Example (TypeScript)
///
/// ```typescript
/// const jpeg = render_preview_jpeg(sourceBytes, cropSpec);
/// previewImg.src = URL.createObjectURL(new Blob([jpeg], { type: 'image/jpeg' }));
/// ```
#[wasm_bindgen]
pub fn render_preview_jpeg(bytes: &[u8], crop: JsValue) -> Result<Vec<u8>, JsValue> {
    let spec: CropSpec = serde_wasm_bindgen::from_value(crop)?;
    preview_jpeg(bytes, &spec).map_err(|e| JsValue::from_str(&e))
}

/// Typed implementation behind the JsValue boundary.
pub(crate) fn preview_jpeg(bytes: &[u8], spec: &CropSpec) -> Result<Vec<u8>, String> {
    let raster = decode_image(bytes).map_err(|e| e.to_string())?;
    let preview = render_preview(&raster, spec).map_err(|e| e.to_string())?;
    let blob = encode_preview(&preview).map_err(|e| e.to_string())?;
    Ok(blob.bytes)
}

/// Bounding box of a `width x height` crop frame rotated by
/// `angle_degrees`, as `[width, height]`.
#[wasm_bindgen]
pub fn rotated_size(width: u32, height: u32, angle_degrees: f64) -> Vec<u32> {
    let (w, h) = cropify_core::rotated_size(width, height, angle_degrees);
    vec![w, h]
}
