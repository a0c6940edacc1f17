//! Image decoding pipeline for Cropify.
//!
//! This module provides functionality for:
//! - Sniffing and validating the supported input containers (JPEG, PNG, WebP)
//! - Decoding sources to RGBA rasters
//! - Ingesting validated [`ImageRecord`]s for the working set
//!
//! # Architecture
//!
//! The decoding pipeline is designed to be used from Web Workers via WASM
//! bindings. All operations are synchronous and single-threaded within WASM.

mod formats;
mod types;

pub use formats::{decode_image, sniff_mime};
pub use types::{DecodeError, DecodedImage, ImageRecord, MAX_BATCH_SIZE, MAX_FILE_SIZE};
