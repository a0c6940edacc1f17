//! Cropify WASM - WebAssembly bindings for the Cropify batch crop pipeline
//!
//! This crate exposes the cropify-core functionality to the
//! JavaScript/TypeScript UI layer.
//!
//! # Module Structure
//!
//! - `types` - JS-friendly snapshot types for tasks and summaries
//! - `transform` - interactive preview rendering and rotated-bounds math
//! - `batch` - the pump-driven batch scheduler object
//! - `export` - filename derivation and zip archive assembly
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsBatchScheduler } from '@cropify/wasm';
//!
//! await init();
//!
//! const scheduler = new JsBatchScheduler();
//! scheduler.add_image(id, file.name, new Uint8Array(await file.arrayBuffer()));
//! scheduler.start_batch(cropSpec, outputSpec);
//! while (scheduler.pump()) {
//!   // Inter-task yield keeps the UI responsive
//!   await new Promise(r => setTimeout(r, 50));
//! }
//! ```

use wasm_bindgen::prelude::*;

mod batch;
mod export;
mod transform;
mod types;

// Re-export public types
pub use batch::JsBatchScheduler;
pub use export::{archive_filename, default_archive_filename, download_delay_ms};
pub use transform::{render_preview_jpeg, rotated_size};
pub use types::{ImageMeta, TaskSnapshot};

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    // Future: Set up panic hook for better error messages in browser console
    // when console_error_panic_hook feature is added
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
