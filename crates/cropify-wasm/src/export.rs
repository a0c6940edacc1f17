//! Zip export bindings.
//!
//! The archive is assembled fully in memory and handed to JS as a byte
//! vector; the page wraps it in a `Blob` and triggers the download. The
//! embedder supplies the date for the archive name so the core stays
//! clock-free.

use cropify_core::export::{self, DOWNLOAD_DELAY_MS};
use cropify_core::batch::{BatchError, ErrorKind};
use cropify_core::OutputSpec;
use wasm_bindgen::prelude::*;

use crate::batch::JsBatchScheduler;

/// Suggested name for the downloaded archive, e.g.
/// `cropify_batch_2026-08-30.zip`.
#[wasm_bindgen]
pub fn archive_filename(date: &str) -> String {
    export::archive_filename(date)
}

/// [`archive_filename`] for today, read from the host clock.
#[wasm_bindgen]
pub fn default_archive_filename() -> String {
    let iso = String::from(js_sys::Date::new_0().to_iso_string());
    export::archive_filename(&iso[..10])
}

/// Milliseconds the UI should wait between sequential single-file
/// downloads so the browser does not coalesce them.
#[wasm_bindgen]
pub fn download_delay_ms() -> u32 {
    DOWNLOAD_DELAY_MS
}

#[wasm_bindgen]
impl JsBatchScheduler {
    /// Zip every completed result under its derived filename.
    ///
    /// Fails with an `export` error when no task has completed.
    pub fn build_archive(&self, output: JsValue) -> Result<Vec<u8>, JsValue> {
        let spec: OutputSpec = serde_wasm_bindgen::from_value(output)?;
        self.archive_bytes(&spec).map_err(|error| {
            serde_wasm_bindgen::to_value(&error).unwrap_or_else(|_| JsValue::from_str(&error.message))
        })
    }

    /// Derived filenames of the completed results, in task order.
    ///
    /// Lets the UI drive sequential single-file downloads without
    /// re-deriving the naming scheme in JS.
    pub fn export_filenames(&self, output: JsValue) -> Result<Vec<String>, JsValue> {
        let spec: OutputSpec = serde_wasm_bindgen::from_value(output)?;
        Ok(self.entry_filenames(&spec))
    }
}

impl JsBatchScheduler {
    pub(crate) fn archive_bytes(&self, spec: &OutputSpec) -> Result<Vec<u8>, BatchError> {
        let entries = export::collect_entries(self.tasks_ref(), self.working_set(), spec);
        export::build_archive(&entries).map_err(|err| BatchError {
            kind: ErrorKind::Export,
            message: err.to_string(),
            detail: None,
        })
    }

    pub(crate) fn entry_filenames(&self, spec: &OutputSpec) -> Vec<String> {
        export::collect_entries(self.tasks_ref(), self.working_set(), spec)
            .into_iter()
            .map(|entry| entry.filename)
            .collect()
    }
}
