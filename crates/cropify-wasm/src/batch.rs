//! The pump-driven batch scheduler exposed to JavaScript.
//!
//! WASM has no preemption, so the embedder drives the run: `start_batch`
//! builds the task list and `pump` processes exactly one task per call.
//! JS awaits a short timeout between pumps - that is the cooperative
//! inter-task yield that keeps the rendering thread responsive. `pause`
//! and `cancel` trip the shared cancellation token, which the pipeline
//! polls at its four stage boundaries.

use cropify_core::batch::{BatchError, BatchScheduler, ErrorKind, TaskId, TaskStatus};
use cropify_core::decode::{DecodeError, ImageRecord, MAX_BATCH_SIZE};
use cropify_core::{CropSpec, OutputSpec};
use wasm_bindgen::prelude::*;

use crate::types::{ImageMeta, TaskSnapshot};

/// Owns the working set and the core scheduler; one instance per app.
#[wasm_bindgen]
pub struct JsBatchScheduler {
    images: Vec<ImageRecord>,
    scheduler: BatchScheduler,
    errors: Vec<BatchError>,
}

impl Default for JsBatchScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl JsBatchScheduler {
    /// Create an empty scheduler.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            images: Vec::new(),
            scheduler: BatchScheduler::new(),
            errors: Vec::new(),
        }
    }

    /// Validate and add one image to the working set.
    ///
    /// Returns `true` on success. Rejections (unsupported format,
    /// oversize file, batch limit) queue an `ingestion` error entry for
    /// [`Self::drain_errors`] instead of throwing.
    pub fn add_image(&mut self, id: String, name: String, bytes: Vec<u8>) -> bool {
        self.ingest(id, name, bytes).is_some()
    }

    /// Metadata of every image in the working set.
    pub fn images(&self) -> Result<JsValue, JsValue> {
        let metas: Vec<ImageMeta> = self.images.iter().map(ImageMeta::from).collect();
        Ok(serde_wasm_bindgen::to_value(&metas)?)
    }

    /// Remove one image from the working set by id.
    ///
    /// Tasks referencing it resolve by id at use time and will fail
    /// cleanly rather than dangle.
    pub fn remove_image(&mut self, id: &str) {
        self.images.retain(|img| img.id != id);
    }

    /// Clear the working set and drop all tasks with their result blobs.
    pub fn clear_images(&mut self) {
        self.images.clear();
        self.scheduler.clear();
    }

    /// Number of images in the working set.
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Begin (or resume) a batch run. No-op while a run is active.
    pub fn start_batch(&mut self, crop: JsValue, output: JsValue) -> Result<(), JsValue> {
        let crop: CropSpec = serde_wasm_bindgen::from_value(crop)?;
        let output: OutputSpec = serde_wasm_bindgen::from_value(output)?;
        self.scheduler.start(&self.images, &crop, &output);
        Ok(())
    }

    /// Process the next pending task; returns `true` while more remain.
    ///
    /// The embedder should yield (~50 ms) between calls.
    pub fn pump(&mut self) -> bool {
        let errors = &mut self.errors;
        let more = self.scheduler.process_next(&self.images, &mut |error| {
            web_sys::console::warn_1(&format!("cropify: {error}").into());
            errors.push(error.clone());
        });
        more
    }

    /// Pause: pending tasks stay pending; a later `start_batch` resumes.
    pub fn pause_batch(&mut self) {
        self.scheduler.pause();
    }

    /// Hard stop: also force-marks the in-flight task cancelled.
    pub fn cancel_batch(&mut self) {
        self.scheduler.cancel();
    }

    /// Reset failed tasks and start a new run.
    pub fn retry_failed(&mut self, crop: JsValue, output: JsValue) -> Result<(), JsValue> {
        let crop: CropSpec = serde_wasm_bindgen::from_value(crop)?;
        let output: OutputSpec = serde_wasm_bindgen::from_value(output)?;
        self.scheduler.retry_failed(&self.images, &crop, &output);
        Ok(())
    }

    /// Whether a run is currently active.
    pub fn is_processing(&self) -> bool {
        self.scheduler.is_processing()
    }

    /// Lightweight task snapshots for UI rendering.
    pub fn tasks(&self) -> Result<JsValue, JsValue> {
        let snapshots: Vec<TaskSnapshot> =
            self.scheduler.tasks().iter().map(TaskSnapshot::from).collect();
        Ok(serde_wasm_bindgen::to_value(&snapshots)?)
    }

    /// Aggregate batch counts and the naive time estimate.
    pub fn summary(&self) -> Result<JsValue, JsValue> {
        let summary = self.scheduler.summary(&self.images);
        Ok(serde_wasm_bindgen::to_value(&summary)?)
    }

    /// Encoded result bytes of a completed task, copied to JS.
    pub fn result_bytes(&self, task_id: u64) -> Option<Vec<u8>> {
        self.task_blob(task_id, false)
    }

    /// Encoded preview bytes of a completed task, copied to JS.
    pub fn preview_bytes(&self, task_id: u64) -> Option<Vec<u8>> {
        self.task_blob(task_id, true)
    }

    /// Drain and return the queued error events (`onError` polling).
    pub fn drain_errors(&mut self) -> Result<JsValue, JsValue> {
        let drained: Vec<BatchError> = std::mem::take(&mut self.errors);
        Ok(serde_wasm_bindgen::to_value(&drained)?)
    }
}

impl JsBatchScheduler {
    // Shared by the typed tests and the wasm surface.

    pub(crate) fn ingest(&mut self, id: String, name: String, bytes: Vec<u8>) -> Option<ImageMeta> {
        if self.images.len() >= MAX_BATCH_SIZE {
            self.push_ingestion_error(
                format!("Batch size limit of {MAX_BATCH_SIZE} images reached"),
                name,
            );
            return None;
        }

        match ImageRecord::from_bytes(id, name.clone(), bytes) {
            Ok(record) => {
                let meta = ImageMeta::from(&record);
                self.images.push(record);
                Some(meta)
            }
            Err(err) => {
                let message = match err {
                    DecodeError::InvalidFormat => "Unsupported file format".to_string(),
                    DecodeError::FileTooLarge { limit, .. } => {
                        format!("File exceeds the {} MB limit", limit / (1024 * 1024))
                    }
                    other => other.to_string(),
                };
                self.push_ingestion_error(message, name);
                None
            }
        }
    }

    fn push_ingestion_error(&mut self, message: String, file: String) {
        self.errors.push(BatchError {
            kind: ErrorKind::Ingestion,
            message,
            detail: Some(format!("file: {file}")),
        });
    }

    pub(crate) fn working_set(&self) -> &[ImageRecord] {
        &self.images
    }

    pub(crate) fn tasks_ref(&self) -> &[cropify_core::batch::Task] {
        self.scheduler.tasks()
    }

    pub(crate) fn core(&mut self) -> &mut BatchScheduler {
        &mut self.scheduler
    }

    fn task_blob(&self, task_id: u64, preview: bool) -> Option<Vec<u8>> {
        let task = self
            .scheduler
            .tasks()
            .iter()
            .find(|t| t.id == TaskId(task_id) && t.status == TaskStatus::Completed)?;
        let blob = if preview {
            task.preview.as_ref()
        } else {
            task.result.as_ref()
        }?;
        Some(blob.bytes.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cropify_core::decode::DecodedImage;
    use cropify_core::encode::encode_png;
    use cropify_core::OutputFormat;

    fn sample_png(width: u32, height: u32) -> Vec<u8> {
        let raster = DecodedImage::new(width, height, vec![90u8; (width * height * 4) as usize]);
        encode_png(&raster, 1).unwrap()
    }

    #[test]
    fn test_ingest_valid_image() {
        let mut scheduler = JsBatchScheduler::new();
        let meta = scheduler
            .ingest("a".into(), "a.png".into(), sample_png(20, 10))
            .unwrap();

        assert_eq!(meta.width, 20);
        assert_eq!(meta.height, 10);
        assert_eq!(meta.mime, "image/png");
        assert_eq!(scheduler.image_count(), 1);
    }

    #[test]
    fn test_ingest_rejects_garbage_with_error_entry() {
        let mut scheduler = JsBatchScheduler::new();
        assert!(scheduler
            .ingest("a".into(), "junk.bin".into(), vec![0u8; 50])
            .is_none());
        assert_eq!(scheduler.image_count(), 0);
        assert_eq!(scheduler.errors.len(), 1);
        assert_eq!(scheduler.errors[0].kind, ErrorKind::Ingestion);
        assert_eq!(scheduler.errors[0].detail.as_deref(), Some("file: junk.bin"));
    }

    #[test]
    fn test_ingest_enforces_batch_limit() {
        let mut scheduler = JsBatchScheduler::new();
        let png = sample_png(4, 4);
        for i in 0..MAX_BATCH_SIZE {
            assert!(scheduler.ingest(format!("img-{i}"), "x.png".into(), png.clone()).is_some());
        }
        assert!(scheduler
            .ingest("one-too-many".into(), "x.png".into(), png)
            .is_none());
        assert_eq!(scheduler.image_count(), MAX_BATCH_SIZE);
    }

    #[test]
    fn test_typed_batch_run_and_result_fetch() {
        let mut scheduler = JsBatchScheduler::new();
        scheduler
            .ingest("a".into(), "a.png".into(), sample_png(16, 16))
            .unwrap();

        let crop = CropSpec::new(0, 0, 8, 8);
        let output = OutputSpec {
            format: OutputFormat::Png,
            quality: 2,
            ..Default::default()
        };
        let images = scheduler.working_set().to_vec();
        scheduler.core().start(&images, &crop, &output);
        scheduler.core().run(&images, &mut |_| {});

        let task_id = scheduler.core().tasks()[0].id.0;
        assert!(scheduler.result_bytes(task_id).is_some());
        assert!(scheduler.preview_bytes(task_id).is_some());
        assert!(scheduler.result_bytes(9999).is_none());
    }

    #[test]
    fn test_remove_image_by_id() {
        let mut scheduler = JsBatchScheduler::new();
        scheduler.ingest("a".into(), "a.png".into(), sample_png(4, 4));
        scheduler.ingest("b".into(), "b.png".into(), sample_png(4, 4));
        scheduler.remove_image("a");

        assert_eq!(scheduler.image_count(), 1);
        assert_eq!(scheduler.working_set()[0].id, "b");
    }
}
