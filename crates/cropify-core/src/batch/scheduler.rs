//! The sequential batch scheduler.
//!
//! Tasks run strictly one at a time, in working-set order. Concurrency of
//! one is a deliberate tradeoff: raster operations allocate surfaces
//! proportional to megapixel sources, and unbounded parallel allocation
//! risks memory exhaustion in the browser host. The embedder drives the
//! run through [`BatchScheduler::process_next`], yielding between calls
//! to keep the host responsive; [`BatchScheduler::run`] loops it for
//! native use.
//!
//! Cancellation is cooperative: a shared token is polled at the stage
//! boundaries of each task (decode, crop, encode, finalize). A raster
//! operation already entered runs to completion before the next check.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{BatchSummary, Task, TaskId, TaskStatus};
use crate::decode::{decode_image, ImageRecord};
use crate::encode::{convert, encode_intermediate, encode_preview};
use crate::transform::{render_crop, render_preview};
use crate::{CropSpec, OutputSpec};

/// Classification of a reported error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Bad file type or size during import.
    Ingestion,
    /// Decode/crop/encode failure for one task.
    Processing,
    /// Archive or download failure.
    Export,
    /// Unexpected/uncategorized.
    System,
}

/// An error event reported to the embedder.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct BatchError {
    /// Error classification.
    pub kind: ErrorKind,
    /// Human-readable summary.
    pub message: String,
    /// Optional context, e.g. the affected filename.
    pub detail: Option<String>,
}

impl BatchError {
    /// Build a `Processing` error for one task's failure.
    fn processing(detail: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Processing,
            message: "Image processing failed".to_string(),
            detail: Some(detail.into()),
        }
    }
}

/// Shared cooperative-cancellation signal.
///
/// Clonable; an embedder holds a clone and trips it while the scheduler
/// polls it at stage boundaries. Tripping the token never interrupts a
/// raster operation mid-draw.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create an untripped token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the cancellation signal.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether the signal has been raised.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Lower the signal for a fresh run.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::Relaxed);
    }
}

/// Progress checkpoints for the four task stages.
const PROGRESS_DECODED: u8 = 25;
const PROGRESS_CROPPED: u8 = 50;
const PROGRESS_ENCODED: u8 = 75;

/// Orchestrates sequential execution of crop tasks.
///
/// The task list is owned exclusively by the scheduler and mutated only
/// from within its operations; the working set is read-only here.
#[derive(Debug, Default)]
pub struct BatchScheduler {
    tasks: Vec<Task>,
    next_id: u64,
    is_processing: bool,
    token: CancellationToken,
}

impl BatchScheduler {
    /// Create an idle scheduler with no tasks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Observable task list for UI rendering.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Whether a run is currently active.
    pub fn is_processing(&self) -> bool {
        self.is_processing
    }

    /// A clone of the cancellation token, for tripping the run externally.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Aggregate counts for the current run.
    pub fn summary(&self, images: &[ImageRecord]) -> BatchSummary {
        BatchSummary::compute(&self.tasks, images)
    }

    /// Begin (or resume) a batch run. No-op while a run is active.
    ///
    /// Builds or refreshes the task list: a `Completed` task is reused
    /// only when its spec snapshots equal the current specs, so a spec
    /// change invalidates prior results; everything else becomes a fresh
    /// `Pending` task snapshotting the specs passed here. Tasks for
    /// images no longer in the working set are dropped, releasing their
    /// result blobs.
    pub fn start(&mut self, images: &[ImageRecord], crop: &CropSpec, output: &OutputSpec) {
        if self.is_processing {
            return;
        }

        let previous = std::mem::take(&mut self.tasks);
        self.tasks = images
            .iter()
            .map(|image| {
                let existing = previous.iter().find(|t| t.image_id == image.id);
                match existing {
                    Some(task)
                        if task.status == TaskStatus::Completed
                            && task.crop == *crop
                            && task.output == *output =>
                    {
                        task.clone()
                    }
                    Some(task) => Task::new(task.id, image.id.clone(), crop, output),
                    None => Task::new(self.fresh_id(), image.id.clone(), crop, output),
                }
            })
            .collect();

        self.token.reset();
        self.is_processing = self
            .tasks
            .iter()
            .any(|t| t.status.is_runnable());
    }

    /// Process the next pending task, in working-set order.
    ///
    /// Returns `true` while more work remains; the embedder should yield
    /// briefly before the next call. A failing task records its error,
    /// reports it through `on_error`, and never aborts the run.
    pub fn process_next(
        &mut self,
        images: &[ImageRecord],
        on_error: &mut dyn FnMut(&BatchError),
    ) -> bool {
        if !self.is_processing {
            return false;
        }

        // Pause/cancel observed between tasks: leave pending tasks resumable
        let Some(index) = self.tasks.iter().position(|t| t.status.is_runnable()) else {
            self.is_processing = false;
            return false;
        };

        if let Err(err) = self.process_task(index, images) {
            match err {
                TaskOutcome::Cancelled => {
                    self.is_processing = false;
                    return false;
                }
                TaskOutcome::Failed(detail) => {
                    let error = BatchError::processing(detail.clone());
                    self.tasks[index].fail(detail);
                    on_error(&error);
                }
            }
        }

        let more = self.tasks.iter().any(|t| t.status.is_runnable());
        if !more {
            self.is_processing = false;
        }
        more
    }

    /// Drive the run to completion (native convenience; the wasm embedder
    /// pumps [`Self::process_next`] with yields instead).
    pub fn run(&mut self, images: &[ImageRecord], on_error: &mut dyn FnMut(&BatchError)) {
        while self.process_next(images, on_error) {}
    }

    /// Pause the run: not-yet-started tasks stay `Pending` and a later
    /// `start` resumes them. A task mid-flight when the signal is
    /// observed is marked `Cancelled` at its next checkpoint.
    pub fn pause(&mut self) {
        self.token.cancel();
        self.is_processing = false;
    }

    /// Hard stop: same signal as pause, plus every currently `Processing`
    /// task is force-marked `Cancelled` immediately to free resources,
    /// without waiting for its next checkpoint.
    pub fn cancel(&mut self) {
        self.token.cancel();
        self.is_processing = false;
        for task in &mut self.tasks {
            if task.status == TaskStatus::Processing {
                task.status = TaskStatus::Cancelled;
                task.result = None;
                task.preview = None;
            }
        }
    }

    /// Reset every `Failed` task to `Pending` and start a new run.
    pub fn retry_failed(&mut self, images: &[ImageRecord], crop: &CropSpec, output: &OutputSpec) {
        if self.is_processing {
            return;
        }
        for task in &mut self.tasks {
            task.reset_for_retry();
        }
        self.start(images, crop, output);
    }

    /// Drop all tasks, releasing their result blobs.
    pub fn clear(&mut self) {
        self.tasks.clear();
        self.is_processing = false;
        self.token.reset();
    }

    fn fresh_id(&mut self) -> TaskId {
        self.next_id += 1;
        TaskId(self.next_id)
    }

    /// Run one task through the four stages, with a cancellation check
    /// before each. `Ok(())` means the task completed.
    fn process_task(&mut self, index: usize, images: &[ImageRecord]) -> Result<(), TaskOutcome> {
        let task = &mut self.tasks[index];
        task.status = TaskStatus::Processing;
        task.progress = 0;

        let check = |task: &mut Task, token: &CancellationToken| -> Result<(), TaskOutcome> {
            if token.is_cancelled() {
                task.status = TaskStatus::Cancelled;
                Err(TaskOutcome::Cancelled)
            } else {
                Ok(())
            }
        };

        check(task, &self.token)?;

        // Stage 1: resolve + decode the source
        let image = images
            .iter()
            .find(|img| img.id == task.image_id)
            .ok_or_else(|| TaskOutcome::Failed("source image no longer in working set".into()))?;

        let raster = decode_image(&image.bytes)
            .map_err(|e| TaskOutcome::Failed(format!("{}: {e}", image.name)))?;
        task.progress = PROGRESS_DECODED;
        check(task, &self.token)?;

        // Stage 2: geometry, into the lossless intermediate
        let cropped = render_crop(&raster, &task.crop)
            .map_err(|e| TaskOutcome::Failed(format!("{}: {e}", image.name)))?;
        let intermediate = encode_intermediate(&cropped)
            .map_err(|e| TaskOutcome::Failed(format!("{}: {e}", image.name)))?;
        task.progress = PROGRESS_CROPPED;
        check(task, &self.token)?;

        // Stage 3: final format conversion
        let result = convert(&intermediate, &task.output)
            .map_err(|e| TaskOutcome::Failed(format!("{}: {e}", image.name)))?;
        task.progress = PROGRESS_ENCODED;
        check(task, &self.token)?;

        // Stage 4: finalize with a result preview
        let preview_raster = render_preview(&raster, &task.crop)
            .map_err(|e| TaskOutcome::Failed(format!("{}: {e}", image.name)))?;
        let preview = encode_preview(&preview_raster)
            .map_err(|e| TaskOutcome::Failed(format!("{}: {e}", image.name)))?;

        task.complete(result, preview);
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn tasks_mut(&mut self) -> &mut Vec<Task> {
        &mut self.tasks
    }
}

/// Why a task did not complete.
enum TaskOutcome {
    /// The cancellation signal was observed at a checkpoint.
    Cancelled,
    /// A stage failed; carries the human-readable detail.
    Failed(String),
}


// ============================================================================
// Property-Based Tests
// ============================================================================
