//! The per-image unit of scheduled work.

use serde::{Deserialize, Serialize};

use crate::decode::ImageRecord;
use crate::encode::EncodedBlob;
use crate::{CropSpec, OutputSpec};

/// Batch task lifecycle states.
///
/// Legal transitions: `Pending -> Processing -> {Completed | Failed}`,
/// `Processing -> Cancelled` via external cancellation, and
/// `Failed -> Pending` via retry. `Completed` and `Cancelled` are
/// terminal for a given task instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Waiting to be processed.
    #[default]
    Pending,
    /// Currently moving through the decode/crop/encode stages.
    Processing,
    /// Result blob attached.
    Completed,
    /// An error occurred; retryable.
    Failed,
    /// Stopped by pause/cancel before completing.
    Cancelled,
}

impl TaskStatus {
    /// Whether a task in this state can be picked up by the scheduler.
    pub fn is_runnable(self) -> bool {
        matches!(self, TaskStatus::Pending)
    }

    /// Whether this state ends the task's lifecycle.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Cancelled)
    }
}

/// Monotonic task identity; tasks for the same image across different
/// batch runs are distinct entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub u64);

/// One image's unit of crop + encode work and its result.
///
/// Holds a snapshot of the specs taken when the task was created, so a
/// mid-batch UI edit never retroactively alters an in-flight or
/// completed task. The owning image is referenced by id and resolved at
/// use time; the working set may mutate between runs.
#[derive(Debug, Clone)]
pub struct Task {
    /// Unique id; equality/identity is by this field.
    pub id: TaskId,
    /// Id of the owning [`ImageRecord`] in the working set.
    pub image_id: String,
    /// Current lifecycle state.
    pub status: TaskStatus,
    /// 0-100, monotonic while `Processing`, reset to 0 on failure.
    pub progress: u8,
    /// Crop spec snapshot taken at task creation.
    pub crop: CropSpec,
    /// Output spec snapshot taken at task creation.
    pub output: OutputSpec,
    /// Human-readable error, set when `Failed`.
    pub error: Option<String>,
    /// Final encoded result, set when `Completed`.
    pub result: Option<EncodedBlob>,
    /// Small preview of the result, set when `Completed`.
    pub preview: Option<EncodedBlob>,
}

impl Task {
    /// Create a fresh `Pending` task snapshotting the current specs.
    pub fn new(id: TaskId, image_id: impl Into<String>, crop: &CropSpec, output: &OutputSpec) -> Self {
        Self {
            id,
            image_id: image_id.into(),
            status: TaskStatus::Pending,
            progress: 0,
            crop: crop.clone(),
            output: output.clone(),
            error: None,
            result: None,
            preview: None,
        }
    }

    /// Record a failure: status, message, progress reset.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = TaskStatus::Failed;
        self.error = Some(message.into());
        self.progress = 0;
        self.result = None;
        self.preview = None;
    }

    /// Attach the final result and mark the task completed.
    pub fn complete(&mut self, result: EncodedBlob, preview: EncodedBlob) {
        self.status = TaskStatus::Completed;
        self.progress = 100;
        self.error = None;
        self.result = Some(result);
        self.preview = Some(preview);
    }

    /// Reset a failed task back to `Pending` for a retry run.
    ///
    /// No-op for any other state; `Completed`/`Cancelled` stay terminal.
    pub fn reset_for_retry(&mut self) {
        if self.status == TaskStatus::Failed {
            self.status = TaskStatus::Pending;
            self.error = None;
            self.progress = 0;
        }
    }
}

/// Aggregate batch state, recomputed on demand and never stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Number of images in the working set.
    pub total_count: usize,
    /// Completed tasks.
    pub completed_count: usize,
    /// Failed tasks.
    pub failed_count: usize,
    /// Tasks currently processing.
    pub processing_count: usize,
    /// Images without a finished task yet.
    pub pending_count: usize,
    /// Total encoded size of the working set, in bytes.
    pub total_size: usize,
    /// Naive completion estimate in seconds, absent when nothing is queued.
    pub estimated_time_secs: Option<u64>,
}

/// Assumed per-image processing time for the naive estimate.
const AVG_PROCESS_TIME_SECS: u64 = 3;

impl BatchSummary {
    /// Compute the summary for the current task list and working set.
    pub fn compute(tasks: &[Task], images: &[ImageRecord]) -> Self {
        let completed_count = count(tasks, TaskStatus::Completed);
        let failed_count = count(tasks, TaskStatus::Failed);
        let processing_count = count(tasks, TaskStatus::Processing);
        let pending_count = images
            .len()
            .saturating_sub(completed_count + failed_count + processing_count);

        let unfinished = (processing_count + pending_count) as u64;
        let estimated_time_secs = (unfinished > 0).then_some(unfinished * AVG_PROCESS_TIME_SECS);

        Self {
            total_count: images.len(),
            completed_count,
            failed_count,
            processing_count,
            pending_count,
            total_size: images.iter().map(ImageRecord::byte_size).sum(),
            estimated_time_secs,
        }
    }
}

fn count(tasks: &[Task], status: TaskStatus) -> usize {
    tasks.iter().filter(|t| t.status == status).count()
}
