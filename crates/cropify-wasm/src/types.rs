//! JS-friendly snapshot types.
//!
//! The scheduler's tasks own large result blobs; handing the whole task
//! list across the boundary on every render would copy megabytes. These
//! snapshots carry only what the UI needs to paint; blob bytes are
//! fetched individually via `JsBatchScheduler::result_bytes`.

use cropify_core::batch::{Task, TaskStatus};
use cropify_core::decode::ImageRecord;
use serde::{Deserialize, Serialize};

/// Lightweight view of one task for UI rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSnapshot {
    /// Task id; pass back to fetch result bytes.
    pub id: u64,
    /// Owning image id in the working set.
    pub image_id: String,
    /// Lifecycle state.
    pub status: TaskStatus,
    /// 0-100.
    pub progress: u8,
    /// Human-readable failure message, if failed.
    pub error: Option<String>,
    /// Encoded result size in bytes, once completed.
    pub result_size: Option<usize>,
}

impl From<&Task> for TaskSnapshot {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.0,
            image_id: task.image_id.clone(),
            status: task.status,
            progress: task.progress,
            error: task.error.clone(),
            result_size: task.result.as_ref().map(|r| r.byte_size()),
        }
    }
}

/// Metadata for a successfully ingested image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageMeta {
    /// Caller-assigned id.
    pub id: String,
    /// Original filename.
    pub name: String,
    /// Declared MIME type.
    pub mime: String,
    /// Intrinsic pixel width.
    pub width: u32,
    /// Intrinsic pixel height.
    pub height: u32,
    /// Encoded size in bytes.
    pub size: usize,
}

impl From<&ImageRecord> for ImageMeta {
    fn from(record: &ImageRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            mime: record.mime.clone(),
            width: record.width,
            height: record.height,
            size: record.byte_size(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cropify_core::batch::TaskId;
    use cropify_core::{CropSpec, OutputSpec};

    #[test]
    fn test_task_snapshot_carries_no_blob() {
        let task = Task::new(
            TaskId(7),
            "img-7",
            &CropSpec::new(0, 0, 10, 10),
            &OutputSpec::default(),
        );
        let snap = TaskSnapshot::from(&task);
        assert_eq!(snap.id, 7);
        assert_eq!(snap.status, TaskStatus::Pending);
        assert_eq!(snap.result_size, None);
    }
}
