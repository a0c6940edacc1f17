//! The batch processing pipeline: task model and sequential scheduler.
//!
//! A batch run turns a set of working-set images plus one shared
//! crop/output specification into a set of encoded result blobs, with
//! progress tracking, cooperative cancellation, pause/resume, and
//! per-item failure isolation. One failing image never aborts the batch.

mod scheduler;
mod task;

pub use scheduler::{BatchError, BatchScheduler, CancellationToken, ErrorKind};
pub use task::{BatchSummary, Task, TaskId, TaskStatus};
