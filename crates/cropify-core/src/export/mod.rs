//! Export assembly: deterministic filenames and archive packaging.
//!
//! Consumes completed tasks and produces either per-file entries (the
//! browser triggers one download per entry, spacing them by
//! [`DOWNLOAD_DELAY_MS`] so rapid-fire downloads are not throttled away)
//! or a single zip archive holding every result under its derived name.

use std::io::{Cursor, Write};

use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::batch::{Task, TaskStatus};
use crate::decode::ImageRecord;
use crate::OutputSpec;

/// Delay between sequential single-file downloads, in milliseconds.
/// Browsers block rapid-fire download triggers; the embedder waits this
/// long between entries.
pub const DOWNLOAD_DELAY_MS: u32 = 500;

/// Errors from export assembly.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Writing the archive failed. There is no partial-archive recovery;
    /// the caller may retry the whole operation.
    #[error("Archive creation failed: {0}")]
    ArchiveFailed(String),

    /// No completed tasks were available to export.
    #[error("Nothing to export: no completed tasks")]
    NothingToExport,
}

/// One exportable result: a derived filename plus the encoded bytes.
#[derive(Debug, Clone)]
pub struct ExportEntry {
    /// Derived output filename, unique within the batch.
    pub filename: String,
    /// Encoded result bytes.
    pub bytes: Vec<u8>,
}

/// Derive the output filename for one task.
///
/// In preserve mode the source extension is stripped and replaced with
/// the target format's. Otherwise the name is synthesized as
/// `prefix + "image_" + zero-padded sequence + suffix + "." + ext`; the
/// sequence number makes synthesized names pairwise distinct within a
/// batch even when source names collide.
pub fn derive_filename(original_name: &str, index: usize, spec: &OutputSpec) -> String {
    let ext = spec.format.extension();

    if spec.maintain_original_name {
        let stem = match original_name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => original_name,
        };
        return format!("{stem}.{ext}");
    }

    format!(
        "{}image_{:03}{}.{}",
        spec.filename_prefix,
        index + 1,
        spec.filename_suffix,
        ext
    )
}

/// Collect export entries from the completed tasks, in task order.
///
/// Tasks in any other state are skipped; partial success is an expected
/// outcome and the completed subset is always exportable. Sequence
/// numbers count the exported entries, so a skipped task never leaves a
/// gap in synthesized names. Source names are resolved by image id at
/// call time.
pub fn collect_entries(
    tasks: &[Task],
    images: &[ImageRecord],
    spec: &OutputSpec,
) -> Vec<ExportEntry> {
    tasks
        .iter()
        .filter(|task| task.status == TaskStatus::Completed)
        .enumerate()
        .filter_map(|(index, task)| {
            let result = task.result.as_ref()?;
            let original_name = images
                .iter()
                .find(|img| img.id == task.image_id)
                .map(|img| img.name.as_str())
                .unwrap_or("image");
            Some(ExportEntry {
                filename: derive_filename(original_name, index, spec),
                bytes: result.bytes.clone(),
            })
        })
        .collect()
}

/// Package entries into a single zip archive in memory.
///
/// Pure aggregation: every entry is written under its derived name and
/// the archive is finalized. Entries come from already-completed tasks,
/// so there is no per-entry error recovery; any write failure fails the
/// archive wholesale.
pub fn build_archive(entries: &[ExportEntry]) -> Result<Vec<u8>, ExportError> {
    if entries.is_empty() {
        return Err(ExportError::NothingToExport);
    }

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(6));

    for entry in entries {
        writer
            .start_file(&entry.filename, options)
            .map_err(|e| ExportError::ArchiveFailed(e.to_string()))?;
        writer
            .write_all(&entry.bytes)
            .map_err(|e| ExportError::ArchiveFailed(e.to_string()))?;
    }

    let cursor = writer
        .finish()
        .map_err(|e| ExportError::ArchiveFailed(e.to_string()))?;
    Ok(cursor.into_inner())
}

/// Name for the batch archive; the embedder supplies the date string
/// (e.g. `2026-08-30`) so the core stays clock-free.
pub fn archive_filename(date: &str) -> String {
    format!("cropify_batch_{date}.zip")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::TaskId;
    use crate::encode::EncodedBlob;
    use crate::{CropSpec, OutputFormat};

    fn completed_task(id: u64, image_id: &str) -> Task {
        let mut task = Task::new(
            TaskId(id),
            image_id,
            &CropSpec::new(0, 0, 4, 4),
            &OutputSpec::default(),
        );
        task.complete(
            EncodedBlob {
                bytes: vec![id as u8; 8],
                format: OutputFormat::Jpeg,
            },
            EncodedBlob {
                bytes: vec![0u8; 2],
                format: OutputFormat::Jpeg,
            },
        );
        task
    }

    fn record(id: &str, name: &str) -> ImageRecord {
        ImageRecord {
            id: id.to_string(),
            name: name.to_string(),
            bytes: Vec::new(),
            mime: "image/png".to_string(),
            width: 4,
            height: 4,
        }
    }

    #[test]
    fn test_preserve_original_name() {
        let spec = OutputSpec {
            format: OutputFormat::WebP,
            maintain_original_name: true,
            ..Default::default()
        };
        assert_eq!(derive_filename("holiday.photo.jpg", 0, &spec), "holiday.photo.webp");
        assert_eq!(derive_filename("scan", 0, &spec), "scan.webp");
        // A leading dot is not an extension separator
        assert_eq!(derive_filename(".hidden", 0, &spec), ".hidden.webp");
    }

    #[test]
    fn test_synthesized_name() {
        let spec = OutputSpec {
            format: OutputFormat::Jpeg,
            filename_prefix: "crop_".to_string(),
            filename_suffix: "_v2".to_string(),
            ..Default::default()
        };
        assert_eq!(derive_filename("whatever.png", 0, &spec), "crop_image_001_v2.jpg");
        assert_eq!(derive_filename("whatever.png", 41, &spec), "crop_image_042_v2.jpg");
    }

    #[test]
    fn test_synthesized_names_unique_despite_collisions() {
        let spec = OutputSpec::default();
        let names: Vec<_> = (0..20).map(|i| derive_filename("same.jpg", i, &spec)).collect();
        let mut deduped = names.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), names.len());
    }

    #[test]
    fn test_collect_entries_skips_incomplete() {
        let images = vec![record("a", "a.png"), record("b", "b.png")];
        let mut failed = Task::new(
            TaskId(2),
            "b",
            &CropSpec::new(0, 0, 4, 4),
            &OutputSpec::default(),
        );
        failed.fail("boom");
        let tasks = vec![completed_task(1, "a"), failed];

        let entries = collect_entries(&tasks, &images, &OutputSpec::default());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].filename, "image_001.jpg");
    }

    #[test]
    fn test_synthesized_numbering_contiguous_across_failures() {
        // A failed task in the middle must not leave a gap in the
        // exported sequence numbers
        let images = vec![
            record("a", "a.png"),
            record("b", "b.png"),
            record("c", "c.png"),
        ];
        let mut failed = Task::new(
            TaskId(2),
            "b",
            &CropSpec::new(0, 0, 4, 4),
            &OutputSpec::default(),
        );
        failed.fail("boom");
        let tasks = vec![completed_task(1, "a"), failed, completed_task(3, "c")];

        let entries = collect_entries(&tasks, &images, &OutputSpec::default());
        let names: Vec<_> = entries.iter().map(|e| e.filename.as_str()).collect();
        assert_eq!(names, vec!["image_001.jpg", "image_002.jpg"]);
    }

    #[test]
    fn test_collect_entries_resolves_names_by_id() {
        let images = vec![record("x", "포토.png")];
        let spec = OutputSpec {
            maintain_original_name: true,
            format: OutputFormat::Png,
            ..Default::default()
        };
        let entries = collect_entries(&[completed_task(1, "x")], &images, &spec);
        assert_eq!(entries[0].filename, "포토.png");
    }

    #[test]
    fn test_build_archive_round_trip() {
        let entries = vec![
            ExportEntry {
                filename: "image_001.jpg".to_string(),
                bytes: vec![1, 2, 3],
            },
            ExportEntry {
                filename: "image_002.jpg".to_string(),
                bytes: vec![4, 5, 6, 7],
            },
        ];
        let bytes = build_archive(&entries).unwrap();
        // Zip local-file-header magic
        assert_eq!(&bytes[0..4], &[0x50, 0x4B, 0x03, 0x04]);

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 2);
        let mut names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["image_001.jpg", "image_002.jpg"]);
    }

    #[test]
    fn test_build_archive_empty_fails() {
        let err = build_archive(&[]).unwrap_err();
        assert!(matches!(err, ExportError::NothingToExport));
    }

    #[test]
    fn test_archive_filename() {
        assert_eq!(archive_filename("2026-08-30"), "cropify_batch_2026-08-30.zip");
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
