//! Export Coordinator
//!
//! Runs a full export as one user-facing operation: merge the pose stream
//! with the video's annotations, persist the artifact atomically, then
//! optionally delete the source video file. Partial-failure semantics:
//!
//! - Merge failure aborts before anything is written; the source is untouched.
//! - A failed artifact write leaves no complete-looking file behind.
//! - Deletion failure after a persisted artifact never invalidates the
//!   export; it is logged and reported as a warning on the outcome. The pose
//!   stream and the database records are never deleted here.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::core::annotations::{AnnotationStore, FrameTag};
use crate::core::fs::tmp_path_for;
use crate::core::pose::PoseStream;
use crate::core::{CoreError, CoreResult};

use super::merge::merge;

// =============================================================================
// Outcome
// =============================================================================

/// Result of a completed export.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportOutcome {
    /// Where the artifact was written
    pub export_path: PathBuf,
    /// Data rows in the artifact (excluding the header)
    pub rows_written: usize,
    /// Whether the source video file was removed
    pub source_deleted: bool,
    /// Set when requested deletion failed; the export itself still succeeded
    pub deletion_warning: Option<String>,
}

// =============================================================================
// Export Coordinator
// =============================================================================

/// Orchestrates merge, artifact persistence, and optional source deletion.
pub struct ExportCoordinator {
    exports_dir: PathBuf,
}

impl ExportCoordinator {
    pub fn new(exports_dir: impl Into<PathBuf>) -> Self {
        Self {
            exports_dir: exports_dir.into(),
        }
    }

    /// Deterministic artifact location for a video.
    pub fn export_path_for(&self, video_id: &str) -> PathBuf {
        self.exports_dir.join(format!("{video_id}_labeled.csv"))
    }

    /// Exports one video.
    ///
    /// The store is read once up front, so the merge sees a consistent
    /// snapshot of moves and tags; no store mutation happens while the
    /// export is running (single-writer session model).
    pub async fn export_video(
        &self,
        store: &AnnotationStore,
        video_id: &str,
        delete_source: bool,
    ) -> CoreResult<ExportOutcome> {
        let video = store.get_video(video_id)?;
        let moves = store.list_moves(video_id)?;
        let mut tags: Vec<FrameTag> = Vec::new();
        for mv in &moves {
            tags.extend(store.list_frame_tags(&mv.id)?);
        }

        let content = tokio::fs::read_to_string(&video.pose_csv_path)
            .await
            .map_err(|e| {
                CoreError::ExportIo(format!(
                    "failed to read pose stream {}: {e}",
                    video.pose_csv_path
                ))
            })?;
        let stream = PoseStream::parse(&content)?;

        if stream.len() as i64 != video.total_frames {
            warn!(
                video_id,
                stream_frames = stream.len(),
                total_frames = video.total_frames,
                "Pose stream length differs from video frame count"
            );
        }

        let table = merge(&stream, &moves, &tags);
        let rows_written = table.rows.len();

        let export_path = self.export_path_for(video_id);
        self.write_artifact(&export_path, table.to_csv().as_bytes())
            .await?;

        info!(
            video_id,
            rows = rows_written,
            path = %export_path.display(),
            "Export artifact written"
        );

        let (source_deleted, deletion_warning) = if delete_source {
            delete_source_file(video_id, &video.path).await
        } else {
            (false, None)
        };

        Ok(ExportOutcome {
            export_path,
            rows_written,
            source_deleted,
            deletion_warning,
        })
    }

    /// Writes the artifact via a temp file and rename, so an interrupted
    /// export never leaves a complete-looking file at the final path.
    async fn write_artifact(&self, path: &Path, bytes: &[u8]) -> CoreResult<()> {
        tokio::fs::create_dir_all(&self.exports_dir)
            .await
            .map_err(|e| {
                CoreError::ExportIo(format!(
                    "failed to create exports directory {}: {e}",
                    self.exports_dir.display()
                ))
            })?;

        let tmp_path = tmp_path_for(path);
        if let Err(e) = tokio::fs::write(&tmp_path, bytes).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(CoreError::ExportIo(format!(
                "failed to write export artifact {}: {e}",
                path.display()
            )));
        }
        if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(CoreError::ExportIo(format!(
                "failed to finalize export artifact {}: {e}",
                path.display()
            )));
        }
        Ok(())
    }
}

/// Removes the source video file after a successful export. Failure is
/// reported, never fatal; an already-missing file is nothing to delete.
async fn delete_source_file(video_id: &str, path: &str) -> (bool, Option<String>) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            info!(video_id, path, "Deleted source video file");
            (true, None)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => (false, None),
        Err(e) => {
            let message = format!("failed to delete source video {path}: {e}");
            warn!(video_id, %message, "Source deletion failed after successful export");
            (false, Some(message))
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
