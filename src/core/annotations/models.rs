//! Annotation Data Models
//!
//! Defines the persisted annotation records and the payloads used to create
//! and update them. Persistence lives in the store; these types know nothing
//! about the database.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{frame_to_ms, new_id, Frame, FrameTagId, MoveId, TimeMs, VideoId};

// =============================================================================
// Video
// =============================================================================

/// An uploaded video with its pose extraction output.
///
/// Created only after pose extraction succeeded, so `pose_csv_path` always
/// refers to a stream that existed at creation time. The video *file* may be
/// deleted after a successful export; the record and the pose stream remain
/// the durable source of truth.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: VideoId,
    /// Original upload filename
    pub filename: String,
    /// Path to the video file on disk
    pub path: String,
    /// Path to the raw per-frame measurement stream (CSV)
    pub pose_csv_path: String,
    /// Frame rate, strictly positive
    pub fps: f64,
    /// Total frame count, non-negative
    pub total_frames: Frame,
    /// Total duration in milliseconds
    pub duration_ms: TimeMs,
    pub created_at: DateTime<Utc>,
}

/// Payload for registering a video after pose extraction.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDraft {
    pub filename: String,
    pub path: String,
    pub pose_csv_path: String,
    pub fps: f64,
    pub total_frames: Frame,
}

impl VideoDraft {
    /// Materializes the draft into a record with a fresh id and timestamps.
    ///
    /// Invariants (`fps > 0`, `total_frames >= 0`) are enforced by the store
    /// before this is called.
    pub(crate) fn into_video(self) -> Video {
        let duration_ms = frame_to_ms(self.total_frames, self.fps);
        Video {
            id: new_id(),
            filename: self.filename,
            path: self.path,
            pose_csv_path: self.pose_csv_path,
            fps: self.fps,
            total_frames: self.total_frames,
            duration_ms,
            created_at: Utc::now(),
        }
    }
}

// =============================================================================
// Contextual Answers
// =============================================================================

/// Answer to one move-type-specific contextual question.
///
/// Single-select questions carry one option; multi-select questions carry a
/// set of options. Which shape is allowed for a given key is defined by the
/// label schema.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextualAnswer {
    One(String),
    Many(Vec<String>),
}

impl ContextualAnswer {
    /// Returns every selected option, regardless of answer shape.
    pub fn selected(&self) -> Vec<&str> {
        match self {
            ContextualAnswer::One(v) => vec![v.as_str()],
            ContextualAnswer::Many(vs) => vs.iter().map(String::as_str).collect(),
        }
    }
}

/// Contextual answers keyed by question key, ordered for stable serialization.
pub type ContextualData = BTreeMap<String, ContextualAnswer>;

// =============================================================================
// Move
// =============================================================================

/// Maximum length of a move's free-text description.
pub const MAX_DESCRIPTION_LEN: usize = 2000;

/// A labeled, contiguous frame range representing one discrete movement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Move {
    pub id: MoveId,
    pub video_id: VideoId,
    pub frame_start: Frame,
    pub frame_end: Frame,
    /// Derived: `frame_start / fps * 1000`
    pub timestamp_start_ms: TimeMs,
    /// Derived: `frame_end / fps * 1000`
    pub timestamp_end_ms: TimeMs,
    /// Move type key from the label schema (e.g. "dyno", "static")
    pub move_type: String,
    /// Form quality rating, 1-5
    pub form_quality: i64,
    /// Effort rating, 0-10
    pub effort_level: i64,
    /// Move-type-specific contextual answers
    pub contextual_data: ContextualData,
    /// Technique modifier labels, exported comma-joined
    pub technique_modifiers: Vec<String>,
    /// Free-form quick-tags
    pub tags: Vec<String>,
    pub description: String,
    pub labeled_at: DateTime<Utc>,
    /// Derived: number of FrameTags currently attached
    #[serde(default)]
    pub frame_tag_count: i64,
}

impl Move {
    /// Returns true if this move's inclusive range covers `frame`.
    pub fn contains_frame(&self, frame: Frame) -> bool {
        frame >= self.frame_start && frame <= self.frame_end
    }

    /// Move duration in seconds.
    pub fn duration_seconds(&self) -> f64 {
        (self.timestamp_end_ms - self.timestamp_start_ms) / 1000.0
    }
}

/// Payload for creating a move from a confirmed frame-range selection.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveDraft {
    pub video_id: VideoId,
    pub frame_start: Frame,
    pub frame_end: Frame,
    pub move_type: String,
    pub form_quality: i64,
    pub effort_level: i64,
    #[serde(default)]
    pub contextual_data: ContextualData,
    #[serde(default)]
    pub technique_modifiers: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub description: String,
}

/// Partial update for an existing move. `None` fields are left unchanged.
///
/// A changed frame range does not revalidate existing FrameTags against the
/// new bounds; tags created before the edit keep their frame numbers.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveUpdate {
    pub frame_start: Option<Frame>,
    pub frame_end: Option<Frame>,
    pub move_type: Option<String>,
    pub form_quality: Option<i64>,
    pub effort_level: Option<i64>,
    pub contextual_data: Option<ContextualData>,
    pub technique_modifiers: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub description: Option<String>,
}

impl MoveUpdate {
    /// Returns true when the update changes nothing.
    pub fn is_empty(&self) -> bool {
        self.frame_start.is_none()
            && self.frame_end.is_none()
            && self.move_type.is_none()
            && self.form_quality.is_none()
            && self.effort_level.is_none()
            && self.contextual_data.is_none()
            && self.technique_modifiers.is_none()
            && self.tags.is_none()
            && self.description.is_none()
    }
}

// =============================================================================
// Frame Tag
// =============================================================================

/// A point-in-time annotation attached to one frame within a move.
///
/// Used for precise sensation tracking (pain, instability, weakness) with
/// body locations and an optional intensity level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameTag {
    pub id: FrameTagId,
    pub move_id: MoveId,
    pub frame_number: Frame,
    /// Derived: `frame_number / fps * 1000`
    pub timestamp_ms: TimeMs,
    /// Tag type key from the label schema (e.g. "sharp_pain", "weak")
    pub tag_type: String,
    /// Intensity, 0-10; absent for non-sensation tags
    pub level: Option<i64>,
    /// Body locations from the label schema, never empty
    pub locations: Vec<String>,
    pub note: String,
    pub tagged_at: DateTime<Utc>,
}

/// Payload for creating a frame tag while tagging a specific move.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameTagDraft {
    pub move_id: MoveId,
    pub frame_number: Frame,
    pub tag_type: String,
    #[serde(default)]
    pub level: Option<i64>,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub note: String,
}

// =============================================================================
// Tests
// =============================================================================
