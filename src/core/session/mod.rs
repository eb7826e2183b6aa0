//! Selection Session
//!
//! Transient, single-video labeling session state: the in-progress frame
//! range selection and the current interaction mode. Modeled as an explicit
//! value object so mode transitions are testable in isolation; nothing here
//! is ever persisted, a session is rebuilt from scratch when a video is
//! opened.

use serde::{Deserialize, Serialize};

use crate::core::{CoreError, CoreResult, Frame, FrameTagId, MoveId, VideoId};

// =============================================================================
// State Types
// =============================================================================

/// Progress of the current frame-range selection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "state")]
pub enum Selection {
    /// No selection in progress
    Idle,
    /// Start frame marked, end not yet chosen
    StartMarked { start: Frame },
    /// Both bounds chosen, `end > start`
    RangeSelected { start: Frame, end: Frame },
    /// Move form open for the selected range
    FormOpen { start: Frame, end: Frame },
}

/// Current interaction mode.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "mode")]
pub enum Mode {
    /// Selecting frame ranges to define new moves
    Define,
    /// Placing frame tags on a specific existing move
    Tagging { move_id: MoveId },
}

// =============================================================================
// Selection Session
// =============================================================================

/// Per-session labeling state for one video.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionSession {
    video_id: VideoId,
    mode: Mode,
    selection: Selection,
    /// Frame tag ids loaded for the move being tagged
    loaded_tags: Vec<FrameTagId>,
}

impl SelectionSession {
    /// Starts a fresh session for a video, in define mode with no selection.
    pub fn new(video_id: impl Into<VideoId>) -> Self {
        Self {
            video_id: video_id.into(),
            mode: Mode::Define,
            selection: Selection::Idle,
            loaded_tags: Vec::new(),
        }
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Returns the selected range once both bounds are chosen.
    pub fn selected_range(&self) -> Option<(Frame, Frame)> {
        match self.selection {
            Selection::RangeSelected { start, end } | Selection::FormOpen { start, end } => {
                Some((start, end))
            }
            _ => None,
        }
    }

    pub fn loaded_tags(&self) -> &[FrameTagId] {
        &self.loaded_tags
    }

    // =========================================================================
    // Selection Transitions
    // =========================================================================

    /// Marks the selection start. Allowed from any state; a prior start or
    /// completed range is discarded.
    pub fn mark_start(&mut self, frame: Frame) {
        self.selection = Selection::StartMarked { start: frame };
    }

    /// Marks the selection end.
    ///
    /// Only valid from `StartMarked`, and only when `frame > start`. A
    /// rejected call leaves the selection unchanged; the end frame is never
    /// clamped to make an invalid range fit.
    pub fn mark_end(&mut self, frame: Frame) -> CoreResult<()> {
        match self.selection {
            Selection::StartMarked { start } => {
                if frame <= start {
                    return Err(CoreError::RangeInvalid(format!(
                        "selection end {frame} must be after start {start}"
                    )));
                }
                self.selection = Selection::RangeSelected { start, end: frame };
                Ok(())
            }
            _ => Err(CoreError::InvalidTransition(
                "cannot mark selection end without a marked start".into(),
            )),
        }
    }

    /// Discards the current selection. Allowed from any state.
    pub fn clear_selection(&mut self) {
        self.selection = Selection::Idle;
    }

    /// Opens the move form for the selected range.
    pub fn open_form(&mut self) -> CoreResult<()> {
        match self.selection {
            Selection::RangeSelected { start, end } => {
                self.selection = Selection::FormOpen { start, end };
                Ok(())
            }
            _ => Err(CoreError::InvalidTransition(
                "move form requires a completed range selection".into(),
            )),
        }
    }

    /// Closes the move form (submit and cancel behave the same for session
    /// state: the selection returns to idle).
    pub fn close_form(&mut self) -> CoreResult<()> {
        match self.selection {
            Selection::FormOpen { .. } => {
                self.selection = Selection::Idle;
                Ok(())
            }
            _ => Err(CoreError::InvalidTransition("no form is open".into())),
        }
    }

    // =========================================================================
    // Mode Transitions
    // =========================================================================

    /// Switches to tagging mode for a concrete move, with its currently
    /// loaded frame tags.
    pub fn enter_tagging(&mut self, move_id: impl Into<MoveId>, loaded_tags: Vec<FrameTagId>) {
        self.mode = Mode::Tagging {
            move_id: move_id.into(),
        };
        self.loaded_tags = loaded_tags;
    }

    /// Returns to define mode, clearing the active move and its loaded tags.
    /// Always permitted.
    pub fn enter_define(&mut self) {
        self.mode = Mode::Define;
        self.loaded_tags.clear();
    }
}

// =============================================================================
// Tests
// =============================================================================
