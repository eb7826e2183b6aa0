//! Merge Exporter
//!
//! Pure join of the pose stream with both annotation layers: one output row
//! per stream frame, augmented with the covering Move's label columns and at
//! most one FrameTag's columns. No side effects; identical inputs always
//! produce byte-identical output.
//!
//! Deterministic policies (see DESIGN.md):
//! - Overlapping moves: the move with the smaller `frame_start` covers the
//!   frame; ties break by ascending move id.
//! - Multiple tags on one frame: the earliest by `(tagged_at, id)` is
//!   exported, the rest are dropped (known lossy simplification kept from
//!   the export schema).

use std::collections::HashMap;

use tracing::debug;

use crate::core::annotations::{FrameTag, Move};
use crate::core::pose::{escape_csv_field, PoseStream};
use crate::core::Frame;

/// Label columns appended after the raw measurement columns, in order.
pub const LABEL_COLUMNS: [&str; 9] = [
    "move_id",
    "move_type",
    "form_quality",
    "effort_level",
    "technique_modifiers",
    "tag_type",
    "tag_level",
    "tag_locations",
    "tag_note",
];

// =============================================================================
// Export Table
// =============================================================================

/// Merged output: header plus one row per stream frame, in stream order.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ExportTable {
    /// Renders the table as CSV with a trailing newline.
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        render_row(&mut out, &self.columns);
        for row in &self.rows {
            render_row(&mut out, row);
        }
        out
    }
}

fn render_row(out: &mut String, cells: &[String]) {
    for (i, cell) in cells.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&escape_csv_field(cell));
    }
    out.push('\n');
}

// =============================================================================
// Merge
// =============================================================================

/// Joins a pose stream with the video's moves and frame tags.
pub fn merge(stream: &PoseStream, moves: &[Move], tags: &[FrameTag]) -> ExportTable {
    let move_for_frame = index_moves(moves);
    let tag_for_frame = index_tags(tags);

    let mut columns = stream.columns.clone();
    columns.extend(LABEL_COLUMNS.iter().map(|c| c.to_string()));

    let mut rows = Vec::with_capacity(stream.frames.len());
    for frame in &stream.frames {
        let mut row = frame.cells.clone();

        match move_for_frame.get(&frame.frame_number) {
            Some(mv) => {
                row.push(mv.id.clone());
                row.push(mv.move_type.clone());
                row.push(mv.form_quality.to_string());
                row.push(mv.effort_level.to_string());
                row.push(mv.technique_modifiers.join(","));
            }
            None => row.extend(std::iter::repeat(String::new()).take(5)),
        }

        match tag_for_frame.get(&frame.frame_number) {
            Some(tag) => {
                row.push(tag.tag_type.clone());
                row.push(tag.level.map(|l| l.to_string()).unwrap_or_default());
                row.push(tag.locations.join(","));
                row.push(tag.note.clone());
            }
            None => row.extend(std::iter::repeat(String::new()).take(4)),
        }

        rows.push(row);
    }

    debug!(
        frames = rows.len(),
        moves = moves.len(),
        tags = tags.len(),
        "Merged pose stream with labels"
    );
    ExportTable { columns, rows }
}

/// Maps each frame to its covering move. Moves are visited from the largest
/// `frame_start` to the smallest so that earlier moves overwrite later ones,
/// which makes the smaller `frame_start` (then smaller id) win on overlap.
fn index_moves(moves: &[Move]) -> HashMap<Frame, &Move> {
    let mut sorted: Vec<&Move> = moves.iter().collect();
    sorted.sort_by(|a, b| {
        a.frame_start
            .cmp(&b.frame_start)
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut index = HashMap::new();
    for mv in sorted.into_iter().rev() {
        for frame in mv.frame_start..=mv.frame_end {
            index.insert(frame, mv);
        }
    }
    index
}

/// Maps each frame to the single exported tag: the earliest by
/// `(tagged_at, id)` among all tags on that frame.
fn index_tags(tags: &[FrameTag]) -> HashMap<Frame, &FrameTag> {
    let mut sorted: Vec<&FrameTag> = tags.iter().collect();
    sorted.sort_by(|a, b| {
        a.tagged_at
            .cmp(&b.tagged_at)
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut index = HashMap::new();
    for tag in sorted {
        index.entry(tag.frame_number).or_insert(tag);
    }
    index
}

// =============================================================================
// Tests
// =============================================================================
