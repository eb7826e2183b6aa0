//! Pose Measurement Stream
//!
//! Parses the externally produced per-frame pose CSV: a header of stable
//! field names (`frame_number`, `timestamp_ms`, then `angle_*` / `speed_*` /
//! `velocity_*` / `landmark_*` columns), one record per frame. Individual
//! cells may be empty when pose detection missed a frame; parsing keeps the
//! raw cell text untouched so the merge export reproduces it byte for byte.

use crate::core::{CoreError, CoreResult, Frame};

/// Column name carrying the frame index.
pub const FRAME_NUMBER_COLUMN: &str = "frame_number";

// =============================================================================
// Stream Types
// =============================================================================

/// One frame record, cells aligned with the stream's column list.
#[derive(Clone, Debug, PartialEq)]
pub struct PoseFrame {
    pub frame_number: Frame,
    pub cells: Vec<String>,
}

/// A parsed pose measurement stream.
#[derive(Clone, Debug, PartialEq)]
pub struct PoseStream {
    pub columns: Vec<String>,
    pub frames: Vec<PoseFrame>,
}

impl PoseStream {
    /// Parses CSV content into a stream.
    ///
    /// Fails when the header is missing, the `frame_number` column is absent,
    /// or a row's frame number is not an integer. Rows shorter than the
    /// header are padded with empty cells; per-frame empty measurement cells
    /// are preserved as-is.
    pub fn parse(content: &str) -> CoreResult<Self> {
        let mut lines = content.lines();

        let header = lines
            .next()
            .ok_or_else(|| CoreError::ParseError("pose stream is empty".into()))?;
        let columns = split_csv_line(header);

        let frame_col = columns
            .iter()
            .position(|c| c == FRAME_NUMBER_COLUMN)
            .ok_or_else(|| {
                CoreError::ParseError(format!("missing '{FRAME_NUMBER_COLUMN}' column"))
            })?;

        let mut frames = Vec::new();
        for (line_no, line) in lines.enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            let mut cells = split_csv_line(line);
            if cells.len() > columns.len() {
                return Err(CoreError::ParseError(format!(
                    "row {} has {} cells, header has {}",
                    line_no + 2,
                    cells.len(),
                    columns.len()
                )));
            }
            cells.resize(columns.len(), String::new());

            let frame_number: Frame = cells[frame_col].trim().parse().map_err(|_| {
                CoreError::ParseError(format!(
                    "row {}: invalid frame number '{}'",
                    line_no + 2,
                    cells[frame_col]
                ))
            })?;

            frames.push(PoseFrame {
                frame_number,
                cells,
            });
        }

        Ok(Self { columns, frames })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

// =============================================================================
// CSV Primitives
// =============================================================================

/// Splits one CSV line into cells, honoring RFC 4180 quoting (quoted cells
/// may contain commas; doubled quotes escape a literal quote).
pub(crate) fn split_csv_line(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if current.is_empty() => in_quotes = true,
            ',' if !in_quotes => {
                cells.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    cells.push(current);
    cells
}

/// Escapes a cell for CSV output if it contains a delimiter, quote, or
/// newline; plain cells pass through unchanged.
pub(crate) fn escape_csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

// =============================================================================
// Tests
// =============================================================================
