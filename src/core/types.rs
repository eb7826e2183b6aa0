//! Cruxlabel Core Type Definitions
//!
//! Defines fundamental types used throughout the crate.

// =============================================================================
// ID Types
// =============================================================================

/// Video unique identifier (ULID)
pub type VideoId = String;

/// Move unique identifier (ULID)
pub type MoveId = String;

/// Frame tag unique identifier (ULID)
pub type FrameTagId = String;

/// Generates a new ULID-based identifier
pub fn new_id() -> String {
    ulid::Ulid::new().to_string()
}

// =============================================================================
// Time Types
// =============================================================================

/// Time in milliseconds (floating point)
pub type TimeMs = f64;

/// Time in frames (integer)
pub type Frame = i64;

/// Converts a frame number to a millisecond timestamp at the given frame rate.
///
/// Callers must ensure `fps > 0`; the annotation store rejects videos with a
/// non-positive frame rate at creation time.
pub fn frame_to_ms(frame: Frame, fps: f64) -> TimeMs {
    frame as f64 / fps * 1000.0
}

// =============================================================================
// Tests
// =============================================================================
