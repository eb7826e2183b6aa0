//! Cruxlabel Error Definitions
//!
//! Defines error types used throughout the crate. Every failure is scoped to
//! a single operation; nothing here is fatal to the process.

use thiserror::Error;

use super::Frame;

/// Core engine error types
#[derive(Error, Debug)]
pub enum CoreError {
    // =========================================================================
    // Lookup Errors
    // =========================================================================
    #[error("Not found: {0}")]
    NotFound(String),

    // =========================================================================
    // Boundary Errors
    // =========================================================================
    #[error("Invalid range: {0}")]
    RangeInvalid(String),

    #[error("Frame {frame} outside move range {start}~{end}")]
    FrameOutOfRange {
        frame: Frame,
        start: Frame,
        end: Frame,
    },

    // =========================================================================
    // Vocabulary / Schema Errors
    // =========================================================================
    #[error("Unknown move type: {0}")]
    UnknownMoveType(String),

    #[error("Unknown tag type: {0}")]
    UnknownTagType(String),

    #[error("Unknown body location: {0}")]
    UnknownLocation(String),

    #[error("Contextual data does not match schema for '{move_type}': {detail}")]
    SchemaMismatch { move_type: String, detail: String },

    #[error("Frame tag requires at least one body location")]
    EmptyLocations,

    // =========================================================================
    // Session Errors
    // =========================================================================
    #[error("Invalid session transition: {0}")]
    InvalidTransition(String),

    // =========================================================================
    // Export Errors
    // =========================================================================
    #[error("Pose stream parse error: {0}")]
    ParseError(String),

    #[error("Export I/O error: {0}")]
    ExportIo(String),

    // =========================================================================
    // General Errors
    // =========================================================================
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Core engine result type
pub type CoreResult<T> = Result<T, CoreError>;
