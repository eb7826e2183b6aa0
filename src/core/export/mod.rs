//! Export Module
//!
//! Joins the pose measurement stream with Move and FrameTag annotations into
//! one training-ready row set, and orchestrates writing the artifact to disk.

mod coordinator;
mod merge;

pub use coordinator::{ExportCoordinator, ExportOutcome};
pub use merge::{merge, ExportTable, LABEL_COLUMNS};
