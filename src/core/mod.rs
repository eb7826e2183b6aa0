//! Cruxlabel Core Engine
//!
//! Core labeling engine module.
//! Handles annotation storage, selection session state, pose stream parsing,
//! and merge export.

pub mod annotations;
pub mod export;
pub mod fs;
pub mod pose;
pub mod session;
pub mod settings;

// Re-export common types
mod types;
pub use types::*;

mod error;
pub use error::*;
