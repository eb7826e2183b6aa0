//! Annotations Module
//!
//! Durable annotation state for labeled climbing videos: Video records, Move
//! segments, and point-in-time FrameTags, plus the data-driven label schema
//! they are validated against.

mod models;
mod schema;
mod store;

pub use models::*;
pub use schema::*;
pub use store::AnnotationStore;
