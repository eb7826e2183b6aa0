//! Cruxlabel Core Library
//!
//! Labeling and export engine for climbing movement data.
//! A user segments a climbing video into labeled moves, attaches point-in-time
//! sensation tags, and exports one row per frame combining the externally
//! produced pose measurement stream with both annotation layers.
//!
//! The crate contains the durable annotation store, the transient selection
//! session, and the merge/export pipeline. Pose extraction, HTTP transport,
//! and UI rendering live outside this crate and talk to it through the public
//! types in [`core`].

pub mod core;

pub use crate::core::{CoreError, CoreResult};
