//! Scene data: the fixed geometry and GPU texture wrappers.
//!
//! - `scene` holds the vertex format, the ground/building geometry and the model spin
//! - `texture` contains the GPU texture wrapper and creation utilities

pub mod scene;
pub mod texture;
