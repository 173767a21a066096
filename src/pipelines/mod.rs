//! Render pipeline construction.
//!
//! - `scene` builds the single textured pipeline and the uniform layouts it binds
//! - `light` owns the light switch and its uniform

pub mod light;
pub mod scene;
