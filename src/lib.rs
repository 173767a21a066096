//! skyline
//!
//! A minimal real-time 3D viewer built on wgpu and winit. It shows a fixed
//! scene, a green ground plane with two white box buildings, slowly turning
//! around the vertical axis. A free-fly camera moves with `W`/`A`/`S`/`D` and
//! `Q`/`E`, `L` switches the diffuse texture on and off and `Escape` quits.
//!
//! High-level modules
//! - `app`: winit event loop, input dispatch and the per-frame update
//! - `camera`: camera, controller, projection and camera uniforms
//! - `capture`: off-screen rendering into an image
//! - `clock`: clamped frame timing
//! - `config`: every tunable constant of the viewer
//! - `context`: window-bound GPU state (surface, device, queue)
//! - `data_structures`: the fixed scene geometry and GPU textures
//! - `logging`: `env_logger` set-up
//! - `pipelines`: the render pipeline, uniform layouts and light switch
//! - `render`: the scene renderer that records the draw call
//! - `resources`: loading the texture file

pub mod app;
pub mod camera;
pub mod capture;
pub mod clock;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod logging;
pub mod pipelines;
pub mod render;
pub mod resources;

pub use app::run;
pub use config::Config;
