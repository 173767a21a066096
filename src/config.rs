//! Runtime configuration.
//!
//! Every tunable constant of the viewer lives in [`Config`]. The `Default`
//! implementation describes the stock scene: an 800x600 window, a camera five
//! units back from the origin looking down -Z and the light switched on.

use std::path::PathBuf;

use cgmath::{Deg, Point3};

/// Viewer settings consumed by [`crate::app::run`] and [`crate::context::Context`].
#[derive(Debug, Clone)]
pub struct Config {
    pub window_width: u32,
    pub window_height: u32,
    pub window_title: String,
    pub resizable: bool,
    /// Diffuse texture, resolved relative to the working directory.
    pub texture_path: PathBuf,
    pub clear_colour: wgpu::Color,
    pub camera_position: Point3<f32>,
    pub camera_yaw: Deg<f32>,
    pub camera_pitch: Deg<f32>,
    /// Units per second.
    pub movement_speed: f32,
    /// Degrees per pixel of mouse motion.
    pub mouse_sensitivity: f32,
    pub fovy: Deg<f32>,
    pub znear: f32,
    pub zfar: f32,
    /// Rotation of the whole scene around +Y, in degrees per second.
    pub spin_rate: Deg<f32>,
    pub light_on: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window_width: 800,
            window_height: 600,
            window_title: "Skyline: ground plane with buildings".to_string(),
            resizable: false,
            texture_path: PathBuf::from("res_wall_01_color.jpg"),
            clear_colour: wgpu::Color::BLACK,
            camera_position: Point3::new(0.0, 0.0, 5.0),
            camera_yaw: Deg(-90.0),
            camera_pitch: Deg(0.0),
            movement_speed: 2.5,
            mouse_sensitivity: 0.1,
            fovy: Deg(45.0),
            znear: 0.1,
            zfar: 100.0,
            spin_rate: Deg(50.0),
            light_on: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_stock_scene() {
        let config = Config::default();
        assert_eq!((config.window_width, config.window_height), (800, 600));
        assert_eq!(config.texture_path, PathBuf::from("res_wall_01_color.jpg"));
        assert_eq!(config.camera_position, Point3::new(0.0, 0.0, 5.0));
        assert_eq!(config.camera_yaw, Deg(-90.0));
        assert_eq!(config.movement_speed, 2.5);
        assert!(config.light_on);
    }
}
