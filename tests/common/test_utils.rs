use std::path::PathBuf;

use cgmath::{Deg, Point3};
use skyline::{
    Config,
    capture::{headless_device, headless_renderer, render_to_image},
    render::SceneRenderer,
};
use tokio::runtime::Runtime;

pub(crate) const WIDTH: u32 = 320;
pub(crate) const HEIGHT: u32 = 240;

pub(crate) struct Gpu {
    pub(crate) runtime: Runtime,
    pub(crate) device: wgpu::Device,
    pub(crate) queue: wgpu::Queue,
}

impl Gpu {
    pub(crate) fn new() -> Self {
        let runtime = Runtime::new().expect("Failed to start the tokio runtime.");
        let (device, queue) = runtime
            .block_on(headless_device())
            .expect("Integration tests need a GPU adapter.");
        Self {
            runtime,
            device,
            queue,
        }
    }

    pub(crate) fn renderer(&self, config: &Config) -> SceneRenderer {
        self.runtime
            .block_on(headless_renderer(
                &self.device,
                &self.queue,
                config,
                WIDTH,
                HEIGHT,
            ))
            .expect("Failed to build the scene renderer.")
    }

    pub(crate) fn capture(&self, renderer: &SceneRenderer, config: &Config) -> image::RgbaImage {
        self.runtime
            .block_on(render_to_image(
                &self.device,
                &self.queue,
                renderer,
                WIDTH,
                HEIGHT,
                config.clear_colour,
            ))
            .expect("Failed to capture the frame.")
    }
}

/// A camera raised above the scene and tilted down so that the ground, the
/// first building and the sky are all in view.
pub(crate) fn overview_config(texture_path: PathBuf) -> Config {
    Config {
        texture_path,
        clear_colour: wgpu::Color::BLUE,
        camera_position: Point3::new(0.0, 6.0, 8.0),
        camera_pitch: Deg(-35.0),
        ..Default::default()
    }
}

/// Writes a solid-colour PNG to the temp dir and returns its path.
pub(crate) fn solid_png(name: &str, rgba: [u8; 4]) -> PathBuf {
    let path = std::env::temp_dir().join(name);
    image::RgbaImage::from_pixel(4, 4, image::Rgba(rgba))
        .save(&path)
        .expect("Failed to write the test texture.");
    path
}
