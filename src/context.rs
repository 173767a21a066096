use std::{iter, sync::Arc};

use anyhow::Context as _;
use winit::window::Window;

use crate::{
    camera::{Camera, CameraController, CameraResources, Projection},
    config::Config,
    data_structures::texture::Texture,
    pipelines::light::{LightResources, LightSwitch},
    render::SceneRenderer,
    resources::texture::load_texture_or_fallback,
};

/// Window-bound GPU state: surface, device, queue and the scene renderer.
#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub(crate) depth_texture: Texture,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub renderer: SceneRenderer,
    pub clear_colour: wgpu::Color,
}

impl Context {
    pub async fn new(window: Arc<Window>, settings: &Config) -> anyhow::Result<Self> {
        let size = window.inner_size();

        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("creating the window surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no GPU adapter can present to this window")?;
        log::info!("using adapter {:?}", adapter.get_info().name);

        let (device, queue) = request_device(&adapter).await?;

        let surface_caps = surface.get_capabilities(&adapter);
        // The shader writes linear colour; an sRGB surface does the encoding.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("the surface reports no supported formats")?;
        let present_mode = surface_caps
            .present_modes
            .first()
            .copied()
            .unwrap_or(wgpu::PresentMode::Fifo);
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture =
            Texture::create_depth_texture(&device, [config.width, config.height], "depth_texture");

        let diffuse = load_texture_or_fallback(&settings.texture_path, &device, &queue).await;
        let renderer = build_renderer(&device, config.format, diffuse, settings, [config.width, config.height])?;

        Ok(Self {
            window,
            depth_texture,
            surface,
            device,
            queue,
            config,
            renderer,
            clear_colour: settings.clear_colour,
        })
    }

    /// Zero-sized requests (minimised windows) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            Texture::create_depth_texture(&self.device, [width, height], "depth_texture");
        self.renderer.camera.projection.resize(width, height);
        log::debug!("surface resized to {}x{}", width, height);
    }

    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        self.renderer
            .draw(&mut encoder, &view, &self.depth_texture.view, self.clear_colour);
        self.queue.submit(iter::once(encoder.finish()));

        self.window.pre_present_notify();
        output.present();
        Ok(())
    }
}

pub(crate) async fn request_device(adapter: &wgpu::Adapter) -> anyhow::Result<(wgpu::Device, wgpu::Queue)> {
    adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits()),
            memory_hints: Default::default(),
            trace: wgpu::Trace::Off,
            experimental_features: wgpu::ExperimentalFeatures::disabled(),
        })
        .await
        .context("requesting a GPU device")
}

/// Camera, light and renderer wiring shared by the window and headless paths.
pub(crate) fn build_renderer(
    device: &wgpu::Device,
    color_format: wgpu::TextureFormat,
    diffuse: Texture,
    settings: &Config,
    [width, height]: [u32; 2],
) -> anyhow::Result<SceneRenderer> {
    let camera = Camera::new(
        settings.camera_position,
        settings.camera_yaw,
        settings.camera_pitch,
    );
    let projection = Projection::new(width, height, settings.fovy, settings.znear, settings.zfar);
    let controller = CameraController::new(settings.movement_speed, settings.mouse_sensitivity);
    let camera = CameraResources::new(device, camera, projection, controller);
    let light = LightResources::new(device, LightSwitch::new(settings.light_on));

    SceneRenderer::new(device, color_format, diffuse, camera, light, settings.spin_rate)
}
