//! Application event loop.
//!
//! [`run`] opens the window and drives the viewer with winit's
//! [`ApplicationHandler`]. Each frame follows the same pattern:
//! 1. Collect window/device events (keys, mouse motion, scroll, resize)
//! 2. Tick the [`FrameClock`]
//! 3. Apply camera input and upload the camera and model uniforms
//! 4. Record the single draw call and present

use std::sync::Arc;

use anyhow::Context as _;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::{clock::FrameClock, config::Config, context::Context};

/// What a key press means to the viewer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum KeyAction {
    Exit,
    ToggleLight,
    Camera,
    Ignored,
}

/// The light toggles once per physical press; auto-repeat and releases are
/// ignored. Camera keys are forwarded in both directions so the controller
/// can track what is held.
pub fn classify_key(key: KeyCode, state: ElementState, repeat: bool) -> KeyAction {
    match key {
        KeyCode::Escape if state.is_pressed() => KeyAction::Exit,
        KeyCode::KeyL if state.is_pressed() && !repeat => KeyAction::ToggleLight,
        KeyCode::KeyW
        | KeyCode::KeyA
        | KeyCode::KeyS
        | KeyCode::KeyD
        | KeyCode::KeyQ
        | KeyCode::KeyE => KeyAction::Camera,
        _ => KeyAction::Ignored,
    }
}

/// GPU context plus the per-window bookkeeping of the loop.
#[derive(Debug)]
pub struct AppState {
    pub(crate) ctx: Context,
    clock: FrameClock,
    is_surface_configured: bool,
    mouse_look: bool,
}

impl AppState {
    fn new(ctx: Context) -> Self {
        Self {
            ctx,
            clock: FrameClock::new(),
            is_surface_configured: true,
            mouse_look: false,
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.is_surface_configured = width > 0 && height > 0;
        if self.is_surface_configured {
            self.ctx.resize(width, height);
            self.clock.reset();
        }
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, key: KeyCode, state: ElementState, repeat: bool) {
        match classify_key(key, state, repeat) {
            KeyAction::Exit => {
                log::info!("Escape pressed, exiting");
                event_loop.exit();
            }
            KeyAction::ToggleLight => {
                let on = self.ctx.renderer.light.toggle(&self.ctx.queue);
                log::info!("light {}", if on { "on" } else { "off" });
            }
            KeyAction::Camera => {
                self.ctx
                    .renderer
                    .camera
                    .controller
                    .process_keyboard(key, state);
            }
            KeyAction::Ignored => (),
        }
    }

    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        self.ctx.window.request_redraw();

        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return;
        }

        let frame = self.clock.tick();
        log::trace!("frame {} dt {:?}", frame.frame_index, frame.dt);
        self.ctx
            .renderer
            .update(&self.ctx.queue, frame.dt, frame.elapsed);

        match self.ctx.render() {
            Ok(()) => {}
            // Reconfigure the surface if it's lost or outdated
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = self.ctx.window.inner_size();
                log::warn!("surface lost or outdated, reconfiguring");
                self.resize(size.width, size.height);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Out of GPU memory, exiting");
                event_loop.exit();
            }
            Err(e) => {
                log::warn!("Unable to render, skipping frame: {}", e);
            }
        }
    }
}

pub struct App {
    async_runtime: tokio::runtime::Runtime,
    settings: Config,
    state: Option<AppState>,
    /// Set when start-up fails inside the event loop; returned from [`run`].
    error: Option<anyhow::Error>,
}

impl App {
    pub fn new(settings: Config) -> anyhow::Result<Self> {
        let async_runtime =
            tokio::runtime::Runtime::new().context("starting the async runtime")?;
        Ok(Self {
            async_runtime,
            settings,
            state: None,
            error: None,
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{:#}", error);
        self.error = Some(error);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        let window_attributes = Window::default_attributes()
            .with_title(self.settings.window_title.clone())
            .with_inner_size(PhysicalSize::new(
                self.settings.window_width,
                self.settings.window_height,
            ))
            .with_resizable(self.settings.resizable);

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                self.fail(event_loop, anyhow::Error::new(e).context("creating the window"));
                return;
            }
        };

        let ctx = self
            .async_runtime
            .block_on(Context::new(window, &self.settings));
        match ctx {
            Ok(ctx) => {
                log::info!(
                    "controls: WASD move, Q/E up/down, right-drag look, wheel zoom, L light, Esc quit"
                );
                ctx.window.request_redraw();
                self.state = Some(AppState::new(ctx));
            }
            Err(e) => self.fail(event_loop, e.context("App initialization failed")),
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            if state.mouse_look {
                state.ctx.renderer.camera.controller.handle_mouse(dx, dy);
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::RedrawRequested => state.frame(event_loop),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        repeat,
                        ..
                    },
                ..
            } => state.handle_key(event_loop, key, key_state, repeat),
            WindowEvent::MouseInput {
                state: button_state,
                button: MouseButton::Right,
                ..
            } => state.mouse_look = button_state.is_pressed(),
            WindowEvent::MouseWheel { delta, .. } => {
                state.ctx.renderer.camera.controller.handle_scroll(&delta)
            }
            WindowEvent::Focused(false) => {
                state.ctx.renderer.camera.controller.release_all();
                state.mouse_look = false;
            }
            _ => {}
        }
    }
}

/// Opens the window and blocks until it is closed.
pub fn run(settings: Config) -> anyhow::Result<()> {
    crate::logging::init();

    let event_loop = EventLoop::new().context("creating the event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(settings)?;
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn light_toggles_on_fresh_press_only() {
        assert_eq!(
            classify_key(KeyCode::KeyL, ElementState::Pressed, false),
            KeyAction::ToggleLight
        );
        assert_eq!(
            classify_key(KeyCode::KeyL, ElementState::Pressed, true),
            KeyAction::Ignored
        );
        assert_eq!(
            classify_key(KeyCode::KeyL, ElementState::Released, false),
            KeyAction::Ignored
        );
    }

    #[test]
    fn escape_exits_on_press() {
        assert_eq!(
            classify_key(KeyCode::Escape, ElementState::Pressed, false),
            KeyAction::Exit
        );
        assert_eq!(
            classify_key(KeyCode::Escape, ElementState::Released, false),
            KeyAction::Ignored
        );
    }

    #[test]
    fn movement_keys_reach_the_camera_both_ways() {
        for key in [
            KeyCode::KeyW,
            KeyCode::KeyA,
            KeyCode::KeyS,
            KeyCode::KeyD,
            KeyCode::KeyQ,
            KeyCode::KeyE,
        ] {
            assert_eq!(classify_key(key, ElementState::Pressed, false), KeyAction::Camera);
            assert_eq!(classify_key(key, ElementState::Released, false), KeyAction::Camera);
        }
        assert_eq!(
            classify_key(KeyCode::KeyX, ElementState::Pressed, false),
            KeyAction::Ignored
        );
    }
}
