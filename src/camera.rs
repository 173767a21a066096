//! Free-fly camera.
//!
//! [`Camera`] stores a position plus yaw/pitch angles and keeps the derived
//! `front`, `right` and `up` vectors orthonormal. [`CameraController`]
//! collects keyboard, mouse and scroll input between frames and applies it in
//! [`CameraController::update`]. [`Projection`] owns the perspective settings
//! and [`CameraResources`] the GPU side of the camera.

use std::time::Duration;

use cgmath::{Deg, InnerSpace, Matrix4, Point3, Rad, Vector3, perspective};
use wgpu::util::DeviceExt;
use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, MouseScrollDelta},
    keyboard::KeyCode,
};

use crate::pipelines::scene::{mk_uniform_bind_group, mk_uniform_layout};

/// wgpu clip space has z in [0, 1] while cgmath produces OpenGL's [-1, 1].
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Pitch never reaches +-90 degrees, otherwise `front` becomes parallel to
/// the world up vector and the basis collapses.
pub const MAX_PITCH: Deg<f32> = Deg(89.0);

pub const MIN_FOVY: Deg<f32> = Deg(1.0);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Point3<f32>,
    yaw: Rad<f32>,
    pitch: Rad<f32>,
    world_up: Vector3<f32>,
    front: Vector3<f32>,
    right: Vector3<f32>,
    up: Vector3<f32>,
}

impl Camera {
    /// Creates a camera with +Y as world up.
    ///
    /// A yaw of -90 degrees looks down -Z.
    pub fn new<V: Into<Point3<f32>>, Y: Into<Rad<f32>>, P: Into<Rad<f32>>>(
        position: V,
        yaw: Y,
        pitch: P,
    ) -> Self {
        Self::with_world_up(position, yaw, pitch, Vector3::unit_y())
    }

    pub fn with_world_up<V: Into<Point3<f32>>, Y: Into<Rad<f32>>, P: Into<Rad<f32>>>(
        position: V,
        yaw: Y,
        pitch: P,
        world_up: Vector3<f32>,
    ) -> Self {
        let mut camera = Self {
            position: position.into(),
            yaw: yaw.into(),
            pitch: clamp_pitch(pitch.into()),
            world_up: world_up.normalize(),
            front: -Vector3::unit_z(),
            right: Vector3::unit_x(),
            up: Vector3::unit_y(),
        };
        camera.update_vectors();
        camera
    }

    pub fn yaw(&self) -> Rad<f32> {
        self.yaw
    }

    pub fn pitch(&self) -> Rad<f32> {
        self.pitch
    }

    pub fn front(&self) -> Vector3<f32> {
        self.front
    }

    pub fn right(&self) -> Vector3<f32> {
        self.right
    }

    pub fn up(&self) -> Vector3<f32> {
        self.up
    }

    /// Replaces both angles; pitch is clamped to [`MAX_PITCH`].
    pub fn set_orientation<Y: Into<Rad<f32>>, P: Into<Rad<f32>>>(&mut self, yaw: Y, pitch: P) {
        self.yaw = yaw.into();
        self.pitch = clamp_pitch(pitch.into());
        self.update_vectors();
    }

    pub fn rotate<Y: Into<Rad<f32>>, P: Into<Rad<f32>>>(&mut self, dyaw: Y, dpitch: P) {
        let yaw = self.yaw + dyaw.into();
        let pitch = self.pitch + dpitch.into();
        self.set_orientation(yaw, pitch);
    }

    /// Moves along the camera's own basis. `Up`/`Down` follow the camera up
    /// vector, not the world one.
    pub fn translate(&mut self, direction: Direction, distance: f32) {
        let offset = match direction {
            Direction::Forward => self.front,
            Direction::Backward => -self.front,
            Direction::Left => -self.right,
            Direction::Right => self.right,
            Direction::Up => self.up,
            Direction::Down => -self.up,
        };
        self.position += offset * distance;
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_to_rh(self.position, self.front, self.up)
    }

    fn update_vectors(&mut self) {
        let (sin_yaw, cos_yaw) = self.yaw.0.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.0.sin_cos();
        self.front = Vector3::new(cos_yaw * cos_pitch, sin_pitch, sin_yaw * cos_pitch).normalize();
        self.right = self.front.cross(self.world_up).normalize();
        self.up = self.right.cross(self.front).normalize();
    }
}

fn clamp_pitch(pitch: Rad<f32>) -> Rad<f32> {
    let max: Rad<f32> = MAX_PITCH.into();
    Rad(pitch.0.clamp(-max.0, max.0))
}

#[derive(Debug, Clone)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    max_fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    /// The initial `fovy` doubles as the upper bound for zooming out.
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        let fovy = fovy.into();
        Self {
            aspect: width as f32 / height.max(1) as f32,
            fovy,
            max_fovy: fovy,
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn fovy(&self) -> Deg<f32> {
        self.fovy.into()
    }

    /// Narrows the field of view by `degrees` (negative widens it).
    pub fn zoom(&mut self, degrees: f32) {
        let min: Rad<f32> = MIN_FOVY.into();
        let fovy = (self.fovy - Rad::from(Deg(degrees))).0;
        self.fovy = Rad(fovy.clamp(min.0, self.max_fovy.0.max(min.0)));
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

#[derive(Debug)]
pub struct CameraController {
    amount_forward: f32,
    amount_backward: f32,
    amount_left: f32,
    amount_right: f32,
    amount_up: f32,
    amount_down: f32,
    rotate_horizontal: f32,
    rotate_vertical: f32,
    scroll: f32,
    speed: f32,
    sensitivity: f32,
}

impl CameraController {
    /// `speed` is in units per second, `sensitivity` in degrees per pixel.
    pub fn new(speed: f32, sensitivity: f32) -> Self {
        Self {
            amount_forward: 0.0,
            amount_backward: 0.0,
            amount_left: 0.0,
            amount_right: 0.0,
            amount_up: 0.0,
            amount_down: 0.0,
            rotate_horizontal: 0.0,
            rotate_vertical: 0.0,
            scroll: 0.0,
            speed,
            sensitivity,
        }
    }

    /// Returns whether the key drives the camera.
    pub fn process_keyboard(&mut self, key: KeyCode, state: ElementState) -> bool {
        let amount = if state.is_pressed() { 1.0 } else { 0.0 };
        match key {
            KeyCode::KeyW => self.amount_forward = amount,
            KeyCode::KeyS => self.amount_backward = amount,
            KeyCode::KeyA => self.amount_left = amount,
            KeyCode::KeyD => self.amount_right = amount,
            KeyCode::KeyQ => self.amount_up = amount,
            KeyCode::KeyE => self.amount_down = amount,
            _ => return false,
        }
        true
    }

    pub fn handle_mouse(&mut self, dx: f64, dy: f64) {
        self.rotate_horizontal += dx as f32;
        self.rotate_vertical += dy as f32;
    }

    pub fn handle_scroll(&mut self, delta: &MouseScrollDelta) {
        self.scroll += match delta {
            MouseScrollDelta::LineDelta(_, lines) => *lines,
            MouseScrollDelta::PixelDelta(PhysicalPosition { y, .. }) => *y as f32 / 20.0,
        };
    }

    /// Drops held keys, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        self.amount_forward = 0.0;
        self.amount_backward = 0.0;
        self.amount_left = 0.0;
        self.amount_right = 0.0;
        self.amount_up = 0.0;
        self.amount_down = 0.0;
    }

    pub fn update(&mut self, camera: &mut Camera, projection: &mut Projection, dt: Duration) {
        let velocity = self.speed * dt.as_secs_f32();

        camera.translate(Direction::Forward, self.amount_forward * velocity);
        camera.translate(Direction::Backward, self.amount_backward * velocity);
        camera.translate(Direction::Left, self.amount_left * velocity);
        camera.translate(Direction::Right, self.amount_right * velocity);
        camera.translate(Direction::Up, self.amount_up * velocity);
        camera.translate(Direction::Down, self.amount_down * velocity);

        if self.rotate_horizontal != 0.0 || self.rotate_vertical != 0.0 {
            // Screen y grows downwards, so dragging down looks down.
            camera.rotate(
                Deg(self.rotate_horizontal * self.sensitivity),
                Deg(-self.rotate_vertical * self.sensitivity),
            );
            self.rotate_horizontal = 0.0;
            self.rotate_vertical = 0.0;
        }

        if self.scroll != 0.0 {
            projection.zoom(self.scroll);
            self.scroll = 0.0;
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
    }

    pub fn view_proj(&self) -> Matrix4<f32> {
        self.view_proj.into()
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Camera state together with its uniform buffer and bind group.
#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub projection: Projection,
    pub controller: CameraController,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    pub fn new(
        device: &wgpu::Device,
        camera: Camera,
        projection: Projection,
        controller: CameraController,
    ) -> Self {
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(&camera, &projection);

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout =
            mk_uniform_layout(device, wgpu::ShaderStages::VERTEX, "camera_bind_group_layout");
        let bind_group = mk_uniform_bind_group(device, &bind_group_layout, &buffer, "camera_bind_group");

        Self {
            camera,
            projection,
            controller,
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    /// Applies pending input and uploads the new view-projection matrix.
    pub fn update(&mut self, queue: &wgpu::Queue, dt: Duration) {
        self.controller
            .update(&mut self.camera, &mut self.projection, dt);
        self.write(queue);
    }

    pub fn write(&mut self, queue: &wgpu::Queue) {
        self.uniform
            .update_view_proj(&self.camera, &self.projection);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn assert_orthonormal(camera: &Camera) {
        let (f, r, u) = (camera.front(), camera.right(), camera.up());
        for v in [f, r, u] {
            assert!((v.magnitude() - 1.0).abs() < EPS, "{v:?} is not unit length");
        }
        assert!(f.dot(r).abs() < EPS);
        assert!(f.dot(u).abs() < EPS);
        assert!(r.dot(u).abs() < EPS);
    }

    fn approx(a: Vector3<f32>, b: Vector3<f32>) -> bool {
        (a - b).magnitude() < EPS
    }

    fn stock_camera() -> Camera {
        Camera::new((0.0, 0.0, 5.0), Deg(-90.0), Deg(0.0))
    }

    #[test]
    fn stock_camera_looks_down_negative_z() {
        let camera = stock_camera();
        assert!(approx(camera.front(), Vector3::new(0.0, 0.0, -1.0)));
        assert!(approx(camera.right(), Vector3::new(1.0, 0.0, 0.0)));
        assert!(approx(camera.up(), Vector3::new(0.0, 1.0, 0.0)));
        assert_orthonormal(&camera);
    }

    #[test]
    fn basis_stays_orthonormal_for_arbitrary_angles() {
        let mut camera = stock_camera();
        for step in 0..72 {
            let yaw = Deg(step as f32 * 17.0);
            let pitch = Deg(step as f32 * 7.0 - 250.0);
            camera.set_orientation(yaw, pitch);
            assert_orthonormal(&camera);
        }
    }

    #[test]
    fn pitch_is_clamped() {
        let mut camera = stock_camera();
        camera.rotate(Deg(0.0), Deg(120.0));
        assert!((Deg::from(camera.pitch()).0 - MAX_PITCH.0).abs() < 1e-3);
        camera.rotate(Deg(0.0), Deg(-400.0));
        assert!((Deg::from(camera.pitch()).0 + MAX_PITCH.0).abs() < 1e-3);
        assert_orthonormal(&camera);
    }

    #[test]
    fn translate_follows_each_axis() {
        let cases = [
            (Direction::Forward, Vector3::new(0.0, 0.0, 3.0)),
            (Direction::Backward, Vector3::new(0.0, 0.0, 7.0)),
            (Direction::Left, Vector3::new(-2.0, 0.0, 5.0)),
            (Direction::Right, Vector3::new(2.0, 0.0, 5.0)),
            (Direction::Up, Vector3::new(0.0, 2.0, 5.0)),
            (Direction::Down, Vector3::new(0.0, -2.0, 5.0)),
        ];
        for (direction, expected) in cases {
            let mut camera = stock_camera();
            camera.translate(direction, 2.0);
            let actual = Vector3::new(camera.position.x, camera.position.y, camera.position.z);
            assert!(approx(actual, expected), "{direction:?}: {actual:?}");
        }
    }

    #[test]
    fn controller_moves_by_speed_times_dt() {
        let mut camera = stock_camera();
        let mut projection = Projection::new(800, 600, Deg(45.0), 0.1, 100.0);
        let mut controller = CameraController::new(2.5, 0.1);

        assert!(controller.process_keyboard(KeyCode::KeyW, ElementState::Pressed));
        controller.update(&mut camera, &mut projection, Duration::from_millis(400));
        assert!((camera.position.z - 4.0).abs() < EPS);

        assert!(controller.process_keyboard(KeyCode::KeyW, ElementState::Released));
        controller.update(&mut camera, &mut projection, Duration::from_millis(400));
        assert!((camera.position.z - 4.0).abs() < EPS);
    }

    #[test]
    fn opposite_keys_cancel() {
        let mut camera = stock_camera();
        let mut projection = Projection::new(800, 600, Deg(45.0), 0.1, 100.0);
        let mut controller = CameraController::new(2.5, 0.1);
        controller.process_keyboard(KeyCode::KeyQ, ElementState::Pressed);
        controller.process_keyboard(KeyCode::KeyE, ElementState::Pressed);
        controller.update(&mut camera, &mut projection, Duration::from_secs(1));
        assert!(approx(
            Vector3::new(camera.position.x, camera.position.y, camera.position.z),
            Vector3::new(0.0, 0.0, 5.0)
        ));
    }

    #[test]
    fn unrelated_keys_are_not_consumed() {
        let mut controller = CameraController::new(2.5, 0.1);
        assert!(!controller.process_keyboard(KeyCode::KeyL, ElementState::Pressed));
        assert!(!controller.process_keyboard(KeyCode::Escape, ElementState::Pressed));
    }

    #[test]
    fn release_all_stops_motion() {
        let mut camera = stock_camera();
        let mut projection = Projection::new(800, 600, Deg(45.0), 0.1, 100.0);
        let mut controller = CameraController::new(2.5, 0.1);
        controller.process_keyboard(KeyCode::KeyD, ElementState::Pressed);
        controller.release_all();
        controller.update(&mut camera, &mut projection, Duration::from_secs(1));
        assert_eq!(camera.position, Point3::new(0.0, 0.0, 5.0));
    }

    #[test]
    fn mouse_motion_turns_the_camera_once() {
        let mut camera = stock_camera();
        let mut projection = Projection::new(800, 600, Deg(45.0), 0.1, 100.0);
        let mut controller = CameraController::new(2.5, 0.1);
        controller.handle_mouse(100.0, 0.0);
        controller.handle_mouse(50.0, 0.0);
        controller.update(&mut camera, &mut projection, Duration::from_millis(16));
        assert!((Deg::from(camera.yaw()).0 - (-75.0)).abs() < 1e-3);

        controller.update(&mut camera, &mut projection, Duration::from_millis(16));
        assert!((Deg::from(camera.yaw()).0 - (-75.0)).abs() < 1e-3);
        assert_orthonormal(&camera);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut projection = Projection::new(800, 600, Deg(45.0), 0.1, 100.0);
        projection.zoom(10.0);
        assert!((projection.fovy().0 - 35.0).abs() < 1e-3);
        projection.zoom(-100.0);
        assert!((projection.fovy().0 - 45.0).abs() < 1e-3);
        projection.zoom(100.0);
        assert!((projection.fovy().0 - MIN_FOVY.0).abs() < 1e-3);
    }

    #[test]
    fn resize_ignores_zero_sizes() {
        let mut projection = Projection::new(800, 600, Deg(45.0), 0.1, 100.0);
        projection.resize(0, 300);
        assert!((projection.aspect() - 800.0 / 600.0).abs() < EPS);
        projection.resize(1000, 500);
        assert!((projection.aspect() - 2.0).abs() < EPS);
    }

    #[test]
    fn view_proj_maps_target_into_clip_volume() {
        let camera = stock_camera();
        let projection = Projection::new(800, 600, Deg(45.0), 0.1, 100.0);
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(&camera, &projection);

        let clip = uniform.view_proj() * cgmath::Vector4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < EPS && ndc.y.abs() < EPS);
        assert!(ndc.z > 0.0 && ndc.z < 1.0, "depth {} outside wgpu range", ndc.z);
    }

    #[test]
    fn uniform_is_a_plain_matrix() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 64);
    }
}
