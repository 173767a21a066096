use wgpu::util::DeviceExt;

use crate::pipelines::scene::{mk_uniform_bind_group, mk_uniform_layout};

/// Whether the diffuse texture modulates the vertex colour.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LightSwitch {
    on: bool,
}

impl LightSwitch {
    pub fn new(on: bool) -> Self {
        Self { on }
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Flips the switch and returns the new state.
    pub fn toggle(&mut self) -> bool {
        self.on = !self.on;
        self.on
    }
}

impl Default for LightSwitch {
    fn default() -> Self {
        Self::new(true)
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    on: u32,
    // Uniform buffers are laid out in 16 byte blocks
    _padding: [u32; 3],
}

impl From<LightSwitch> for LightUniform {
    fn from(switch: LightSwitch) -> Self {
        Self {
            on: switch.on as u32,
            _padding: [0; 3],
        }
    }
}

#[derive(Debug)]
pub struct LightResources {
    pub switch: LightSwitch,
    pub uniform: LightUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl LightResources {
    pub fn new(device: &wgpu::Device, switch: LightSwitch) -> Self {
        let uniform = LightUniform::from(switch);
        let buffer = mk_buffer(device, uniform);
        let bind_group_layout =
            mk_uniform_layout(device, wgpu::ShaderStages::FRAGMENT, "light_bind_group_layout");
        let bind_group = mk_uniform_bind_group(device, &bind_group_layout, &buffer, "light_bind_group");
        Self {
            switch,
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    pub fn toggle(&mut self, queue: &wgpu::Queue) -> bool {
        let on = self.switch.toggle();
        self.write(queue);
        log::debug!("light switched {}", if on { "on" } else { "off" });
        on
    }

    pub fn set(&mut self, queue: &wgpu::Queue, on: bool) {
        self.switch = LightSwitch::new(on);
        self.write(queue);
    }

    fn write(&mut self, queue: &wgpu::Queue) {
        self.uniform = self.switch.into();
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

pub fn mk_buffer(device: &wgpu::Device, light_uniform: LightUniform) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Light Buffer"),
        contents: bytemuck::cast_slice(&[light_uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}
