//! The scene renderer.
//!
//! [`SceneRenderer`] owns every GPU resource needed to draw the scene: the
//! pipeline, the static vertex/index buffers, the diffuse texture and the
//! camera, model and light uniforms. It does not know about windows or
//! surfaces; [`SceneRenderer::draw`] records one render pass into whatever
//! colour and depth views it is handed, which is how both the window
//! (`crate::context`) and off-screen captures (`crate::capture`) use it.

use std::time::Duration;

use cgmath::{Deg, Matrix4, SquareMatrix};
use wgpu::util::DeviceExt;

use crate::{
    camera::CameraResources,
    data_structures::{
        scene::{SceneGeometry, model_matrix},
        texture::Texture,
    },
    pipelines::{
        light::LightResources,
        scene::{groups, mk_scene_pipeline, mk_uniform_bind_group, mk_uniform_layout},
    },
    resources::texture::{diffuse_bind_group, diffuse_layout},
};

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelUniform {
    model: [[f32; 4]; 4],
}

impl ModelUniform {
    pub fn new(model: Matrix4<f32>) -> Self {
        Self {
            model: model.into(),
        }
    }
}

impl Default for ModelUniform {
    fn default() -> Self {
        Self::new(Matrix4::identity())
    }
}

#[derive(Debug)]
pub struct SceneRenderer {
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    num_indices: u32,
    #[allow(unused)]
    diffuse: Texture,
    diffuse_bind_group: wgpu::BindGroup,
    model_buffer: wgpu::Buffer,
    model_bind_group: wgpu::BindGroup,
    spin: Deg<f32>,
    pub camera: CameraResources,
    pub light: LightResources,
}

impl SceneRenderer {
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        diffuse: Texture,
        camera: CameraResources,
        light: LightResources,
        spin: Deg<f32>,
    ) -> anyhow::Result<Self> {
        let geometry = SceneGeometry::new();
        log::info!(
            "uploading scene: {} vertices, {} indices",
            geometry.vertex_count(),
            geometry.index_count()
        );

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Scene Vertex Buffer"),
            contents: bytemuck::cast_slice(&geometry.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Scene Index Buffer"),
            contents: bytemuck::cast_slice(&geometry.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let diffuse_bind_group_layout = diffuse_layout(device);
        let diffuse_bind_group = diffuse_bind_group(device, &diffuse_bind_group_layout, &diffuse)?;

        let model_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Model Buffer"),
            contents: bytemuck::cast_slice(&[ModelUniform::default()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let model_bind_group_layout =
            mk_uniform_layout(device, wgpu::ShaderStages::VERTEX, "model_bind_group_layout");
        let model_bind_group =
            mk_uniform_bind_group(device, &model_bind_group_layout, &model_buffer, "model_bind_group");

        let pipeline = mk_scene_pipeline(
            device,
            color_format,
            &diffuse_bind_group_layout,
            &camera.bind_group_layout,
            &model_bind_group_layout,
            &light.bind_group_layout,
        );

        Ok(Self {
            pipeline,
            vertex_buffer,
            index_buffer,
            num_indices: geometry.index_count(),
            diffuse,
            diffuse_bind_group,
            model_buffer,
            model_bind_group,
            spin,
            camera,
            light,
        })
    }

    pub fn num_indices(&self) -> u32 {
        self.num_indices
    }

    /// Applies camera input for this frame and uploads the camera and model
    /// uniforms. `elapsed` is the time since start-up and drives the spin.
    pub fn update(&mut self, queue: &wgpu::Queue, dt: Duration, elapsed: Duration) {
        self.camera.update(queue, dt);
        self.write_model(queue, elapsed);
    }

    pub fn write_model(&self, queue: &wgpu::Queue, elapsed: Duration) {
        let uniform = ModelUniform::new(model_matrix(elapsed, self.spin));
        queue.write_buffer(&self.model_buffer, 0, bytemuck::cast_slice(&[uniform]));
    }

    /// Records the frame: clear colour and depth, then one indexed draw.
    pub fn draw(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        color_view: &wgpu::TextureView,
        depth_view: &wgpu::TextureView,
        clear_colour: wgpu::Color,
    ) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear_colour),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(groups::DIFFUSE, &self.diffuse_bind_group, &[]);
        render_pass.set_bind_group(groups::CAMERA, &self.camera.bind_group, &[]);
        render_pass.set_bind_group(groups::MODEL, &self.model_bind_group, &[]);
        render_pass.set_bind_group(groups::LIGHT, &self.light.bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..self.num_indices, 0, 0..1);
    }
}
