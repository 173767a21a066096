//! Off-screen rendering.
//!
//! Renders the scene into a texture that never reaches a window and reads it
//! back into an [`image::RgbaImage`]. Used by the GPU integration tests.

use std::{iter, time::Duration};

use anyhow::Context as _;

use crate::{
    config::Config,
    context::{build_renderer, request_device},
    data_structures::texture::Texture,
    render::SceneRenderer,
    resources::texture::load_texture_or_fallback,
};

/// Colour format of capture targets. Renderers used with [`render_to_image`]
/// must be built for it.
pub const CAPTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Rows copied out of a texture have to start on 256 byte boundaries.
pub fn padded_bytes_per_row(width: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    (width * 4).div_ceil(align) * align
}

/// A device and queue with no surface attached.
pub async fn headless_device() -> anyhow::Result<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await
        .context("no GPU adapter available for off-screen rendering")?;
    request_device(&adapter).await
}

/// Builds a renderer targeting [`CAPTURE_FORMAT`] with the same camera, light
/// and texture set-up as the windowed viewer.
pub async fn headless_renderer(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    settings: &Config,
    width: u32,
    height: u32,
) -> anyhow::Result<SceneRenderer> {
    let diffuse = load_texture_or_fallback(&settings.texture_path, device, queue).await;
    build_renderer(device, CAPTURE_FORMAT, diffuse, settings, [width, height])
}

pub async fn render_to_image(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    renderer: &SceneRenderer,
    width: u32,
    height: u32,
    clear_colour: wgpu::Color,
) -> anyhow::Result<image::RgbaImage> {
    anyhow::ensure!(width > 0 && height > 0, "cannot capture an empty image");
    let extent = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let target = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Capture Texture"),
        size: extent,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: CAPTURE_FORMAT,
        usage: wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = target.create_view(&wgpu::TextureViewDescriptor::default());
    let depth = Texture::create_depth_texture(device, [width, height], "capture_depth_texture");

    let bytes_per_row = padded_bytes_per_row(width);
    let output_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Capture Output Buffer"),
        size: (bytes_per_row * height) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Capture Encoder"),
    });
    renderer.draw(&mut encoder, &view, &depth.view, clear_colour);
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            aspect: wgpu::TextureAspect::All,
            texture: &target,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &output_buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(height),
            },
        },
        extent,
    );
    queue.submit(iter::once(encoder.finish()));

    let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
    let buffer_slice = output_buffer.slice(..);
    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device
        .poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: Some(Duration::from_secs(3)),
        })
        .map_err(|e| anyhow::anyhow!("waiting for the capture copy failed: {e:?}"))?;
    rx.receive()
        .await
        .context("capture buffer mapping was dropped")?
        .map_err(|e| anyhow::anyhow!("mapping the capture buffer failed: {e:?}"))?;

    let pixels = {
        let data = buffer_slice.get_mapped_range();
        unpad_rows(&data, width, height, bytes_per_row)
    };
    output_buffer.unmap();

    image::RgbaImage::from_raw(width, height, pixels).context("capture buffer has the wrong size")
}

fn unpad_rows(data: &[u8], width: u32, height: u32, bytes_per_row: u32) -> Vec<u8> {
    let row = (width * 4) as usize;
    data.chunks(bytes_per_row as usize)
        .take(height as usize)
        .flat_map(|padded| &padded[..row])
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_padded_to_copy_alignment() {
        assert_eq!(padded_bytes_per_row(64), 256);
        assert_eq!(padded_bytes_per_row(65), 512);
        assert_eq!(padded_bytes_per_row(800), 3328);
    }

    #[test]
    fn unpadding_drops_row_tails() {
        let width = 2;
        let bytes_per_row = padded_bytes_per_row(width);
        let mut data = vec![0u8; (bytes_per_row * 2) as usize];
        data[..8].copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        let second = bytes_per_row as usize;
        data[second..second + 8].copy_from_slice(&[9, 10, 11, 12, 13, 14, 15, 16]);

        let pixels = unpad_rows(&data, width, 2, bytes_per_row);
        assert_eq!(pixels, (1..=16).collect::<Vec<u8>>());
    }
}
