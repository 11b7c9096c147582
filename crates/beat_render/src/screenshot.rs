//! Screenshot readback and encoding.

use std::path::Path;

use crate::error::RendererError;

/// Copies an RGBA8 texture into CPU memory, dropping the per-row padding
/// wgpu requires for buffer copies.
pub fn read_texture_rgba(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    width: u32,
    height: u32,
) -> Result<Vec<u8>, RendererError> {
    let unpadded_bytes_per_row = width * 4;
    let padded_bytes_per_row = padded_row_bytes(width);
    let buffer_size = u64::from(padded_bytes_per_row) * u64::from(height);

    let staging_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Screenshot Staging Buffer"),
        size: buffer_size,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Screenshot Copy Encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &staging_buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded_bytes_per_row),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(std::iter::once(encoder.finish()));

    let slice = staging_buffer.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device.poll(wgpu::Maintain::Wait);

    rx.recv()
        .map_err(|e| RendererError::Generic(format!("screenshot readback dropped: {e}")))?
        .map_err(|e| RendererError::Generic(format!("screenshot buffer map failed: {e}")))?;

    let mapped = slice.get_mapped_range();
    let pixels = strip_row_padding(&mapped, unpadded_bytes_per_row, padded_bytes_per_row, height);
    drop(mapped);
    staging_buffer.unmap();
    Ok(pixels)
}

/// Writes RGBA8 pixels; the format follows the path's extension.
pub fn save_rgba(path: &Path, pixels: Vec<u8>, width: u32, height: u32) -> Result<(), RendererError> {
    let image = image::RgbaImage::from_raw(width, height, pixels).ok_or_else(|| {
        RendererError::Generic(format!("screenshot buffer does not match {width}x{height}"))
    })?;
    image
        .save(path)
        .map_err(|e| RendererError::Generic(format!("failed to save {}: {e}", path.display())))
}

fn padded_row_bytes(width: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    (width * 4).div_ceil(align) * align
}

fn strip_row_padding(data: &[u8], row_bytes: u32, padded_row_bytes: u32, height: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((row_bytes * height) as usize);
    for row in data.chunks(padded_row_bytes as usize).take(height as usize) {
        pixels.extend_from_slice(&row[..row_bytes as usize]);
    }
    pixels
}
