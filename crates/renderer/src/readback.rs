//! Offscreen scene target and its CPU readback.

use std::sync::mpsc;

use thiserror::Error;

use crate::mosaic::{mosaic, ChannelOrder, PixelView, PixelViewError};
use crate::texture::Texture;

#[derive(Debug, Error)]
pub enum ReadbackError {
    #[error("failed to map readback buffer: {0}")]
    Map(#[from] wgpu::BufferAsyncError),
    #[error("readback map callback was dropped")]
    Cancelled,
    #[error("texture format {0:?} cannot be read back")]
    UnsupportedFormat(wgpu::TextureFormat),
    #[error(transparent)]
    Layout(#[from] PixelViewError),
}

/// Row pitch of a copy of `width` RGBA8 pixels, padded for `copy_texture_to_buffer`.
pub fn padded_bytes_per_row(width: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    (width * 4).div_ceil(align) * align
}

/// `MAP_READ` staging buffer sized for one color target.
pub struct SceneReadback {
    buffer: wgpu::Buffer,
    width: u32,
    height: u32,
    bytes_per_row: u32,
    order: ChannelOrder,
}

impl SceneReadback {
    pub fn new(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    ) -> Result<Self, ReadbackError> {
        let order = ChannelOrder::for_format(format).ok_or(ReadbackError::UnsupportedFormat(format))?;
        let width = width.max(1);
        let height = height.max(1);
        let bytes_per_row = padded_bytes_per_row(width);
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Scene Readback"),
            size: bytes_per_row as u64 * height as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        Ok(Self {
            buffer,
            width,
            height,
            bytes_per_row,
            order,
        })
    }

    /// Record a copy of `color` into the staging buffer.
    pub fn copy(&self, encoder: &mut wgpu::CommandEncoder, color: &Texture) {
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &color.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &self.buffer,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(self.bytes_per_row),
                    rows_per_image: Some(self.height),
                },
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
    }

    /// Map the buffer, blocking until the GPU is done, and hand the pixels to `f`.
    /// The copy must already be submitted.
    pub fn read<R>(
        &self,
        device: &wgpu::Device,
        f: impl FnOnce(&PixelView) -> R,
    ) -> Result<R, ReadbackError> {
        let slice = self.buffer.slice(..);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = device.poll(wgpu::Maintain::Wait);
        rx.recv().map_err(|_| ReadbackError::Cancelled)??;

        let result = {
            let mapped = slice.get_mapped_range();
            PixelView::new(&mapped[..], self.width, self.height, self.bytes_per_row, self.order).map(|view| f(&view))
        };
        self.buffer.unmap();
        Ok(result?)
    }
}

/// Camera-capable offscreen target: color + depth, copyable to the CPU.
pub struct SceneTarget {
    pub color: Texture,
    pub depth: Texture,
    pub readback: SceneReadback,
}

impl SceneTarget {
    pub fn new(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    ) -> Result<Self, ReadbackError> {
        Ok(Self {
            color: Texture::create_color_target(device, width, height, format, "Scene Color"),
            depth: Texture::create_depth_texture(device, width, height, "Scene Depth"),
            readback: SceneReadback::new(device, width, height, format)?,
        })
    }

    /// Record the color copy; call `read` after the encoder is submitted.
    pub fn copy_to_readback(&self, encoder: &mut wgpu::CommandEncoder) {
        self.readback.copy(encoder, &self.color);
    }

    pub fn read<R>(&self, device: &wgpu::Device, f: impl FnOnce(&PixelView) -> R) -> Result<R, ReadbackError> {
        self.readback.read(device, f)
    }
}

/// Copy a pixel view into an owned RGBA image (alpha forced opaque).
pub fn to_image(view: &PixelView) -> image::RgbaImage {
    image::RgbaImage::from_fn(view.width(), view.height(), |x, y| {
        let [r, g, b] = view.rgb(x, y);
        image::Rgba([r, g, b, 255])
    })
}

/// Mosaic the view and paint each cell's average into an owned image.
pub fn mosaic_image(view: &PixelView, cell_size: u32) -> image::RgbaImage {
    let mut img = image::RgbaImage::new(view.width(), view.height());
    for cell in mosaic(view, cell_size) {
        let [r, g, b] = cell.rgb;
        for y in cell.rect.y..cell.rect.y + cell.rect.h {
            for x in cell.rect.x..cell.rect.x + cell.rect.w {
                img.put_pixel(x, y, image::Rgba([r, g, b, 255]));
            }
        }
    }
    img
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_pad_to_copy_alignment() {
        assert_eq!(padded_bytes_per_row(1), 256);
        assert_eq!(padded_bytes_per_row(64), 256);
        assert_eq!(padded_bytes_per_row(65), 512);
        assert_eq!(padded_bytes_per_row(800), 3328);
        assert_eq!(padded_bytes_per_row(1024), 4096);
    }

    #[test]
    fn image_conversion_unswizzles_bgra() {
        let data = [10, 20, 30, 0, 40, 50, 60, 0];
        let view = PixelView::new(&data, 2, 1, 8, ChannelOrder::Bgra).unwrap();
        let img = to_image(&view);
        assert_eq!(img.dimensions(), (2, 1));
        assert_eq!(img.get_pixel(0, 0).0, [30, 20, 10, 255]);
        assert_eq!(img.get_pixel(1, 0).0, [60, 50, 40, 255]);
    }

    #[test]
    fn mosaic_image_fills_cells_with_their_average() {
        // 3x2 RGBA: left 2x2 cell is black/white, the truncated right column is red.
        let data = [
            0, 0, 0, 255, 255, 255, 255, 255, 200, 0, 0, 255, //
            255, 255, 255, 255, 0, 0, 0, 255, 100, 0, 0, 255,
        ];
        let view = PixelView::new(&data, 3, 2, 12, ChannelOrder::Rgba).unwrap();
        let img = mosaic_image(&view, 2);
        assert_eq!(img.dimensions(), (3, 2));
        for (x, y) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
            assert_eq!(img.get_pixel(x, y).0, [128, 128, 128, 255]);
        }
        assert_eq!(img.get_pixel(2, 0).0, [150, 0, 0, 255]);
        assert_eq!(img.get_pixel(2, 1).0, [150, 0, 0, 255]);
    }
}
