//! Vertex types and the screen-space quad batch.

use bytemuck::{Pod, Zeroable};

use crate::color::OutputEncoding;

/// Mesh vertex with position, normal and UV coordinates.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl Vertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], tex_coords: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tex_coords,
        }
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // Position
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // Normal
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // UV/Tex coords
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// Vertex for flat-colored screen-space quads (HUD and mosaic cells).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct OverlayVertex {
    /// NDC position (x, y) in -1..1
    pub position: [f32; 2],
    /// RGBA color, already encoded for the target
    pub color: [f32; 4],
}

impl OverlayVertex {
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<OverlayVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Glyph cell of the readout font, in font pixels.
const GLYPH_W: u32 = 3;
const GLYPH_H: u32 = 5;

/// Builds flat-colored quads in pixel coordinates for the overlay pass.
///
/// This is the plain 2D surface: it has no camera and no depth, only
/// rectangles. Colors are given in display space.
pub struct OverlayBatch {
    pub vertices: Vec<OverlayVertex>,
    pub indices: Vec<u32>,
    screen_w: f32,
    screen_h: f32,
    encoding: OutputEncoding,
}

impl OverlayBatch {
    pub fn new(screen_w: f32, screen_h: f32, encoding: OutputEncoding) -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            screen_w: screen_w.max(1.0),
            screen_h: screen_h.max(1.0),
            encoding,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Convert pixel coords to NDC.
    fn px_to_ndc(&self, px: f32, py: f32) -> [f32; 2] {
        [
            (px / self.screen_w) * 2.0 - 1.0,
            1.0 - (py / self.screen_h) * 2.0,
        ]
    }

    /// Add a solid-color rectangle. Coordinates in pixels, color in display space.
    pub fn add_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: [f32; 4]) {
        let tl = self.px_to_ndc(x, y);
        let br = self.px_to_ndc(x + w, y + h);
        let [r, g, b] = self.encoding.encode([color[0], color[1], color[2]]);
        let color = [r, g, b, color[3]];
        let base = self.vertices.len() as u32;
        self.vertices.push(OverlayVertex { position: [tl[0], tl[1]], color });
        self.vertices.push(OverlayVertex { position: [br[0], tl[1]], color });
        self.vertices.push(OverlayVertex { position: [br[0], br[1]], color });
        self.vertices.push(OverlayVertex { position: [tl[0], br[1]], color });
        self.indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    /// Draw a numeric string (`0-9 . %`) with `scale` pixels per font pixel.
    /// Other characters advance without drawing. Returns the drawn width.
    pub fn add_number(&mut self, x: f32, y: f32, text: &str, scale: f32, color: [f32; 4]) -> f32 {
        let advance = (GLYPH_W + 1) as f32 * scale;
        let mut cx = x;
        for ch in text.chars() {
            if let Some(rows) = glyph(ch) {
                for (gy, bits) in rows.iter().enumerate() {
                    for gx in 0..GLYPH_W {
                        if (bits >> (GLYPH_W - 1 - gx)) & 1 != 0 {
                            self.add_rect(cx + gx as f32 * scale, y + gy as f32 * scale, scale, scale, color);
                        }
                    }
                }
            }
            cx += advance;
        }
        cx - x
    }

    /// Height of a line drawn by `add_number` at `scale`.
    pub fn line_height(scale: f32) -> f32 {
        GLYPH_H as f32 * scale
    }
}

/// 3x5 bitmaps, one byte per row, low three bits used (bit 2 = leftmost).
fn glyph(ch: char) -> Option<[u8; GLYPH_H as usize]> {
    let rows = match ch {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        '%' => [0b101, 0b001, 0b010, 0b100, 0b101],
        _ => return None,
    };
    Some(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_corners_map_to_ndc() {
        let mut batch = OverlayBatch::new(200.0, 100.0, OutputEncoding::Raw);
        batch.add_rect(0.0, 0.0, 200.0, 100.0, [0.2, 0.4, 0.6, 1.0]);
        assert_eq!(batch.vertices[0].position, [-1.0, 1.0]);
        assert_eq!(batch.vertices[2].position, [1.0, -1.0]);
        assert_eq!(batch.vertices[0].color, [0.2, 0.4, 0.6, 1.0]);
        assert_eq!(batch.indices, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn srgb_batch_decodes_colors_but_not_alpha() {
        let mut batch = OverlayBatch::new(10.0, 10.0, OutputEncoding::Srgb);
        batch.add_rect(0.0, 0.0, 1.0, 1.0, [0.5, 0.5, 0.5, 0.5]);
        let c = batch.vertices[0].color;
        assert!(c[0] < 0.25);
        assert_eq!(c[3], 0.5);
    }

    #[test]
    fn number_draws_one_quad_per_lit_font_pixel() {
        let mut batch = OverlayBatch::new(100.0, 100.0, OutputEncoding::Raw);
        let width = batch.add_number(0.0, 0.0, "1.", 2.0, [1.0; 4]);
        // '1' has 8 lit pixels, '.' has 1.
        assert_eq!(batch.vertices.len(), 9 * 4);
        assert_eq!(width, 16.0);

        let mut skip = OverlayBatch::new(100.0, 100.0, OutputEncoding::Raw);
        skip.add_number(0.0, 0.0, "x", 1.0, [1.0; 4]);
        assert!(skip.is_empty());
    }
}
