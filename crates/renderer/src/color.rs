//! Display-space vs linear color handling.
//!
//! Colors throughout the app are authored in display space (what ends up in
//! the 8-bit framebuffer). When the target format is sRGB the GPU encodes on
//! store, so display-space values are decoded to linear before output.

/// How shader output maps to stored framebuffer bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputEncoding {
    /// Target is sRGB: write linear, the GPU encodes.
    Srgb,
    /// Target stores values as written.
    Raw,
}

impl OutputEncoding {
    pub fn for_format(format: wgpu::TextureFormat) -> Self {
        if format.is_srgb() {
            OutputEncoding::Srgb
        } else {
            OutputEncoding::Raw
        }
    }

    /// Convert a display-space color to what the shader should output.
    pub fn encode(self, rgb: [f32; 3]) -> [f32; 3] {
        match self {
            OutputEncoding::Srgb => rgb.map(srgb_to_linear),
            OutputEncoding::Raw => rgb,
        }
    }

    /// Flag consumed by the moon shaders (1.0 = decode to linear before output).
    pub fn shader_flag(self) -> f32 {
        match self {
            OutputEncoding::Srgb => 1.0,
            OutputEncoding::Raw => 0.0,
        }
    }

    /// Clear color for a display-space gray level.
    pub fn clear_color(self, gray: f32) -> wgpu::Color {
        let [r, g, b] = self.encode([gray; 3]);
        wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: 1.0,
        }
    }
}

/// Matching format with the same sRGB-ness as `surface`, in RGBA8 layout for readback.
pub fn scene_format_for(surface: wgpu::TextureFormat) -> wgpu::TextureFormat {
    if surface.is_srgb() {
        wgpu::TextureFormat::Rgba8UnormSrgb
    } else {
        wgpu::TextureFormat::Rgba8Unorm
    }
}

/// sRGB transfer function, decode direction.
pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn srgb_decode_endpoints() {
        assert_eq!(srgb_to_linear(0.0), 0.0);
        assert!((srgb_to_linear(1.0) - 1.0).abs() < 1e-6);
        assert!((srgb_to_linear(0.5) - 0.214).abs() < 1e-3);
    }

    #[test]
    fn encoding_follows_format() {
        let srgb = OutputEncoding::for_format(wgpu::TextureFormat::Bgra8UnormSrgb);
        let raw = OutputEncoding::for_format(wgpu::TextureFormat::Bgra8Unorm);
        assert_eq!(srgb, OutputEncoding::Srgb);
        assert_eq!(raw, OutputEncoding::Raw);
        assert_eq!(raw.encode([0.5, 0.25, 1.0]), [0.5, 0.25, 1.0]);
        assert!(srgb.encode([0.5; 3])[0] < 0.5);
        assert_eq!(scene_format_for(wgpu::TextureFormat::Bgra8UnormSrgb), wgpu::TextureFormat::Rgba8UnormSrgb);
        assert_eq!(scene_format_for(wgpu::TextureFormat::Bgra8Unorm), wgpu::TextureFormat::Rgba8Unorm);
    }
}
