//! Render pipeline creation.

use crate::texture::Texture;
use crate::vertex::{OverlayVertex, Vertex};

const OVERLAY_SHADER: &str = include_str!("shaders/overlay.wgsl");

/// Which moon shader a pipeline runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoonShading {
    /// Per-pixel Phong with a flat gray material.
    Lit,
    /// Noise-displaced vertices, noise color ramp and Blinn-Phong.
    Relief,
}

impl MoonShading {
    fn source(self) -> &'static str {
        match self {
            MoonShading::Lit => include_str!("shaders/moon_lit.wgsl"),
            MoonShading::Relief => include_str!("shaders/moon_relief.wgsl"),
        }
    }

    fn label(self) -> &'static str {
        match self {
            MoonShading::Lit => "Moon Lit",
            MoonShading::Relief => "Moon Relief",
        }
    }
}

/// Create the camera bind group layout (group 0).
pub fn create_camera_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Camera Bind Group Layout"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

/// Create the moon material/transform layout (group 1).
pub fn create_moon_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Moon Bind Group Layout"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

/// Create a moon pipeline drawing into `format` with a depth buffer.
pub fn create_moon_pipeline(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    shading: MoonShading,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
    moon_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(shading.label()),
        source: wgpu::ShaderSource::Wgsl(shading.source().into()),
    });

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Moon Pipeline Layout"),
        bind_group_layouts: &[camera_bind_group_layout, moon_bind_group_layout],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(shading.label()),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[Vertex::layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: Some(wgpu::Face::Back),
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: Texture::DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

/// Create the screen-space quad pipeline (no depth, alpha blended).
pub fn create_overlay_pipeline(device: &wgpu::Device, format: wgpu::TextureFormat) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Overlay Shader"),
        source: wgpu::ShaderSource::Wgsl(OVERLAY_SHADER.into()),
    });

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Overlay Pipeline Layout"),
        bind_group_layouts: &[],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Overlay Pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[OverlayVertex::layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

/// Both moon pipelines for one color format.
pub struct PipelineSet {
    pub format: wgpu::TextureFormat,
    pub lit: wgpu::RenderPipeline,
    pub relief: wgpu::RenderPipeline,
}

impl PipelineSet {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        camera_bind_group_layout: &wgpu::BindGroupLayout,
        moon_bind_group_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        Self {
            format,
            lit: create_moon_pipeline(device, format, MoonShading::Lit, camera_bind_group_layout, moon_bind_group_layout),
            relief: create_moon_pipeline(
                device,
                format,
                MoonShading::Relief,
                camera_bind_group_layout,
                moon_bind_group_layout,
            ),
        }
    }

    pub fn moon(&self, shading: MoonShading) -> &wgpu::RenderPipeline {
        match shading {
            MoonShading::Lit => &self.lit,
            MoonShading::Relief => &self.relief,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraUniform;
    use crate::renderer::MoonUniform;

    fn parse_and_validate(label: &str, source: &str) -> naga::Module {
        let module = naga::front::wgsl::parse_str(source)
            .unwrap_or_else(|e| panic!("{label}: {}", e.emit_to_string(source)));
        let mut validator =
            naga::valid::Validator::new(naga::valid::ValidationFlags::all(), naga::valid::Capabilities::default());
        if let Err(e) = validator.validate(&module) {
            panic!("{label}: {e:?}");
        }
        module
    }

    fn struct_span(module: &naga::Module, name: &str) -> usize {
        module
            .types
            .iter()
            .find_map(|(_, ty)| match ty.inner {
                naga::TypeInner::Struct { span, .. } if ty.name.as_deref() == Some(name) => Some(span as usize),
                _ => None,
            })
            .unwrap_or_else(|| panic!("no struct {name}"))
    }

    fn entry_points(module: &naga::Module) -> Vec<(&str, naga::ShaderStage)> {
        module.entry_points.iter().map(|ep| (ep.name.as_str(), ep.stage)).collect()
    }

    #[test]
    fn shaders_parse_and_validate() {
        for shading in [MoonShading::Lit, MoonShading::Relief] {
            let module = parse_and_validate(shading.label(), shading.source());
            let entries = entry_points(&module);
            assert!(entries.contains(&("vs_main", naga::ShaderStage::Vertex)), "{}", shading.label());
            assert!(entries.contains(&("fs_main", naga::ShaderStage::Fragment)), "{}", shading.label());
        }
        let overlay = parse_and_validate("overlay", OVERLAY_SHADER);
        assert_eq!(overlay.entry_points.len(), 2);
    }

    #[test]
    fn uniform_structs_match_wgsl_layout() {
        for shading in [MoonShading::Lit, MoonShading::Relief] {
            let module = parse_and_validate(shading.label(), shading.source());
            assert_eq!(struct_span(&module, "Moon"), std::mem::size_of::<MoonUniform>(), "{}", shading.label());
            assert_eq!(struct_span(&module, "Camera"), std::mem::size_of::<CameraUniform>(), "{}", shading.label());
        }
    }

    #[test]
    fn relief_shader_carries_the_noise_functions() {
        let module = parse_and_validate("relief", MoonShading::Relief.source());
        let names: Vec<&str> = module.functions.iter().filter_map(|(_, f)| f.name.as_deref()).collect();
        for name in ["mod289_3", "mod289_4", "permute", "taylor_inv_sqrt", "snoise"] {
            assert!(names.contains(&name), "missing {name}");
        }
    }

    #[test]
    fn relief_specular_uses_a_fixed_view_vector() {
        let module = parse_and_validate("relief", MoonShading::Relief.source());
        let members: Vec<&str> = module
            .types
            .iter()
            .find_map(|(_, ty)| match &ty.inner {
                naga::TypeInner::Struct { members, .. } if ty.name.as_deref() == Some("VertexOutput") => {
                    Some(members.iter().filter_map(|m| m.name.as_deref()).collect())
                }
                _ => None,
            })
            .unwrap_or_default();
        assert_eq!(members, ["clip_position", "eye_normal", "noise"]);
    }
}
